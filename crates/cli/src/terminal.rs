use stockinfo_core::dashboard::DisplaySink;
use stockinfo_core::domain::metrics::MetricsTable;
use stockinfo_core::domain::quote::CloseSeries;

/// Buffers dashboard output for a terminal; warnings and errors are kept apart for stderr.
#[derive(Debug)]
pub struct TerminalSink {
    pub out: Vec<String>,
    pub err: Vec<String>,
    chart_width: usize,
    chart_height: usize,
}

impl TerminalSink {
    pub fn new(chart_width: usize, chart_height: usize) -> Self {
        Self {
            out: Vec::new(),
            err: Vec::new(),
            chart_width,
            chart_height,
        }
    }
}

impl DisplaySink for TerminalSink {
    fn subheader(&mut self, text: &str) {
        self.out.push(text.to_string());
        self.out.push(String::new());
    }

    fn warning(&mut self, text: &str) {
        self.err.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.err.push(text.to_string());
    }

    fn table(&mut self, table: &MetricsTable) {
        self.out.extend(table_lines(table));
        self.out.push(String::new());
    }

    fn line_chart(&mut self, series: &CloseSeries) {
        self.out
            .extend(text_chart(series, self.chart_width, self.chart_height));
    }
}

pub fn table_lines(table: &MetricsTable) -> Vec<String> {
    let values: Vec<String> = table.rows.iter().map(|r| r.value.to_string()).collect();
    let label_w = table
        .rows
        .iter()
        .map(|r| r.label.chars().count())
        .chain(std::iter::once("Metric".len()))
        .max()
        .unwrap_or(0);
    let value_w = values
        .iter()
        .map(|v| v.chars().count())
        .chain(std::iter::once("Value".len()))
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(format!("   {:<label_w$}  {:>value_w$}", "Metric", "Value"));
    for (i, (row, value)) in table.rows.iter().zip(&values).enumerate() {
        lines.push(format!("{i:<2} {:<label_w$}  {:>value_w$}", row.label, value));
    }
    lines
}

/// `height` plot rows (newest close on the right) followed by a date axis line.
pub fn text_chart(series: &CloseSeries, width: usize, height: usize) -> Vec<String> {
    let (Some((lo, hi)), Some(first), Some(last)) =
        (series.bounds(), series.first_date(), series.last_date())
    else {
        return vec![];
    };
    let height = height.max(2);
    let n = series.points.len();
    let cols = width.max(1).min(n);

    let row_of = |v: f64| -> usize {
        if hi == lo {
            height / 2
        } else {
            ((hi - v) / (hi - lo) * (height - 1) as f64).round() as usize
        }
    };

    let mut grid = vec![vec![' '; cols]; height];
    let mut prev: Option<usize> = None;
    for c in 0..cols {
        let idx = if cols == 1 { n - 1 } else { c * (n - 1) / (cols - 1) };
        let r = row_of(series.points[idx].close);
        if let Some(p) = prev {
            for between in p.min(r) + 1..p.max(r) {
                grid[between][c] = '|';
            }
        }
        grid[r][c] = '*';
        prev = Some(r);
    }

    let top = format!("{hi:.2}");
    let bottom = format!("{lo:.2}");
    let label_w = top.len().max(bottom.len());

    let mut lines: Vec<String> = grid
        .into_iter()
        .enumerate()
        .map(|(r, row)| {
            let label = match r {
                0 => top.as_str(),
                r if r == height - 1 => bottom.as_str(),
                _ => "",
            };
            let row: String = row.into_iter().collect();
            format!("{label:>label_w$} |{row}")
        })
        .collect();

    let gap = cols.saturating_sub(20).max(1);
    lines.push(format!("{:label_w$}  {first}{:gap$}{last}", "", ""));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockinfo_core::domain::metrics::MetricsRow;
    use stockinfo_core::domain::quote::ClosePoint;

    fn series(closes: &[f64]) -> CloseSeries {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        CloseSeries {
            points: closes
                .iter()
                .enumerate()
                .map(|(i, c)| ClosePoint {
                    date: start + chrono::Duration::days(i as i64),
                    close: *c,
                })
                .collect(),
        }
    }

    #[test]
    fn chart_has_height_rows_plus_axis() {
        let lines = text_chart(&series(&[1.0, 2.0, 3.0]), 60, 5);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "3.00 |  *");
        assert_eq!(lines[1], "     |  |");
        assert_eq!(lines[2], "     | * ");
        assert_eq!(lines[3], "     | | ");
        assert_eq!(lines[4], "1.00 |*  ");
        assert!(lines[5].contains("2025-06-02"));
        assert!(lines[5].ends_with("2025-06-04"));
    }

    #[test]
    fn long_series_is_sampled_down_to_width() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i as f64).sin() * 5.0).collect();
        let lines = text_chart(&series(&closes), 40, 10);
        assert_eq!(lines.len(), 11);
        for line in &lines[..10] {
            let plot = line.split_once('|').unwrap().1;
            assert_eq!(plot.chars().count(), 40);
        }
    }

    #[test]
    fn empty_series_draws_nothing() {
        assert!(text_chart(&CloseSeries::default(), 60, 12).is_empty());
    }

    #[test]
    fn table_is_aligned_with_seven_rows() {
        let metrics = MetricsRow {
            currency: Some("INR".to_string()),
            current_price: 1523.45,
            high_52w: 1990.0,
            low_52w: 1351.65,
            trailing_pe: None,
            market_cap: Some(6_300_000_000_000.0),
            dividend_yield: Some(0.025),
            one_year_return: 10.0,
        };
        let lines = table_lines(&MetricsTable::from_metrics(&metrics));
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("0  Current Price (₹)"));
        assert!(lines[1].ends_with("1523.45"));
        assert!(lines[2].ends_with("6,300,000,000,000"));
        assert!(lines[3].ends_with("N/A"));
        assert!(lines[6].ends_with("2.5"));
        assert!(lines[7].ends_with("10.0"));

        let widths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn warnings_go_to_err() {
        let mut sink = TerminalSink::new(60, 12);
        sink.warning("careful");
        sink.error("broken");
        assert!(sink.out.is_empty());
        assert_eq!(sink.err, vec!["careful".to_string(), "broken".to_string()]);
    }
}
