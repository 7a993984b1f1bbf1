use crate::domain::quote::QuoteSnapshot;
use anyhow::ensure;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const NOT_AVAILABLE: &str = "N/A";
pub const ROW_COUNT: usize = 7;

// Used when the provider does not report a currency for the listing.
const FALLBACK_CURRENCY_SYMBOL: &str = "₹";

/// Figures derived from one snapshot. Fundamentals stay optional and unscaled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub currency: Option<String>,
    pub current_price: f64,
    pub high_52w: f64,
    pub low_52w: f64,
    pub trailing_pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,
    /// Percent, already rounded to 2 decimals.
    pub one_year_return: f64,
}

impl MetricsRow {
    /// `Ok(None)` when the snapshot has no bars.
    pub fn derive(snapshot: &QuoteSnapshot) -> anyhow::Result<Option<Self>> {
        let bars = &snapshot.history.bars;
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Ok(None);
        };

        ensure!(
            first.close.is_finite() && first.close != 0.0,
            "first close for {} is {}; cannot compute 1-year return",
            snapshot.symbol,
            first.close
        );

        let high_52w = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let low_52w = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let one_year_return = round2((last.close - first.close) / first.close * 100.0);

        Ok(Some(Self {
            currency: snapshot.history.currency.clone(),
            current_price: last.close,
            high_52w,
            low_52w,
            trailing_pe: snapshot.fundamentals.trailing_pe,
            market_cap: snapshot.fundamentals.market_cap,
            dividend_yield: snapshot.fundamentals.dividend_yield,
            one_year_return,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    NotAvailable,
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(v) => f.write_str(&format_decimal(*v)),
            MetricValue::Text(s) => f.write_str(s),
            MetricValue::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub label: String,
    pub value: MetricValue,
}

/// The label→value table shown to the user. Always seven rows, always this order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsTable {
    pub rows: [TableRow; ROW_COUNT],
}

impl MetricsTable {
    pub fn from_metrics(m: &MetricsRow) -> Self {
        let c = currency_symbol(m.currency.as_deref());
        let row = |label: String, value: MetricValue| TableRow { label, value };

        Self {
            rows: [
                row(
                    format!("Current Price ({c})"),
                    MetricValue::Number(round2(m.current_price)),
                ),
                row(
                    format!("Market Cap ({c})"),
                    m.market_cap
                        .map_or(MetricValue::NotAvailable, |v| {
                            MetricValue::Text(group_thousands(v))
                        }),
                ),
                row(
                    "P/E Ratio".to_string(),
                    m.trailing_pe
                        .map_or(MetricValue::NotAvailable, |v| MetricValue::Number(round2(v))),
                ),
                row(
                    format!("52-Week High ({c})"),
                    MetricValue::Number(round2(m.high_52w)),
                ),
                row(
                    format!("52-Week Low ({c})"),
                    MetricValue::Number(round2(m.low_52w)),
                ),
                row(
                    "Dividend Yield (%)".to_string(),
                    m.dividend_yield.map_or(MetricValue::NotAvailable, |v| {
                        MetricValue::Number(round2(v * 100.0))
                    }),
                ),
                row(
                    "1-Year Return (%)".to_string(),
                    MetricValue::Number(m.one_year_return),
                ),
            ],
        }
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&MetricValue> {
        self.rows.iter().find(|r| r.label == label).map(|r| &r.value)
    }

    #[cfg(test)]
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.label.as_str())
    }
}

/// Two decimals, exact halves to even (`12.625` → `12.62`).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Shortest decimal form, keeping one fractional digit for whole numbers (`10.0`, `2.5`).
pub fn format_decimal(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Integer with comma-grouped thousands, e.g. `2,800,000,000,000`.
pub fn group_thousands(v: f64) -> String {
    let n = v.round() as i128;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn currency_symbol(code: Option<&str>) -> String {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return FALLBACK_CURRENCY_SYMBOL.to_string();
    };
    match code.to_ascii_uppercase().as_str() {
        "INR" => "₹".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        other => other.to_string(),
    }
}
