use serde::Serialize;
use stockinfo_core::domain::metrics::format_decimal;
use stockinfo_core::domain::quote::CloseSeries;

pub const WIDTH: f64 = 700.0;
pub const HEIGHT: f64 = 280.0;
const PAD: f64 = 10.0;

/// Close-price line already projected into SVG user space.
#[derive(Debug, Clone, Serialize)]
pub struct SvgChart {
    pub width: f64,
    pub height: f64,
    pub points: String,
    pub y_min: String,
    pub y_max: String,
    pub x_start: String,
    pub x_end: String,
}

pub fn svg_chart(series: &CloseSeries) -> Option<SvgChart> {
    let (lo, hi) = series.bounds()?;
    let n = series.points.len();
    let span = hi - lo;
    let plot_w = WIDTH - 2.0 * PAD;
    let plot_h = HEIGHT - 2.0 * PAD;

    let points = series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = if n == 1 {
                WIDTH / 2.0
            } else {
                PAD + plot_w * i as f64 / (n - 1) as f64
            };
            let y = if span == 0.0 {
                HEIGHT / 2.0
            } else {
                PAD + plot_h * (hi - p.close) / span
            };
            format!("{x:.1},{y:.1}")
        })
        .collect::<Vec<_>>()
        .join(" ");

    Some(SvgChart {
        width: WIDTH,
        height: HEIGHT,
        points,
        y_min: format_decimal((lo * 100.0).round() / 100.0),
        y_max: format_decimal((hi * 100.0).round() / 100.0),
        x_start: series.first_date()?.to_string(),
        x_end: series.last_date()?.to_string(),
    })
}
