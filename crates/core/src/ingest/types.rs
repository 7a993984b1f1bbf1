//! Yahoo Finance response shapes for the chart and quoteSummary endpoints.

use crate::domain::quote::{Fundamentals, PriceBar, PriceHistory};
use anyhow::Context;
use chrono::DateTime;
use serde::Deserialize;

pub const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Debug, Clone, Deserialize)]
pub struct YahooError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl YahooError {
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case(NOT_FOUND_CODE)
    }
}

impl std::fmt::Display for YahooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(d) => write!(f, "{}: {}", self.code, d),
            None => f.write_str(&self.code),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub currency: Option<String>,
    /// Exchange offset from UTC, seconds.
    #[serde(default)]
    pub gmtoffset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseIndicator>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdjCloseIndicator {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

impl ChartResult {
    /// Bars with any missing price are dropped; a missing volume counts as zero.
    ///
    /// Prices are dividend and split adjusted: open, high, low and close are scaled by
    /// `adjclose / close`. Bars without an adjusted close keep their raw prices.
    pub fn into_history(self) -> anyhow::Result<PriceHistory> {
        let offset = self.meta.gmtoffset.unwrap_or(0);
        let adjclose = self
            .indicators
            .adjclose
            .into_iter()
            .next()
            .map(|a| a.adjclose)
            .unwrap_or_default();
        let Some(quote) = self.indicators.quote.into_iter().next() else {
            return Ok(PriceHistory {
                currency: self.meta.currency,
                bars: vec![],
            });
        };

        let mut bars = Vec::with_capacity(self.timestamp.len());
        for (i, ts) in self.timestamp.iter().enumerate() {
            let (Some(open), Some(high), Some(low), Some(close)) = (
                at(&quote.open, i),
                at(&quote.high, i),
                at(&quote.low, i),
                at(&quote.close, i),
            ) else {
                continue;
            };

            let date = DateTime::from_timestamp(ts + offset, 0)
                .with_context(|| format!("chart timestamp out of range: {ts}"))?
                .date_naive();
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);
            let factor = adjustment(close, at(&adjclose, i));

            bars.push(PriceBar {
                date,
                open: open * factor,
                high: high * factor,
                low: low * factor,
                close: close * factor,
                volume,
            });
        }

        Ok(PriceHistory {
            currency: self.meta.currency,
            bars,
        })
    }
}

fn at(v: &[Option<f64>], i: usize) -> Option<f64> {
    v.get(i).copied().flatten()
}

fn adjustment(close: f64, adjclose: Option<f64>) -> f64 {
    match adjclose {
        Some(adj) if adj.is_finite() && close != 0.0 => adj / close,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryBody {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResult {
    #[serde(default)]
    pub summary_detail: Option<SummaryDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetail {
    #[serde(rename = "trailingPE", default)]
    pub trailing_pe: Option<RawValue>,
    #[serde(default)]
    pub market_cap: Option<RawValue>,
    #[serde(default)]
    pub dividend_yield: Option<RawValue>,
}

/// `{"raw": 28.5, "fmt": "28.50"}`; Yahoo sends `{}` when the figure is unknown.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub raw: Option<f64>,
}

fn raw(v: Option<RawValue>) -> Option<f64> {
    v.and_then(|v| v.raw).filter(|x| x.is_finite())
}

impl From<SummaryDetail> for Fundamentals {
    fn from(d: SummaryDetail) -> Self {
        Self {
            trailing_pe: raw(d.trailing_pe),
            market_cap: raw(d.market_cap),
            dividend_yield: raw(d.dividend_yield),
        }
    }
}

impl QuoteSummaryResult {
    pub fn into_fundamentals(self) -> Fundamentals {
        self.summary_detail.map(Fundamentals::from).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn parses_chart_and_drops_null_rows() {
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"currency": "INR", "symbol": "INFY.NS", "gmtoffset": 19800},
                    "timestamp": [1735789500, 1735875900, 1736135100],
                    "indicators": {
                        "quote": [{
                            "open":   [1900.0, null, 1910.0],
                            "high":   [1920.5, null, 1935.0],
                            "low":    [1890.0, null, 1901.2],
                            "close":  [1915.0, null, 1930.4],
                            "volume": [1200, null, null]
                        }],
                        "adjclose": [{"adjclose": [1915.0, null, 1930.4]}]
                    }
                }],
                "error": null
            }
        });

        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        let result = parsed.chart.result.unwrap().into_iter().next().unwrap();
        let history = result.into_history().unwrap();

        assert_eq!(history.currency.as_deref(), Some("INR"));
        assert_eq!(history.bars.len(), 2);
        assert_eq!(
            history.bars[0].date,
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
        assert_eq!(history.bars[1].close, 1930.4);
        assert_eq!(history.bars[1].volume, 0);
    }

    #[test]
    fn prices_are_scaled_by_adjusted_close() {
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"currency": "INR", "gmtoffset": 19800},
                    "timestamp": [1735789500, 1735875900, 1735962300],
                    "indicators": {
                        "quote": [{
                            "open":   [100.0, 105.0, 108.0],
                            "high":   [102.0, 112.0, 111.0],
                            "low":    [99.0, 104.0, 107.0],
                            "close":  [100.0, 110.0, 110.0],
                            "volume": [10, 20, 30]
                        }],
                        "adjclose": [{"adjclose": [97.0, 110.0, null]}]
                    }
                }],
                "error": null
            }
        });
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        let result = parsed.chart.result.unwrap().into_iter().next().unwrap();
        let history = result.into_history().unwrap();

        let first = &history.bars[0];
        assert!((first.close - 97.0).abs() < 1e-9);
        assert!((first.open - 97.0).abs() < 1e-9);
        assert!((first.high - 98.94).abs() < 1e-9);
        assert!((first.low - 96.03).abs() < 1e-9);
        assert_eq!(history.bars[1].close, 110.0);
        assert_eq!(history.bars[1].high, 112.0);
        // No adjusted close for this bar; raw prices are kept.
        assert_eq!(history.bars[2].low, 107.0);

        let snapshot = crate::domain::quote::QuoteSnapshot {
            symbol: "INFY.NS".to_string(),
            history,
            fundamentals: Fundamentals::default(),
        };
        let m = crate::domain::metrics::MetricsRow::derive(&snapshot)
            .unwrap()
            .unwrap();
        assert_eq!(m.one_year_return, 13.4);
        assert_eq!(crate::domain::metrics::round2(m.low_52w), 96.03);
    }

    #[test]
    fn chart_without_quote_block_is_empty() {
        let v = json!({
            "chart": {
                "result": [{"meta": {"currency": "USD"}, "indicators": {"quote": [{}]}}],
                "error": null
            }
        });
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        let result = parsed.chart.result.unwrap().into_iter().next().unwrap();
        assert!(result.into_history().unwrap().is_empty());
    }

    #[test]
    fn parses_chart_not_found_error() {
        let v = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        });
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        let err = parsed.chart.error.unwrap();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Not Found: No data found, symbol may be delisted"
        );
    }

    #[test]
    fn parses_summary_detail_with_missing_fields() {
        let v = json!({
            "quoteSummary": {
                "result": [{
                    "summaryDetail": {
                        "trailingPE": {"raw": 24.81, "fmt": "24.81"},
                        "marketCap": {"raw": 7712345678901i64, "fmt": "7.71T", "longFmt": "7,712,345,678,901"},
                        "dividendYield": {}
                    }
                }],
                "error": null
            }
        });
        let parsed: QuoteSummaryResponse = serde_json::from_value(v).unwrap();
        let result = parsed.quote_summary.result.unwrap().into_iter().next().unwrap();
        let f = result.into_fundamentals();
        assert_eq!(f.trailing_pe, Some(24.81));
        assert_eq!(f.market_cap, Some(7_712_345_678_901.0));
        assert_eq!(f.dividend_yield, None);
    }

    #[test]
    fn summary_without_detail_module_has_no_fundamentals() {
        let v = json!({"quoteSummary": {"result": [{}], "error": null}});
        let parsed: QuoteSummaryResponse = serde_json::from_value(v).unwrap();
        let result = parsed.quote_summary.result.unwrap().into_iter().next().unwrap();
        assert_eq!(result.into_fundamentals(), Fundamentals::default());
    }
}
