use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub currency: Option<String>,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn close_series(&self) -> CloseSeries {
        CloseSeries {
            points: self
                .bars
                .iter()
                .map(|bar| ClosePoint {
                    date: bar.date,
                    close: bar.close,
                })
                .collect(),
        }
    }
}

/// Provider fundamentals. Every field is optional upstream and stays `None` when missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub trailing_pe: Option<f64>,
    pub market_cap: Option<f64>,
    /// Fraction, e.g. `0.025` for 2.5%.
    pub dividend_yield: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub history: PriceHistory,
    pub fundamentals: Fundamentals,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloseSeries {
    pub points: Vec<ClosePoint>,
}

impl CloseSeries {
    /// `(min, max)` of the closes, `None` for an empty series.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?.close;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (lo.min(p.close), hi.max(p.close))
        }))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}
