use crate::domain::metrics::{MetricsRow, MetricsTable};
use crate::domain::quote::{CloseSeries, QuoteSnapshot};
use crate::ingest::QuoteProvider;
use anyhow::Context;
use serde::Serialize;

pub const NO_DATA_WARNING: &str = "⚠️ No historical data found. Check the stock symbol.";

/// Receives what one dashboard pass produces. Hosts decide how it looks.
pub trait DisplaySink {
    fn subheader(&mut self, text: &str);
    fn warning(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn table(&mut self, table: &MetricsTable);
    fn line_chart(&mut self, series: &CloseSeries);
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteReport {
    pub symbol: String,
    pub metrics: MetricsRow,
    pub table: MetricsTable,
    pub chart: CloseSeries,
}

impl QuoteReport {
    pub fn subheader(&self) -> String {
        format!("📈 {} - Key Financial Metrics", self.symbol)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardOutcome {
    #[serde(rename = "ok")]
    Report(QuoteReport),
    NoData { symbol: String },
    #[serde(rename = "error")]
    Failed { symbol: String, error: String },
}

impl DashboardOutcome {
    pub fn from_result(symbol: &str, res: &anyhow::Result<Option<QuoteReport>>) -> Self {
        match res {
            Ok(Some(report)) => DashboardOutcome::Report(report.clone()),
            Ok(None) => DashboardOutcome::NoData {
                symbol: symbol.to_string(),
            },
            Err(err) => DashboardOutcome::Failed {
                symbol: symbol.to_string(),
                error: format!("{err:#}"),
            },
        }
    }

    pub fn error_message(error: &str) -> String {
        format!("❌ Error fetching data: {error}")
    }

    /// Either the whole report reaches the sink, or exactly one warning or error line does.
    pub fn render(&self, sink: &mut dyn DisplaySink) {
        match self {
            DashboardOutcome::Report(report) => {
                sink.subheader(&report.subheader());
                sink.table(&report.table);
                sink.line_chart(&report.chart);
            }
            DashboardOutcome::NoData { .. } => sink.warning(NO_DATA_WARNING),
            DashboardOutcome::Failed { error, .. } => sink.error(&Self::error_message(error)),
        }
    }
}

/// One full pass for `symbol`: fundamentals, then history, then metrics.
/// `Ok(None)` means the provider returned no bars.
pub async fn fetch_report(
    provider: &dyn QuoteProvider,
    symbol: &str,
    range: &str,
) -> anyhow::Result<Option<QuoteReport>> {
    tracing::info!(%symbol, %range, provider = provider.provider_name(), "fetching quote");

    let fundamentals = provider
        .fetch_fundamentals(symbol)
        .await
        .with_context(|| format!("failed to fetch fundamentals for {symbol}"))?;
    let history = provider
        .fetch_history(symbol, range)
        .await
        .with_context(|| format!("failed to fetch {range} price history for {symbol}"))?;

    if history.is_empty() {
        tracing::warn!(%symbol, "no price history returned");
        return Ok(None);
    }

    let chart = history.close_series();
    let snapshot = QuoteSnapshot {
        symbol: symbol.to_string(),
        history,
        fundamentals,
    };

    let Some(metrics) = MetricsRow::derive(&snapshot)? else {
        return Ok(None);
    };
    let table = MetricsTable::from_metrics(&metrics);

    tracing::info!(%symbol, bars = chart.points.len(), "quote report ready");
    Ok(Some(QuoteReport {
        symbol: snapshot.symbol,
        metrics,
        table,
        chart,
    }))
}
