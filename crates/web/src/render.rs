use crate::chart::{svg_chart, SvgChart};
use anyhow::Context;
use serde::Serialize;
use stockinfo_core::dashboard::{DashboardOutcome, DisplaySink};
use stockinfo_core::domain::metrics::{MetricsTable, TableRow};
use stockinfo_core::domain::quote::CloseSeries;

const INDEX_TEMPLATE: &str = "index.html";

#[derive(Debug, Clone, Serialize)]
pub struct PageConfig {
    pub title: &'static str,
    pub icon: &'static str,
    pub layout: &'static str,
}

pub const PAGE: PageConfig = PageConfig {
    title: "Stock Info App",
    icon: "📈",
    layout: "centered",
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Subheader { text: String },
    Warning { text: String },
    Error { text: String },
    Table { rows: Vec<TableRow> },
    Chart { chart: SvgChart },
}

/// Collects the dashboard output as page blocks, in the order it arrives.
#[derive(Debug, Default)]
pub struct HtmlSink {
    pub blocks: Vec<Block>,
}

impl DisplaySink for HtmlSink {
    fn subheader(&mut self, text: &str) {
        self.blocks.push(Block::Subheader {
            text: text.to_string(),
        });
    }

    fn warning(&mut self, text: &str) {
        self.blocks.push(Block::Warning {
            text: text.to_string(),
        });
    }

    fn error(&mut self, text: &str) {
        self.blocks.push(Block::Error {
            text: text.to_string(),
        });
    }

    fn table(&mut self, table: &MetricsTable) {
        self.blocks.push(Block::Table {
            rows: table.rows.to_vec(),
        });
    }

    fn line_chart(&mut self, series: &CloseSeries) {
        if let Some(chart) = svg_chart(series) {
            self.blocks.push(Block::Chart { chart });
        }
    }
}

pub fn templates() -> anyhow::Result<tera::Tera> {
    let mut tera = tera::Tera::default();
    tera.add_raw_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))
        .context("failed to load index template")?;
    Ok(tera)
}

/// The whole page: input form, then whatever the outcome pushed (nothing when not triggered).
pub fn render_page(
    tera: &tera::Tera,
    symbol: &str,
    outcome: Option<&DashboardOutcome>,
) -> anyhow::Result<String> {
    let mut sink = HtmlSink::default();
    if let Some(outcome) = outcome {
        outcome.render(&mut sink);
    }

    let mut ctx = tera::Context::new();
    ctx.insert("page", &PAGE);
    ctx.insert("symbol", symbol);
    ctx.insert("blocks", &sink.blocks);

    tera.render(INDEX_TEMPLATE, &ctx)
        .context("failed to render dashboard page")
}
