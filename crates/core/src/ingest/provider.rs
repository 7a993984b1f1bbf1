use crate::config::Settings;
use crate::domain::quote::{Fundamentals, PriceHistory};
use crate::ingest::types::{ChartResponse, QuoteSummaryResponse};
use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use std::time::Duration;

const SUMMARY_MODULES: &str = "summaryDetail";

// Longest slice of a response body carried into an error message.
const BODY_SNIPPET_CHARS: usize = 200;

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals>;

    /// Daily bars for `range` (e.g. `1y`), oldest first. An unknown symbol yields an empty
    /// history rather than an error.
    async fn fetch_history(&self, symbol: &str, range: &str) -> Result<PriceHistory>;
}

#[derive(Debug)]
pub struct YahooFinanceProvider {
    http: reqwest::Client,
    chart_base_url: String,
    summary_base_url: String,
    cookie_url: String,

    // quoteSummary needs a session crumb; keep it for the life of the process.
    crumb: tokio::sync::Mutex<Option<String>>,
}

impl YahooFinanceProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .cookie_store(true)
            .build()
            .context("failed to build Yahoo Finance http client")?;

        Ok(Self {
            http,
            chart_base_url: settings.chart_base_url.clone(),
            summary_base_url: settings.summary_base_url.clone(),
            cookie_url: settings.cookie_url.clone(),
            crumb: tokio::sync::Mutex::new(None),
        })
    }

    async fn crumb(&self) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie endpoint answers 404 but still sets the session cookie.
        if let Err(err) = self.http.get(&self.cookie_url).send().await {
            tracing::warn!(error = %err, url = %self.cookie_url, "Yahoo cookie request failed");
        }

        let url = endpoint(&self.summary_base_url, &["v1", "test", "getcrumb"])?;
        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("Yahoo crumb request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Yahoo crumb response")?;
        if !status.is_success() {
            anyhow::bail!("Yahoo crumb HTTP {status}: {}", snippet(&text));
        }

        let crumb = text.trim().to_string();
        anyhow::ensure!(
            !crumb.is_empty() && !crumb.contains('<'),
            "Yahoo crumb response is not a crumb: {}",
            snippet(&text)
        );

        tracing::debug!("obtained Yahoo session crumb");
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    async fn fetch_summary_once(
        &self,
        symbol: &str,
        crumb: &str,
    ) -> Result<(StatusCode, String)> {
        let url = endpoint(
            &self.summary_base_url,
            &["v10", "finance", "quoteSummary", symbol],
        )?;

        let res = self
            .http
            .get(url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb)])
            .send()
            .await
            .context("Yahoo quoteSummary request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Yahoo quoteSummary response")?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let crumb = self.crumb().await?;
        let (mut status, mut text) = self.fetch_summary_once(symbol, &crumb).await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(%symbol, http_status = %status, "Yahoo rejected crumb; refreshing");
            self.invalidate_crumb().await;
            let crumb = self.crumb().await?;
            (status, text) = self.fetch_summary_once(symbol, &crumb).await?;
        }

        parse_summary(symbol, status, &text)
    }

    async fn fetch_history(&self, symbol: &str, range: &str) -> Result<PriceHistory> {
        let url = endpoint(&self.chart_base_url, &["v8", "finance", "chart", symbol])?;

        let res = self
            .http
            .get(url)
            .query(&[
                ("range", range),
                ("interval", "1d"),
                ("events", "div,split"),
            ])
            .send()
            .await
            .context("Yahoo chart request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Yahoo chart response")?;

        parse_chart(symbol, status, &text)
    }
}

/// `base` joined with `segments`, each percent-encoded as one path segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid provider base url: {base}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("provider base url cannot have a path: {base}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// First `BODY_SNIPPET_CHARS` characters of a response body, whitespace collapsed.
fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((end, _)) => format!("{}...", &flat[..end]),
        None => flat,
    }
}

fn parse_chart(symbol: &str, status: StatusCode, text: &str) -> Result<PriceHistory> {
    let parsed = match serde_json::from_str::<ChartResponse>(text) {
        Ok(parsed) => parsed,
        Err(_) if !status.is_success() => anyhow::bail!("Yahoo chart HTTP {status}: {}", snippet(text)),
        Err(err) => {
            return Err(err).with_context(|| format!("Yahoo chart response is not valid: {}", snippet(text)))
        }
    };

    if let Some(err) = parsed.chart.error {
        if err.is_not_found() {
            tracing::warn!(%symbol, error = %err, "Yahoo has no chart for symbol");
            return Ok(PriceHistory::default());
        }
        anyhow::bail!("Yahoo chart error for {symbol}: {err}");
    }
    if !status.is_success() {
        anyhow::bail!("Yahoo chart HTTP {status}: {}", snippet(text));
    }

    match parsed.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result.into_history(),
        None => Ok(PriceHistory::default()),
    }
}

fn parse_summary(symbol: &str, status: StatusCode, text: &str) -> Result<Fundamentals> {
    let parsed = match serde_json::from_str::<QuoteSummaryResponse>(text) {
        Ok(parsed) => parsed,
        Err(_) if !status.is_success() => {
            anyhow::bail!("Yahoo quoteSummary HTTP {status}: {}", snippet(text))
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Yahoo quoteSummary response is not valid: {}", snippet(text)))
        }
    };

    if let Some(err) = parsed.quote_summary.error {
        // Let the history request decide whether the symbol exists at all.
        if err.is_not_found() {
            tracing::warn!(%symbol, error = %err, "Yahoo has no fundamentals for symbol");
            return Ok(Fundamentals::default());
        }
        anyhow::bail!("Yahoo quoteSummary error for {symbol}: {err}");
    }
    if !status.is_success() {
        anyhow::bail!("Yahoo quoteSummary HTTP {status}: {}", snippet(text));
    }

    Ok(parsed
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.into_fundamentals())
        .unwrap_or_default())
}
