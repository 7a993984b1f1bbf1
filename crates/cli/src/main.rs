use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockinfo_core::dashboard::{fetch_report, DashboardOutcome};
use stockinfo_core::ingest::YahooFinanceProvider;
use stockinfo_core::trigger::SymbolInput;

mod terminal;

#[derive(Debug, Parser)]
#[command(name = "stockinfo_cli", about = "Key financial metrics for one stock symbol")]
struct Args {
    /// Ticker symbol, e.g. INFY.NS, RELIANCE.NS, TCS.NS. Defaults to STOCKINFO_DEFAULT_SYMBOL.
    symbol: Option<String>,

    /// History period requested from the provider (e.g. 6mo, 1y, 2y).
    #[arg(long)]
    range: Option<String>,

    /// Print the outcome as JSON instead of a table and chart.
    #[arg(long)]
    json: bool,

    #[arg(long, default_value_t = 60)]
    chart_width: usize,

    #[arg(long, default_value_t = 12)]
    chart_height: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = stockinfo_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    // Running the command is the fetch trigger.
    let input = SymbolInput::with_default(args.symbol.clone(), true, &settings.default_symbol);
    let Some(symbol) = input.triggered_symbol() else {
        return Ok(ExitCode::SUCCESS);
    };
    let range = args.range.as_deref().unwrap_or(&settings.history_range);

    let provider = YahooFinanceProvider::from_settings(&settings)?;
    let res = fetch_report(&provider, symbol, range).await;
    match &res {
        Err(err) => {
            sentry_anyhow::capture_anyhow(err);
            let error = format!("{err:#}");
            tracing::error!(%symbol, %error, "quote fetch failed");
        }
        Ok(None) => tracing::warn!(%symbol, "no historical data"),
        Ok(Some(_)) => {}
    }
    let outcome = DashboardOutcome::from_result(symbol, &res);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        let mut sink = terminal::TerminalSink::new(args.chart_width, args.chart_height);
        outcome.render(&mut sink);
        for line in &sink.out {
            println!("{line}");
        }
        for line in &sink.err {
            eprintln!("{line}");
        }
    }

    Ok(match outcome {
        DashboardOutcome::Report(_) => ExitCode::SUCCESS,
        DashboardOutcome::NoData { .. } | DashboardOutcome::Failed { .. } => ExitCode::FAILURE,
    })
}

fn init_sentry(settings: &stockinfo_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbol_and_flags() {
        let args = Args::parse_from(["stockinfo_cli", "TCS.NS", "--range", "6mo", "--json"]);
        assert_eq!(args.symbol.as_deref(), Some("TCS.NS"));
        assert_eq!(args.range.as_deref(), Some("6mo"));
        assert!(args.json);
        assert_eq!(args.chart_width, 60);
        assert_eq!(args.chart_height, 12);
    }

    #[test]
    fn symbol_is_optional() {
        let args = Args::parse_from(["stockinfo_cli"]);
        assert!(args.symbol.is_none());
        assert!(!args.json);
    }
}
