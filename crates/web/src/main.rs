use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockinfo_core::dashboard::{fetch_report, DashboardOutcome};
use stockinfo_core::ingest::{QuoteProvider, YahooFinanceProvider};
use stockinfo_core::trigger::{is_trigger_value, SymbolInput};

mod chart;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockinfo_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = YahooFinanceProvider::from_settings(&settings)?;
    let state = AppState {
        provider: Arc::new(provider),
        templates: Arc::new(render::templates()?),
        default_symbol: settings.default_symbol.clone(),
        history_range: settings.history_range.clone(),
    };

    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port()?));
    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/healthz", get(healthz))
        .route("/api/quote/:symbol", get(get_quote))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn QuoteProvider>,
    templates: Arc<tera::Tera>,
    default_symbol: String,
    history_range: String,
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    symbol: Option<String>,
    fetch: Option<String>,
}

impl DashboardQuery {
    fn into_input(self, default_symbol: &str) -> SymbolInput {
        let fetch = self.fetch.as_deref().is_some_and(is_trigger_value);
        SymbolInput::with_default(self.symbol, fetch, default_symbol)
    }
}

async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, StatusCode> {
    let input = query.into_input(&state.default_symbol);

    let outcome = match input.triggered_symbol() {
        Some(symbol) => Some(run_dashboard(&state, symbol).await),
        None => None,
    };

    let html = render::render_page(&state.templates, &input.text, outcome.as_ref()).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "dashboard page render failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Html(html))
}

async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> (StatusCode, Json<DashboardOutcome>) {
    let outcome = run_dashboard(&state, &symbol).await;
    let status = match &outcome {
        DashboardOutcome::Report(_) => StatusCode::OK,
        DashboardOutcome::NoData { .. } => StatusCode::NOT_FOUND,
        DashboardOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome))
}

async fn run_dashboard(state: &AppState, symbol: &str) -> DashboardOutcome {
    let res = fetch_report(state.provider.as_ref(), symbol, &state.history_range).await;
    match &res {
        Err(e) => {
            sentry_anyhow::capture_anyhow(e);
            let error = format!("{e:#}");
            tracing::error!(%symbol, %error, "quote fetch failed");
        }
        Ok(None) => tracing::warn!(%symbol, "no historical data"),
        Ok(Some(_)) => {}
    }
    DashboardOutcome::from_result(symbol, &res)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
