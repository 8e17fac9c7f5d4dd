use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use report_feed_core::domain::Report;
use report_feed_core::storage::{
    IngestError, IngestOptions, IngestOutcome, ListOrder, ReportList, ReportStore,
};
use report_feed_core::summary::PortfolioSummary;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = report_feed_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let store = Arc::new(ReportStore::new());
    let options = settings.ingest_options();

    match settings.require_reports_path() {
        Ok(path) => match preload(&store, path, options) {
            Ok(outcome) => tracing::info!(
                path,
                accepted = outcome.accepted,
                rejected = outcome.rejected,
                "preloaded reports"
            ),
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %format!("{e:#}"), "report preload failed; starting with an empty store");
            }
        },
        Err(_) => tracing::info!("REPORTS_PATH not set; starting with an empty store"),
    }

    let app = router(AppState { store, options });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn preload(
    store: &ReportStore,
    path: &str,
    options: IngestOptions,
) -> anyhow::Result<IngestOutcome> {
    let records = report_feed_core::ingest::source::load_records(path)?;
    Ok(store.ingest(&records, options)?)
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/reports", get(list_reports).post(ingest_reports))
        .route("/reports/:ticker", get(get_report))
        .route("/summary", get(get_summary))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    store: Arc<ReportStore>,
    options: IngestOptions,
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    order: ListOrder,
}

#[derive(Debug, Default, Deserialize)]
struct IngestQuery {
    strict: Option<bool>,
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ReportList> {
    Json(state.store.list(query.order))
}

async fn get_report(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Report>, StatusCode> {
    let report = state
        .store
        .get(&ticker)
        .map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(Report::clone(&report)))
}

async fn get_summary(State(state): State<AppState>) -> Json<PortfolioSummary> {
    Json(state.store.summary())
}

async fn ingest_reports(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
    Json(batch): Json<Value>,
) -> Result<Json<IngestOutcome>, (StatusCode, Json<Value>)> {
    let options = IngestOptions {
        strict: query.strict.unwrap_or(state.options.strict),
        ..state.options
    };

    state.store.ingest_value(&batch, options).map(Json).map_err(|e| {
        let status = match e {
            IngestError::Strict { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::Malformed { .. } => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(json!({
                "error": e.to_string(),
                "errors": e.validation_errors(),
            })),
        )
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &report_feed_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
