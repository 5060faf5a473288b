// Sanctions Registry - Web Server
// REST API with Axum plus the periodic reprocess trigger

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sanctions_registry::{
    Config, Mention, RegistryAssembler, SanctionsError, Screener, ScreeningOutcome, Source,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    assembler: Arc<RegistryAssembler>,
    screener: Arc<Screener>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize)]
struct NameCheckRequest {
    full_name: String,
}

/// Result of a name check
#[derive(Serialize)]
struct NameCheckResponse {
    message: String,
    match_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    match_details: Option<MatchDetails>,
}

#[derive(Serialize)]
struct MatchDetails {
    name: String,
    aliases: Vec<String>,
    source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dob: Option<String>,
    links: Option<Vec<Mention>>,
}

/// Status response
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    total_entries: usize,
    by_source: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

impl From<ScreeningOutcome> for NameCheckResponse {
    fn from(outcome: ScreeningOutcome) -> Self {
        let full_name = outcome.full_name.unwrap_or_default();
        let match_details = outcome.matched.map(|entity| MatchDetails {
            name: entity.name,
            aliases: entity.aliases.good_quality,
            source: entity.source,
            nationality: entity.nationality,
            dob: entity.date_of_birth,
            links: outcome.mentions,
        });

        Self {
            message: format!("Successfully checked name: {}", full_name),
            match_found: match_details.is_some(),
            match_details,
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /check-name - Check a full name against every list
async fn check_name(
    State(state): State<AppState>,
    Json(request): Json<NameCheckRequest>,
) -> impl IntoResponse {
    let screener = Arc::clone(&state.screener);
    let name = request.full_name;

    // the mentions lookup may block
    match tokio::task::spawn_blocking(move || screener.screen_name(&name)).await {
        Ok(outcome) => {
            let response: NameCheckResponse = outcome.into();
            (StatusCode::OK, Json(ApiResponse::ok(Some(response)))).into_response()
        }
        Err(e) => {
            error!("Name check task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Option<NameCheckResponse>>::err(
                    None,
                    "Error checking name",
                )),
            )
                .into_response()
        }
    }
}

/// POST /reprocess-sanctions - Start a reprocess run in the background
async fn trigger_reprocess(State(state): State<AppState>) -> impl IntoResponse {
    spawn_reprocess(Arc::clone(&state.assembler), "manual");
    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok("Reprocessing started in background")),
    )
}

/// GET /sanctions-status - Current registry and snapshot
async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.assembler.registry().current();
    let meta = match state.assembler.store().latest_meta() {
        Ok(meta) => meta,
        Err(e) => {
            warn!("Could not read snapshot metadata: {}", e);
            None
        }
    };

    let status = StatusResponse {
        status: "active",
        total_entries: registry.len(),
        by_source: registry.count_by_source(),
        snapshot_id: meta.as_ref().map(|m| m.id.clone()),
        last_updated: meta.as_ref().map(|m| m.created_at.to_rfc3339()),
    };
    Json(ApiResponse::ok(status))
}

// ============================================================================
// Reprocess trigger
// ============================================================================

fn spawn_reprocess(assembler: Arc<RegistryAssembler>, trigger: &'static str) {
    tokio::task::spawn_blocking(move || match assembler.reprocess() {
        Ok(report) => info!(
            trigger,
            "Reprocess finished: {} entries, snapshot {}",
            report.total(),
            report.snapshot.id
        ),
        Err(SanctionsError::ReprocessInProgress) => {
            warn!(trigger, "Reprocess skipped, another run is in progress")
        }
        Err(e) => error!(trigger, "Reprocess failed, keeping previous registry: {}", e),
    });
}

fn spawn_scheduler(assembler: Arc<RegistryAssembler>, period: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // the first tick completes immediately; startup already initialized
        interval.tick().await;
        loop {
            interval.tick().await;
            spawn_reprocess(Arc::clone(&assembler), "scheduled");
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for shutdown signal: {}", e);
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sanctions_registry=info,sanctions_server=info")),
        )
        .init();

    let force_reprocess = env::args().any(|arg| arg == "--reprocess");
    let config = Config::from_env();
    let assembler = Arc::new(RegistryAssembler::new(&config));

    let startup = Arc::clone(&assembler);
    let initialized = tokio::task::spawn_blocking(move || startup.initialize(force_reprocess))
        .await
        .context("Startup task panicked")?;
    match initialized {
        Ok(registry) => info!("Serving {} sanctioned entities", registry.len()),
        Err(e) => {
            error!("Startup reprocess failed: {}", e);
            assembler.load();
        }
    }

    let state = AppState {
        screener: Arc::new(Screener::new(assembler.registry())),
        assembler: Arc::clone(&assembler),
    };
    spawn_scheduler(Arc::clone(&assembler), config.server.reprocess_interval());

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/check-name", post(check_name))
        .route("/reprocess-sanctions", post(trigger_reprocess))
        .route("/sanctions-status", get(get_status))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    assembler.registry().shutdown();
    info!("Server stopped");
    Ok(())
}
