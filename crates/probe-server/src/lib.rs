//! HTTP boundary for Probe.
//!
//! `POST /api` with `{"url": "<spec url>"}` runs the spec and answers with the
//! call records. Only `http(s)` locations are accepted; local files are a CLI
//! concern. Each request gets its own run (and identifier store); runs
//! never share state.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use probe_core::ProbeConfig;
use probe_runtime::SpecSource;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Message returned when a run fails before producing records.
pub const SPEC_FAILURE_MESSAGE: &str = "Failed to process OpenAPI spec.";

/// Error type for the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared handler state.
pub struct AppState {
    pub config: ProbeConfig,
}

/// Body of `POST /api`.
#[derive(Debug, Deserialize)]
pub struct ApiRequest {
    pub url: String,
}

/// Create the router with CORS and request tracing.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", post(handle_api))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_api(State(state): State<Arc<AppState>>, Json(request): Json<ApiRequest>) -> Response {
    if !matches!(SpecSource::parse(&request.url), Ok(SpecSource::Url(_))) {
        tracing::warn!(spec = %request.url, "Rejected non-HTTP spec location");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "url must be an http(s) URL"})),
        )
            .into_response();
    }

    match probe_runtime::run_spec(&request.url, &state.config).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            tracing::error!(spec = %request.url, error = %e, "Run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": SPEC_FAILURE_MESSAGE,
                    "detail": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "probe-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// The HTTP server.
pub struct ProbeServer {
    config: ProbeConfig,
}

impl ProbeServer {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Bind and serve until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.server.bind_addr();
        let app = create_router(Arc::new(AppState {
            config: self.config,
        }));

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!(addr = %addr, "probe-server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Serve)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
