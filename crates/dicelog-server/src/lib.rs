// Server mode - log sharing HTTP service
//
// Runs anywhere a socket can be bound:
// - Docker containers
// - local development next to a dice client
// - VM instances fronting the hosted key-value store
//
// Features:
// - Axum HTTP server (HTTP/1.1, HTTP/2)
// - Storage backend selected from explicit configuration (kv, fs)
// - Per-route CORS bound to the configured frontend origin
// - Structured logging with tracing
// - Graceful shutdown

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use dicelog_config::{FrontendUrl, RuntimeConfig, ServerConfig};
use dicelog_core::ApiError;
use dicelog_storage::Storage;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

mod handlers;
mod init;

pub use init::{init_storage, init_tracing};

/// Headroom on top of the upload ceiling for multipart framing and the
/// non-file form fields, so the body limit never fires before the
/// explicit size checks do.
const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub frontend: FrontendUrl,
    pub max_upload_bytes: usize,
    pub debug_errors: bool,
}

impl AppState {
    /// Wrap an unexpected failure. The error chain reaches the response
    /// body only when debug_errors is enabled.
    pub(crate) fn internal(&self, err: anyhow::Error) -> AppError {
        error!("Request error: {:?}", err);
        let body = if self.debug_errors {
            json!({"error": format!("{:?}", err)})
        } else {
            ApiError::Internal {
                message: err.to_string(),
            }
            .body()
        };
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body,
        }
    }
}

/// Error type that implements IntoResponse
pub(crate) struct AppError {
    status: StatusCode,
    body: Value,
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: err.body(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Build the application router for the given state.
///
/// Each API path carries its own CORS layer so the allow-methods header
/// stays method-specific; preflight requests are answered by the layer
/// without touching storage.
pub fn router(state: AppState) -> Result<Router> {
    let origin: HeaderValue = state
        .frontend
        .origin()
        .parse()
        .context("Frontend origin is not a valid header value")?;
    let allow_headers = [
        header::CONTENT_TYPE,
        HeaderName::from_static("accept-version"),
    ];

    let upload_cors = CorsLayer::new()
        .allow_origin(origin.clone())
        .allow_methods([Method::PUT, Method::OPTIONS])
        .allow_headers(allow_headers.clone());

    let retrieve_cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(allow_headers);

    // The explicit checks in the upload handler enforce the real
    // ceiling; the body limit is a backstop against unbounded bodies.
    let body_limit = state
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(BODY_LIMIT_HEADROOM);

    let app = Router::new()
        .route("/api/dice/log", put(handlers::upload_log).layer(upload_cors))
        .route(
            "/api/dice/load_data",
            get(handlers::load_data).layer(retrieve_cors),
        )
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Ok(app)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Entry point for server mode with a resolved configuration
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    let server = config.server.clone().unwrap_or_else(ServerConfig::default);
    init_tracing(&server);

    config.validate()?;

    info!("dicelog - log sharing backend");

    let frontend = config.frontend()?;
    let storage = init_storage(&config).await?;

    let state = AppState {
        storage,
        frontend: frontend.clone(),
        max_upload_bytes: config.request.max_upload_bytes,
        debug_errors: server.debug_errors,
    };

    let app = router(state)?;

    let listener = tokio::net::TcpListener::bind(&server.listen_addr)
        .await
        .context(format!("Failed to bind to {}", server.listen_addr))?;

    info!("Log sharing endpoint listening on http://{}", server.listen_addr);
    info!("Routes:");
    info!(
        "  PUT  http://{}/api/dice/log       - log upload",
        server.listen_addr
    );
    info!(
        "  GET  http://{}/api/dice/load_data - log retrieval",
        server.listen_addr
    );
    info!(
        "  GET  http://{}/health             - health check",
        server.listen_addr
    );
    info!("Frontend base URL: {}", frontend);
    info!("Press Ctrl+C or send SIGTERM to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");

    Ok(())
}
