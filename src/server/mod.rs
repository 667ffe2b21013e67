//! REST API server for UI component recognition
//!
//! Endpoints:
//! - `GET /api/health`: liveness check
//! - `POST /api/recognize`: multipart upload (field `file`) returning the
//!   detected components

mod handlers;
mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::factory::ProviderFactory;
use crate::service::RecognitionService;

pub use handlers::*;
pub use types::*;

/// Slack above the upload limit for multipart framing, so oversized files
/// reach the handler and get the `file_too_large` envelope
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// API server state shared across handlers
#[derive(Clone, Debug)]
pub struct ApiState {
    /// Recognition service with the selected provider
    pub service: Arc<RecognitionService>,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl ApiState {
    /// Create new API state
    #[must_use]
    pub fn new(service: RecognitionService, max_upload_bytes: usize) -> Self {
        Self {
            service: Arc::new(service),
            max_upload_bytes,
        }
    }

    /// Build state from configuration, constructing the provider via `factory`
    #[must_use]
    pub fn from_config(config: &ServiceConfig, factory: &dyn ProviderFactory) -> Self {
        Self::new(
            RecognitionService::from_config(config, factory),
            config.max_upload_bytes,
        )
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/recognize", post(recognize))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on an already bound listener
///
/// # Errors
/// - I/O failures of the accept loop
pub async fn serve(listener: TcpListener, state: ApiState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("API server listening on {}", addr);
    }
    axum::serve(listener, build_router(state)).await
}

/// Start the API server
///
/// # Errors
/// - The address cannot be bound
/// - I/O failures of the accept loop
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}
