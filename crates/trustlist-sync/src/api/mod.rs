//! Diagnostic HTTP surface

pub mod error;
pub mod handlers;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/testUpload", get(handlers::test_upload))
        .route("/testDownload", get(handlers::test_download))
        .route("/testSign", get(handlers::test_sign))
        .route("/testPurge", get(handlers::test_purge))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
