//! Manual trigger handlers
//!
//! Each handler runs a flow through the same lease as the scheduler and
//! echoes its report as plain text.

use axum::extract::State;
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::worker::Worker;

/// Shared state of the diagnostic router
pub struct AppState {
    pub worker: Arc<Worker>,
}

const SKIPPED: &str = "SKIPPED (lock held by another instance)";

/// Run the upload flow
///
/// GET /testUpload
pub async fn test_upload(State(state): State<Arc<AppState>>) -> String {
    let report = match state.worker.upload_worker().await {
        Some(summary) => summary.report(),
        None => SKIPPED.to_string(),
    };
    info!(report = %report, "Manual upload run");
    format!("testUpload: {}", report)
}

/// Run the download flow
///
/// GET /testDownload
pub async fn test_download(State(state): State<Arc<AppState>>) -> String {
    let report = match state.worker.download_worker().await {
        Some(summary) => summary.report(),
        None => SKIPPED.to_string(),
    };
    info!(report = %report, "Manual download run");
    format!("testDownload: {}", report)
}

/// Sign the first entry waiting for upload, without sending it
///
/// GET /testSign
pub async fn test_sign(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    let engine = state.worker.engine();
    let pending = engine.store().pending_to_send().await?;

    let Some(entry) = pending.first() else {
        return Ok("testSign: nothing to sign".to_string());
    };

    let signed = engine.signer().sign(&entry.raw_data)?;
    info!(id = %entry.id, signed_len = signed.len(), "Manual signing");
    Ok(format!("testSign: OK\nid: {}\nsigned raw data: {}", entry.id, signed))
}

/// Purge the configured cache targets
///
/// GET /testPurge
pub async fn test_purge(State(state): State<Arc<AppState>>) -> String {
    if state.worker.engine().purge().await {
        "testPurge: OK".to_string()
    } else {
        "testPurge: FAILED".to_string()
    }
}
