//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use trustlist_core::SigningError;

use crate::storage::StorageError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Signing(SigningError::KeyUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SIGNING_KEY_UNAVAILABLE")
            }
            ApiError::Signing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SIGNING_FAILED"),
            ApiError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE"),
        };

        (status, format!("{}: {}", code, self)).into_response()
    }
}
