//! Error types for the gateway client

use thiserror::Error;

/// Result type for gateway client operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failures of a remote call that prevent it from taking effect
///
/// A non-accepted status is not an error; it is returned to the caller as a
/// status code. None of these failures are retried by the client.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The gateway could not be reached or the connection broke
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway answered with a body that cannot be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The client itself is misconfigured
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::MalformedResponse(err.to_string())
        } else if err.is_builder() {
            GatewayError::Configuration(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::MalformedResponse(err.to_string())
    }
}
