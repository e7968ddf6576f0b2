//! Error types for the trust-list core

use thiserror::Error;

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while decoding or producing certificate material
#[derive(Error, Debug)]
pub enum CoreError {
    /// Signature verification failed
    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Certificate envelope could not be decoded
    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    /// COSE encoding/decoding error
    #[error("COSE error: {0}")]
    CoseError(String),

    /// Signed body disagrees with the labels the certificate arrived under
    #[error("Label mismatch: {0}")]
    LabelMismatch(String),

    /// Cryptographic error
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Errors raised by the outbound signing capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// No signing key has been configured for this instance
    #[error("Signing key material is not available")]
    KeyUnavailable,

    /// Refusing to sign an empty payload
    #[error("Cannot sign an empty payload")]
    EmptyPayload,

    /// The envelope could not be produced
    #[error("Signing failed: {0}")]
    Envelope(String),
}

impl From<ed25519_dalek::SignatureError> for CoreError {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        CoreError::CryptoError(err.to_string())
    }
}

impl From<coset::CoseError> for CoreError {
    fn from(err: coset::CoseError) -> Self {
        CoreError::CoseError(format!("{:?}", err))
    }
}
