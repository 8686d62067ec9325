use thiserror::Error;

/// Errors returned by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or unusable merchant configuration. Raised before any
    /// network call — an unsigned request is never sent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required checkout field is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure, non-2xx status, or an unparseable response body.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response or notification carried a signature that did not match.
    /// Always fail-closed: the payload's claimed outcome is never trusted.
    #[error("signature verification failed")]
    SignatureVerification,

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
