//! Error types for token and SASL handling.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` boundary errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes were not UTF-8.
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Token expired.
    #[error("Token expired")]
    TokenExpired,

    /// Invalid token response.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}
