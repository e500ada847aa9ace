//! Error types for header decoding.

use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed header line.
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// Malformed encoded word or transfer encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Charset other than UTF-8, US-ASCII or ISO-8859-1.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}
