//! Error types for the IMAP engine.

use std::time::Duration;

use thiserror::Error;

use crate::grammar::ParseError;

/// Details the server gave when it rejected an XOAUTH2 exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthErrorDetails {
    /// Decoded continuation payload (usually a JSON object), or empty if the
    /// server rejected the command without a challenge.
    pub summary: String,
}

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection, possibly in the middle of a line.
    #[error("connection closed")]
    Closed,

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Connecting took longer than the configured timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The operation needs an open connection.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called on a client that already has a connection.
    #[error("already connected")]
    AlreadyConnected,

    /// The input did not match the response grammar.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Furthest byte position the grammar reached.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// The input matched the grammar but violates a semantic rule.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// A record could not be extracted from an otherwise valid response.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// A command could not be encoded.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Server returned NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// The reply has an unexpected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A continuation request arrived for a command that does not expect one.
    #[error("unexpected continuation request")]
    Interrupted,

    /// A line was neither untagged, a continuation, nor tagged with the
    /// outstanding tag.
    #[error("unexpected line from server: {0}")]
    BadMessage(String),

    /// The server rejected XOAUTH2 authentication.
    #[error("Authentication failed: {text}")]
    Auth {
        /// Text of the final tagged line.
        text: String,
        /// Challenge payload captured before the final line.
        details: AuthErrorDetails,
    },
}

impl Error {
    /// Returns true for errors raised while parsing or extracting records.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. } | Self::Semantic(_) | Self::Extraction(_)
        )
    }

    /// Returns true for errors reported by, or caused by, the server's replies.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::No(_)
                | Self::Bad(_)
                | Self::Protocol(_)
                | Self::Interrupted
                | Self::BadMessage(_)
                | Self::Auth { .. }
        )
    }

    /// Returns the authentication failure details, if this is an auth error.
    #[must_use]
    pub const fn auth_details(&self) -> Option<&AuthErrorDetails> {
        match self {
            Self::Auth { details, .. } => Some(details),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Self::Syntax {
            position: err.position(),
            message: err.to_string(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
