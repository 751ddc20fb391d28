//! Client error types.

use thiserror::Error;

/// A result type using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by backend calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect, TLS, I/O).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Backend-provided detail, or the status reason.
        message: String,
    },

    /// The base URL and path did not form a valid request URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ClientError {
    /// Returns `true` for transport failures, `false` for protocol failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// HTTP status of the failed call, if the backend answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(_) | Self::InvalidUrl(_) | Self::Parse(_) => None,
        }
    }
}
