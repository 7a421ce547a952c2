//! Errors from talking to the backend.

use thiserror::Error;

/// Backend call failure.
///
/// The `Display` text is what ends up in front of the user, so variants keep
/// it short.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (connect, TLS, body decode).
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("timeout")]
    Timeout,

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Base URL cannot carry path segments (e.g. `mailto:`).
    #[error("Base URL cannot be used for API paths: {0}")]
    UnusableBaseUrl(String),

    /// Backend answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Backend-supplied detail, or the raw body.
        message: String,
    },
}

impl BackendError {
    /// Classify a reqwest error, pulling timeouts out as their own variant.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Result type alias for backend calls.
pub type Result<T> = std::result::Result<T, BackendError>;
