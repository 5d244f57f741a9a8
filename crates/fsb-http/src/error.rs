//! Internal error types for the HTTP adapters.
//!
//! These errors are internal to `fsb-http` and are mapped to
//! [`BackendError`] at the port boundary.

use fsb_core::BackendError;
use thiserror::Error;

/// Result type alias for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors talking to the API or the bucket.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request failed with an HTTP error status.
    #[error("Request failed with status {status}: {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Network or HTTP client error.
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("{0}")]
    JsonParse(#[from] serde_json::Error),

    /// Reading the local payload failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<HttpError> for BackendError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, .. } => {
                Self::transport_with_status(err.to_string(), status)
            }
            HttpError::Network(e) => match e.status() {
                Some(status) => Self::transport_with_status(e.to_string(), status.as_u16()),
                None => Self::transport(e.to_string()),
            },
            HttpError::InvalidUrl(e) => Self::transport(format!("Invalid URL: {e}")),
            HttpError::JsonParse(e) => Self::decode(e.to_string()),
            HttpError::Io(e) => Self::transport(e.to_string()),
        }
    }
}
