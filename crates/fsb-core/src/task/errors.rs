//! Task error types.
//!
//! These errors are designed to be serializable and cloneable so they can be
//! stored in resource state, shared between awaiters of a single in-flight
//! request and forwarded to UIs unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error talking to the backend or to the bucket transport.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum BackendError {
    /// Network failure or non-2xx HTTP status.
    #[error("Network error: {message}")]
    Transport {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The backend answered with a non-`OK` envelope.
    #[error("{message}")]
    Rejected {
        /// Message from the envelope.
        message: String,
    },

    /// The backend reported that the session is not authenticated.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The response body could not be decoded.
    #[error("Invalid response: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// The request was aborted locally.
    #[error("cancelled")]
    Cancelled,
}

impl BackendError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a transport error with HTTP status code.
    pub fn transport_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Transport {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a rejected-envelope error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Check if retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { status_code, .. } => match status_code {
                Some(code) => *code >= 500,
                None => true,
            },
            _ => false,
        }
    }

    /// Check if this is a local abort.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error returned by task manager operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskError {
    /// Phase 1 of an upload or a download request failed.
    #[error("{0}")]
    Backend(BackendError),

    /// The bucket transfer failed or was aborted.
    #[error("Upload to bucket failed: {message}")]
    Transfer {
        /// Transfer error message.
        message: String,
    },

    /// The backend refused to register an uploaded file.
    #[error("Upload registration failed: {message}")]
    Registration {
        /// Registration error message.
        message: String,
    },

    /// A task with the same id is already queued.
    #[error("Already queued: {id}")]
    AlreadyQueued {
        /// The duplicated id.
        id: String,
    },

    /// No queue entry matched.
    #[error("Not in queue: {id}")]
    NotInQueue {
        /// The missing id.
        id: String,
    },

    /// The entry has no prepared file to save.
    #[error("No file ready for {id}")]
    NotReady {
        /// The entry's id.
        id: String,
    },

    /// Saving a prepared file failed.
    #[error("Save failed: {message}")]
    Save {
        /// Saver error message.
        message: String,
    },
}

impl TaskError {
    /// Create a transfer error.
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    /// Create a registration error.
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }

    /// Create an already-queued error.
    pub fn already_queued(id: impl Into<String>) -> Self {
        Self::AlreadyQueued { id: id.into() }
    }

    /// Create a not-in-queue error.
    pub fn not_in_queue(id: impl Into<String>) -> Self {
        Self::NotInQueue { id: id.into() }
    }

    /// Create a not-ready error.
    pub fn not_ready(id: impl Into<String>) -> Self {
        Self::NotReady { id: id.into() }
    }

    /// Create a save error.
    pub fn save(message: impl Into<String>) -> Self {
        Self::Save {
            message: message.into(),
        }
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(BackendError::Unauthenticated) => {
                "Your session has expired. Sign in again.".to_string()
            }
            Self::Backend(BackendError::Transport {
                message,
                status_code: Some(code),
            }) => format!("Server error (HTTP {code}): {message}"),
            Self::Backend(err) => err.to_string(),
            Self::Transfer { message } if message == "cancelled" => {
                "Upload was cancelled.".to_string()
            }
            Self::Transfer { message } => format!("Upload failed: {message}"),
            Self::Registration { message } => {
                format!("The file was uploaded but could not be registered: {message}")
            }
            Self::AlreadyQueued { id } => format!("Task '{id}' is already in the queue."),
            Self::NotInQueue { id } => format!("Task '{id}' is not in the queue."),
            Self::NotReady { id } => {
                format!("Task '{id}' is not a finished download with a file to save.")
            }
            Self::Save { message } => format!("The file could not be saved: {message}"),
        }
    }
}

impl From<BackendError> for TaskError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(BackendError::transport("connection reset").is_transient());
        assert!(BackendError::transport_with_status("bad gateway", 502).is_transient());
        assert!(!BackendError::transport_with_status("forbidden", 403).is_transient());
        assert!(!BackendError::rejected("no such file").is_transient());
        assert!(!BackendError::Unauthenticated.is_transient());
    }

    #[test]
    fn test_rejected_message_is_verbatim() {
        let err = BackendError::rejected("Path does not exist");
        assert_eq!(err.to_string(), "Path does not exist");
    }

    #[test]
    fn test_error_serialization() {
        let err = TaskError::Backend(BackendError::transport_with_status("timeout", 504));
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("504"));

        let parsed: TaskError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_user_messages() {
        let err = TaskError::from(BackendError::Unauthenticated);
        assert!(err.user_message().contains("Sign in"));

        let err = TaskError::transfer("cancelled");
        assert_eq!(err.user_message(), "Upload was cancelled.");
    }
}
