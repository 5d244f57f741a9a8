//! The `{status, payload, message}` response envelope.

use fsb_core::{BackendError, TaskId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

const OK: &str = "OK";
const UNAUTHENTICATED: &str = "UNAUTHENTICATED";

/// Every API response is wrapped in one of these.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    /// Whether the server accepted the request.
    pub fn is_ok(&self) -> bool {
        self.status == OK
    }

    /// Check the status, discarding any payload.
    pub fn into_unit(self) -> Result<(), BackendError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    /// Check the status and decode the payload.
    ///
    /// A missing payload decodes as `null`.
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T, BackendError> {
        if !self.is_ok() {
            return Err(self.into_error());
        }
        let payload = self.payload.unwrap_or(Value::Null);
        serde_json::from_value(payload).map_err(|e| BackendError::decode(e.to_string()))
    }

    fn into_error(self) -> BackendError {
        if self.status == UNAUTHENTICATED {
            return BackendError::Unauthenticated;
        }
        match self.message {
            Some(message) if !message.is_empty() => BackendError::rejected(message),
            _ => BackendError::rejected(format!("Request failed: {}", self.status)),
        }
    }
}

/// Payload of `/download/:path`.
#[derive(Debug, Deserialize)]
pub struct DownloadPayload {
    pub task: TaskId,
}
