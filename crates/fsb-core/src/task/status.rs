//! Job status reports and upload slots as returned by the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::TaskId;

/// Status of a server-side job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted but not started.
    #[default]
    Pending,
    /// In progress.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Failure,
    /// Cancelled before finishing.
    Cancelled,
}

impl JobStatus {
    /// Whether the job still needs polling.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Whether no further polling will happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.is_running()
    }

    /// String form used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /status/:id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Current job status.
    pub status: JobStatus,
    /// Job result, present once the job reaches a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl StatusReport {
    /// Create a report with no result payload.
    #[must_use]
    pub const fn new(status: JobStatus) -> Self {
        Self {
            status,
            result: None,
        }
    }

    /// Attach a result payload.
    #[must_use]
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Extract a download URL from the result payload.
    ///
    /// Accepts either `{"url": "..."}` or a bare string result.
    pub fn download_url(&self) -> Option<&str> {
        let url = match self.result.as_ref()? {
            Value::String(url) => Some(url.as_str()),
            Value::Object(map) => map.get("url").and_then(Value::as_str),
            _ => None,
        };
        url.filter(|url| !url.is_empty())
    }
}

/// Pre-signed destination of a bucket transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    /// Pre-signed PUT URL.
    pub url: String,
    /// Value for the `x-amz-tagging` header.
    #[serde(
        default,
        rename = "tagValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub tag_value: Option<String>,
    /// Value for the `x-amz-acl` header.
    #[serde(
        default,
        rename = "cannedACLValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub canned_acl_value: Option<String>,
}

/// Body of the upload-slot request: a job id plus where to send the bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    /// Job id that will track the upload once registered.
    pub task: TaskId,
    /// Transfer destination.
    pub url: UploadTarget,
}
