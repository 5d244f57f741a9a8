//! Bucket transfer port.
//!
//! A transfer is a single PUT of raw bytes to a pre-signed URL. It knows
//! nothing about polling or the task queue.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::task::{BackendError, UploadTarget};

/// Progress callback: `(bytes_sent, bytes_total)`.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Bytes to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPayload {
    /// Stream the contents of a local file.
    File(PathBuf),
    /// Send an in-memory buffer.
    Memory(Vec<u8>),
}

/// A single transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Pre-signed destination URL.
    pub url: String,
    /// Payload.
    pub payload: TransferPayload,
    /// Sent as `x-amz-tagging` when present.
    pub tag_value: Option<String>,
    /// Sent as `x-amz-acl` when present.
    pub canned_acl_value: Option<String>,
}

impl TransferRequest {
    /// Build a request for `payload` from an upload target.
    pub fn new(target: &UploadTarget, payload: TransferPayload) -> Self {
        Self {
            url: target.url.clone(),
            payload,
            tag_value: target.tag_value.clone(),
            canned_acl_value: target.canned_acl_value.clone(),
        }
    }

    /// Extra headers to attach, only those that were provided.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers = Vec::new();
        if let Some(tag) = self.tag_value.as_deref() {
            headers.push(("x-amz-tagging", tag));
        }
        if let Some(acl) = self.canned_acl_value.as_deref() {
            headers.push(("x-amz-acl", acl));
        }
        headers
    }
}

/// Port for the binary transport.
#[async_trait]
pub trait TransferPort: Send + Sync {
    /// Send the payload.
    ///
    /// `progress` is called as bytes go out. When `cancel` fires the
    /// attempt is aborted and `BackendError::Cancelled` returned.
    async fn put(
        &self,
        request: &TransferRequest,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<(), BackendError>;
}
