//! Backend port definition.
//!
//! One method per job endpoint of the file-browser API. Implementations
//! unwrap the `{status, payload}` envelope and map a non-`OK` status to
//! [`BackendError`].

use async_trait::async_trait;

use crate::task::{BackendError, StatusReport, TaskId, UploadSlot};

/// Port for the job endpoints of the backend.
///
/// # Usage
///
/// ```ignore
/// let backend: Arc<dyn BackendPort> = /* ... */;
/// let id = backend.request_download("/data/file.txt").await?;
/// let report = backend.status(&id).await?;
/// ```
#[async_trait]
pub trait BackendPort: Send + Sync {
    /// Ask the server to prepare `path` for download (`/download/:path`).
    async fn request_download(&self, path: &str) -> Result<TaskId, BackendError>;

    /// Reserve an upload slot for `path` (`/upload-url/:path`).
    async fn request_upload_slot(&self, path: &str) -> Result<UploadSlot, BackendError>;

    /// Poll a job (`/status/:id`).
    async fn status(&self, id: &TaskId) -> Result<StatusReport, BackendError>;

    /// Tell the server the bucket transfer finished (`/upload/:id`).
    async fn confirm_upload(&self, id: &TaskId) -> Result<(), BackendError>;

    /// Ask the server to cancel a job (`/cancel/:id`).
    async fn cancel(&self, id: &TaskId) -> Result<(), BackendError>;
}
