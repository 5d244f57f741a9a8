//! Core identifiers and item descriptors.
//!
//! Pure data types with no I/O dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier of an asynchronous job.
///
/// The backend hands these out when a download is prepared or an upload
/// slot is reserved. The same id is used for the bucket transfer and for
/// the status task that replaces it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a task ID from the backend's identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What kind of work a queue entry tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    /// Server-side preparation of a download.
    Download,
    /// Server-side registration of an uploaded file.
    Upload,
    /// Direct binary transfer to a pre-signed bucket URL.
    ///
    /// Never persisted: the payload cannot survive a restart.
    UploadToBucket,
}

impl ItemKind {
    /// String form used in the persisted schema and in events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Upload => "upload",
            Self::UploadToBucket => "upload-to-bucket",
        }
    }

    /// Whether entries of this kind may be written to the persisted snapshot.
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        !matches!(self, Self::UploadToBucket)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of the file a task operates on.
///
/// Serialized as `{path, root?, type}` so persisted snapshots stay readable
/// by older clients.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskItem {
    /// Remote path of the file.
    pub path: String,
    /// Directory the file was uploaded into, for uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Kind of work.
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

impl TaskItem {
    /// Descriptor for a download of `path`.
    pub fn download(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root: None,
            kind: ItemKind::Download,
        }
    }

    /// Descriptor for the server-side part of an upload.
    pub fn upload(path: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root: Some(root.into()),
            kind: ItemKind::Upload,
        }
    }

    /// Descriptor for the bucket transfer part of an upload.
    pub fn upload_to_bucket(path: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root: Some(root.into()),
            kind: ItemKind::UploadToBucket,
        }
    }

    /// Same item with a different kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }
}
