//! Task domain types, events, errors, and the persisted schema.
//!
//! This module contains pure data types. No I/O, networking, or runtime
//! dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Identifiers and item descriptors (`TaskId`, `TaskItem`, `ItemKind`)
//! - `status` - Backend job status (`JobStatus`, `StatusReport`, `UploadSlot`)
//! - `events` - Queue events and summaries (`TaskEvent`, `TaskSummary`)
//! - `errors` - Error types for backend and manager operations
//! - `persisted` - Versioned queue snapshot written to storage

pub mod errors;
pub mod events;
pub mod persisted;
pub mod status;
pub mod types;

// Re-export commonly used types
pub use errors::{BackendError, TaskError};
pub use events::{EntryKind, TaskEvent, TaskSummary};
pub use persisted::{
    PersistedQueue, PersistedTask, SCHEMA_VERSION, STORAGE_KEY_PREFIX, SnapshotDecodeError,
    storage_key,
};
pub use status::{JobStatus, StatusReport, UploadSlot, UploadTarget};
pub use types::{ItemKind, TaskId, TaskItem};
