//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the task manager expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` types in any signature
//! - No storage implementation details (files, key/value stores)
//! - Intent-based methods, one per backend endpoint

pub mod backend;
pub mod event_emitter;
pub mod file_saver;
pub mod task_state;
pub mod transfer;

use thiserror::Error;

pub use backend::BackendPort;
pub use event_emitter::{BroadcastTaskEmitter, NoopTaskEmitter, TaskEventEmitterPort};
pub use file_saver::{FileSaverPort, SaveError};
pub use task_state::TaskStateRepositoryPort;
pub use transfer::{ProgressCallback, TransferPayload, TransferPort, TransferRequest};

/// Domain-specific errors for persistence operations.
///
/// This error type abstracts away storage implementation details and
/// provides a clean interface for the manager to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage backend error (filesystem, key/value store, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<crate::task::SnapshotDecodeError> for RepositoryError {
    fn from(err: crate::task::SnapshotDecodeError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
