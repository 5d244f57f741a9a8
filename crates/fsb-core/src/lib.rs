#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod ports;
pub mod task;

// Re-export commonly used types for convenience
pub use ports::{
    BackendPort, BroadcastTaskEmitter, FileSaverPort, NoopTaskEmitter, ProgressCallback,
    RepositoryError, SaveError, TaskEventEmitterPort, TaskStateRepositoryPort, TransferPayload,
    TransferPort, TransferRequest,
};
pub use task::{
    BackendError, EntryKind, ItemKind, JobStatus, PersistedQueue, PersistedTask,
    SnapshotDecodeError, StatusReport, TaskError, TaskEvent, TaskId, TaskItem, TaskSummary,
    UploadSlot, UploadTarget, storage_key,
};
