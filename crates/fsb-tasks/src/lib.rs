#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod manager;
pub mod poller;
pub mod progress;
pub mod queue;
pub mod resource;
pub mod transfer;

pub use manager::{
    Completion, DEFAULT_POLL_INTERVAL, DEFAULT_PROGRESS_INTERVAL, TaskManager, TaskManagerConfig,
    TaskManagerDeps, build_task_manager,
};
pub use poller::{FinishHook, PollPhase, StatusSource, StatusTask};
pub use queue::{QueueEntry, TaskQueue};
pub use resource::{RemoteResource, ResourceSource, ResourceState};
pub use transfer::{BucketTransfer, TransferSource};

// Silence unused dev-dependency warnings (used by integration tests)
#[cfg(test)]
use fsb_store as _;
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use serde_json as _;
