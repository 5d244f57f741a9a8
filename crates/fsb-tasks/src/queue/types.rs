//! Queue entry type (internal implementation).
//!
//! For API responses, use `TaskSummary` from `fsb_core`.

use std::sync::Arc;

use fsb_core::{PersistedTask, TaskId, TaskItem, TaskSummary};

use crate::poller::StatusTask;
use crate::transfer::BucketTransfer;

/// One entry of the task queue.
///
/// Entries are compared by identity (`Arc::ptr_eq`), not by id: a transfer
/// and the status task that replaces it share the same job id.
#[derive(Clone, Debug)]
pub enum QueueEntry {
    /// A polled server-side job.
    Task(Arc<StatusTask>),
    /// An in-flight bucket transfer.
    Transfer(Arc<BucketTransfer>),
}

impl QueueEntry {
    /// Job id.
    pub fn id(&self) -> &TaskId {
        match self {
            Self::Task(task) => task.id(),
            Self::Transfer(transfer) => transfer.id(),
        }
    }

    /// Item descriptor.
    pub fn item(&self) -> &TaskItem {
        match self {
            Self::Task(task) => task.item(),
            Self::Transfer(transfer) => transfer.item(),
        }
    }

    /// The status task, if this entry is one.
    pub const fn as_task(&self) -> Option<&Arc<StatusTask>> {
        match self {
            Self::Task(task) => Some(task),
            Self::Transfer(_) => None,
        }
    }

    /// The transfer, if this entry is one.
    pub const fn as_transfer(&self) -> Option<&Arc<BucketTransfer>> {
        match self {
            Self::Transfer(transfer) => Some(transfer),
            Self::Task(_) => None,
        }
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Task(a), Self::Task(b)) => Arc::ptr_eq(a, b),
            (Self::Transfer(a), Self::Transfer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Snapshot summary.
    pub fn summary(&self) -> TaskSummary {
        match self {
            Self::Task(task) => task.summary(),
            Self::Transfer(transfer) => transfer.summary(),
        }
    }

    /// Persisted form, `None` for entries that cannot survive a restart.
    pub fn persisted(&self) -> Option<PersistedTask> {
        let item = self.item();
        item.kind
            .is_persistable()
            .then(|| PersistedTask::new(self.id().clone(), item.clone()))
    }
}

impl From<Arc<StatusTask>> for QueueEntry {
    fn from(task: Arc<StatusTask>) -> Self {
        Self::Task(task)
    }
}

impl From<Arc<BucketTransfer>> for QueueEntry {
    fn from(transfer: Arc<BucketTransfer>) -> Self {
        Self::Transfer(transfer)
    }
}
