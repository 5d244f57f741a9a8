//! Task queue state.
//!
//! A pure ordered container of queue entries. No I/O is performed here;
//! the `TaskManager` handles locking, persistence and events.
//!
//! # Design
//!
//! - Insertion order is preserved (oldest first)
//! - No two entries share an id
//! - Removal is by identity; `remove_id` is the id-based convenience

mod types;

use std::sync::Arc;

use fsb_core::{PersistedQueue, TaskError, TaskId, TaskSummary};

pub use types::QueueEntry;

use crate::poller::StatusTask;

/// Ordered queue of status tasks and transfers.
///
/// This is a sync type with no internal locking; the caller
/// (`TaskManager`) is responsible for synchronization.
#[derive(Debug, Default)]
pub struct TaskQueue {
    entries: Vec<QueueEntry>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Append an entry. Fails if an entry with the same id is queued.
    pub fn push(&mut self, entry: QueueEntry) -> Result<(), TaskError> {
        if self.contains_id(entry.id()) {
            return Err(TaskError::already_queued(entry.id().as_str()));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove `entry` by identity. Returns whether it was queued.
    pub fn remove(&mut self, entry: &QueueEntry) -> bool {
        let before = self.entries.len();
        self.entries.retain(|queued| !queued.same_as(entry));
        self.entries.len() != before
    }

    /// Remove the entry with `id`.
    pub fn remove_id(&mut self, id: &TaskId) -> Option<QueueEntry> {
        let index = self.entries.iter().position(|entry| entry.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Put `replacement` where `old` was, keeping its position.
    ///
    /// If `old` is no longer queued (it was cancelled meanwhile) nothing is
    /// inserted and `false` is returned.
    pub fn replace(&mut self, old: &QueueEntry, replacement: QueueEntry) -> bool {
        match self.entries.iter().position(|entry| entry.same_as(old)) {
            Some(index) => {
                self.entries[index] = replacement;
                true
            }
            None => false,
        }
    }

    /// Whether an entry with `id` is queued.
    pub fn contains_id(&self, id: &TaskId) -> bool {
        self.entries.iter().any(|entry| entry.id() == id)
    }

    /// Entry with `id`.
    pub fn get(&self, id: &TaskId) -> Option<&QueueEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Entries whose item path equals `path`.
    pub fn by_path(&self, path: &str) -> Vec<QueueEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.item().path == path)
            .cloned()
            .collect()
    }

    /// All status tasks.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<StatusTask>> {
        self.entries.iter().filter_map(QueueEntry::as_task)
    }

    /// Snapshot to write to storage. Transfers are left out.
    pub fn persisted(&self) -> PersistedQueue {
        PersistedQueue::new(self.entries.iter().filter_map(QueueEntry::persisted).collect())
    }

    /// Summaries in queue order.
    pub fn summaries(&self) -> Vec<TaskSummary> {
        self.entries.iter().map(QueueEntry::summary).collect()
    }
}
