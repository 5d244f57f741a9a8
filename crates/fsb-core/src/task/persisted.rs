//! Persisted queue schema.
//!
//! Only `{id, item}` pairs are written. Status, progress and session flags
//! are runtime state and are rebuilt by polling after a restart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{TaskId, TaskItem};

/// Current schema version written by [`PersistedQueue::encode`].
pub const SCHEMA_VERSION: u32 = 1;

/// Prefix shared by every storage key.
pub const STORAGE_KEY_PREFIX: &str = "fsb.tasks:";

/// Storage key for a manager scoped to `scope` (the current page path).
pub fn storage_key(scope: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}{scope}")
}

/// One persisted queue entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTask {
    /// Job id.
    pub id: TaskId,
    /// What the job operates on.
    pub item: TaskItem,
}

impl PersistedTask {
    /// Create a persisted entry.
    pub const fn new(id: TaskId, item: TaskItem) -> Self {
        Self { id, item }
    }
}

/// Versioned snapshot of the persistable part of the queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedQueue {
    /// Schema version.
    pub version: u32,
    /// Entries, oldest first.
    pub tasks: Vec<PersistedTask>,
}

impl Default for PersistedQueue {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Errors decoding a stored snapshot.
#[derive(Debug, Error)]
pub enum SnapshotDecodeError {
    /// The stored text is not a snapshot in any known layout.
    #[error("malformed task snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The snapshot was written by a newer schema.
    #[error("unsupported task snapshot version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLayout {
    Versioned(PersistedQueue),
    Legacy(Vec<PersistedTask>),
}

impl PersistedQueue {
    /// Snapshot at the current schema version.
    ///
    /// Entries whose kind is not persistable are dropped.
    pub fn new(tasks: Vec<PersistedTask>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            tasks: tasks
                .into_iter()
                .filter(|task| task.item.kind.is_persistable())
                .collect(),
        }
    }

    /// Whether the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Serialize to the stored JSON form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the stored JSON form.
    ///
    /// A bare JSON array of `{id, item}` is accepted as version 1.
    pub fn decode(raw: &str) -> Result<Self, SnapshotDecodeError> {
        match serde_json::from_str::<StoredLayout>(raw)? {
            StoredLayout::Versioned(queue) if queue.version > SCHEMA_VERSION => {
                Err(SnapshotDecodeError::UnsupportedVersion(queue.version))
            }
            StoredLayout::Versioned(queue) => Ok(Self::new(queue.tasks)),
            StoredLayout::Legacy(tasks) => Ok(Self::new(tasks)),
        }
    }
}
