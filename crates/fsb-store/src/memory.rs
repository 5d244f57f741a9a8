//! In-memory task store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use fsb_core::{PersistedQueue, RepositoryError, TaskStateRepositoryPort};

/// Raw JSON strings keyed by storage key.
///
/// Values are kept as text, the way a browser keeps them in
/// `localStorage`, so tests can seed and inspect the exact stored form.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored text under `key`.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Store raw text under `key`.
    pub fn set_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.lock().insert(key.into(), raw.into());
    }

    /// Decoded snapshot under `key`, `None` if absent or unreadable.
    pub fn snapshot(&self, key: &str) -> Option<PersistedQueue> {
        PersistedQueue::decode(&self.get_raw(key)?).ok()
    }

    /// Stored keys.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TaskStateRepositoryPort for MemoryTaskStore {
    async fn load(&self, key: &str) -> Result<Option<PersistedQueue>, RepositoryError> {
        match self.get_raw(key) {
            Some(raw) => Ok(Some(PersistedQueue::decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, queue: &PersistedQueue) -> Result<(), RepositoryError> {
        let raw = queue.encode()?;
        self.set_raw(key, raw);
        Ok(())
    }
}
