//! Task state repository port definition.
//!
//! This port defines the interface for persisting the task queue so that
//! polling can resume after a restart.
//!
//! # Design
//!
//! - Whole-snapshot writes: the manager rewrites the snapshot after every
//!   queue mutation, so storage never holds a partial state
//! - Keyed by scope (see [`crate::task::storage_key`]), one snapshot per key
//! - Only `{id, item}` pairs are stored; status is re-polled

use async_trait::async_trait;

use super::RepositoryError;
use crate::task::PersistedQueue;

/// Port for persisting the task queue.
///
/// # Usage
///
/// ```ignore
/// let repo: Arc<dyn TaskStateRepositoryPort> = /* ... */;
/// repo.save(&key, &snapshot).await?;
/// let restored = repo.load(&key).await?;
/// ```
#[async_trait]
pub trait TaskStateRepositoryPort: Send + Sync {
    /// Load the snapshot stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing was ever stored.
    async fn load(&self, key: &str) -> Result<Option<PersistedQueue>, RepositoryError>;

    /// Replace the snapshot stored under `key`.
    async fn save(&self, key: &str, queue: &PersistedQueue) -> Result<(), RepositoryError>;
}
