//! Task manager configuration.

use std::time::Duration;

/// Default delay between two status polls of the same task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Default minimum interval between two transfer progress events.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the task manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskManagerConfig {
    /// Delay between two status polls of the same task.
    pub poll_interval: Duration,
    /// Storage scope (the path the manager was opened for).
    pub scope: String,
    /// Minimum interval between two `TransferProgress` events.
    pub progress_interval: Duration,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            scope: "/".to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl TaskManagerConfig {
    /// Create a config for the given storage scope.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..Default::default()
        }
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the progress event interval.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Storage key of the persisted queue.
    pub fn storage_key(&self) -> String {
        fsb_core::storage_key(&self.scope)
    }
}
