//! Task event emitter port.
//!
//! This port abstracts task event emission, allowing the task manager to
//! publish queue changes without coupling to transport details (channels,
//! terminal rendering, IPC).

use tokio::sync::broadcast;

use crate::task::TaskEvent;

/// Port for emitting task events.
///
/// # Example
///
/// ```ignore
/// fn on_poll(&self, emitter: &dyn TaskEventEmitterPort) {
///     emitter.emit(TaskEvent::status_changed(id, status));
/// }
/// ```
pub trait TaskEventEmitterPort: Send + Sync {
    /// Emit a task event.
    ///
    /// Implementations should handle the event asynchronously or buffer it.
    /// This method should not block.
    fn emit(&self, event: TaskEvent);

    /// Clone this emitter into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn TaskEventEmitterPort>` without
    /// requiring the underlying type to implement Clone.
    fn clone_box(&self) -> Box<dyn TaskEventEmitterPort>;
}

/// A no-op task event emitter for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopTaskEmitter;

impl NoopTaskEmitter {
    /// Create a new no-op task emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TaskEventEmitterPort for NoopTaskEmitter {
    fn emit(&self, _event: TaskEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn TaskEventEmitterPort> {
        Box::new(self.clone())
    }
}

/// Broadcast emitter: every subscriber receives every event.
///
/// Slow subscribers may miss events if the buffer overflows; the next
/// `QueueSnapshot` carries the full state again.
#[derive(Debug, Clone)]
pub struct BroadcastTaskEmitter {
    sender: broadcast::Sender<TaskEvent>,
}

impl BroadcastTaskEmitter {
    /// Create a broadcaster with the specified channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a broadcaster with default capacity (256 events).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(256)
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastTaskEmitter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TaskEventEmitterPort for BroadcastTaskEmitter {
    fn emit(&self, event: TaskEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    fn clone_box(&self) -> Box<dyn TaskEventEmitterPort> {
        Box::new(self.clone())
    }
}
