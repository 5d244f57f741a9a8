//! Task events - discriminated union for all queue state changes.

use serde::{Deserialize, Serialize};

use super::status::JobStatus;
use super::types::{TaskId, TaskItem};

/// Which runtime object backs a queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A polled server-side job.
    StatusTask,
    /// An in-flight bucket transfer.
    Transfer,
}

/// A summary of one queue entry (for snapshots and API responses).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Job id.
    pub id: TaskId,
    /// What the entry operates on.
    pub item: TaskItem,
    /// Backing object.
    pub entry: EntryKind,
    /// Last polled job status (status tasks only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    /// Transfer progress in `[0, 1]` (transfers only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// Error message if the last request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Download URL once a download job succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Created in this session rather than restored from storage.
    pub active_session: bool,
}

impl TaskSummary {
    /// Whether the entry still has work in progress.
    pub fn is_running(&self) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.entry {
            EntryKind::StatusTask => self.status.is_none_or(|s| s.is_running()),
            EntryKind::Transfer => self.percent.is_none_or(|p| p < 1.0),
        }
    }
}

/// Single discriminated union for all task events.
///
/// ```typescript
/// type TaskEvent =
///   | { type: "queue_snapshot"; items: TaskSummary[] }
///   | { type: "status_changed"; id: string; status: JobStatus }
///   | { type: "transfer_progress"; id: string; percent: number }
///   | { type: "task_finished"; id: string; item: TaskItem; status: JobStatus; ... }
///   | { type: "save_triggered"; id: string; url: string }
///   | { type: "save_finished"; id: string; url: string; error?: string };
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// The queue changed; full ordered state, oldest first.
    QueueSnapshot {
        /// All entries currently in the queue.
        items: Vec<TaskSummary>,
    },

    /// A status poll succeeded.
    StatusChanged {
        /// Job id.
        id: TaskId,
        /// Polled status.
        status: JobStatus,
    },

    /// Bucket transfer progress.
    TransferProgress {
        /// Job id of the upload.
        id: TaskId,
        /// Fraction sent, `0.0 ..= 1.0`.
        percent: f64,
    },

    /// A status task reached a terminal state.
    TaskFinished {
        /// Job id.
        id: TaskId,
        /// What the job operated on.
        item: TaskItem,
        /// Terminal status.
        status: JobStatus,
        /// Download URL for successful downloads.
        #[serde(skip_serializing_if = "Option::is_none")]
        download_url: Option<String>,
        /// Error message if the final poll failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A finished download was handed to the file saver.
    SaveTriggered {
        /// Job id.
        id: TaskId,
        /// URL being saved.
        url: String,
    },

    /// The file saver returned.
    SaveFinished {
        /// Job id.
        id: TaskId,
        /// URL that was saved.
        url: String,
        /// Why saving failed; absent on success.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl TaskEvent {
    /// Create a status-changed event.
    pub fn status_changed(id: impl Into<TaskId>, status: JobStatus) -> Self {
        Self::StatusChanged {
            id: id.into(),
            status,
        }
    }

    /// Create a transfer-progress event, clamping `percent` to `[0, 1]`.
    pub fn transfer_progress(id: impl Into<TaskId>, percent: f64) -> Self {
        Self::TransferProgress {
            id: id.into(),
            percent: percent.clamp(0.0, 1.0),
        }
    }

    /// Get the job id this event refers to, if any.
    pub const fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::QueueSnapshot { .. } => None,
            Self::StatusChanged { id, .. }
            | Self::TransferProgress { id, .. }
            | Self::TaskFinished { id, .. }
            | Self::SaveTriggered { id, .. }
            | Self::SaveFinished { id, .. } => Some(id),
        }
    }

    /// Get the event name for transport adapters.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::QueueSnapshot { .. } => "task:queue_snapshot",
            Self::StatusChanged { .. } => "task:status_changed",
            Self::TransferProgress { .. } => "task:transfer_progress",
            Self::TaskFinished { .. } => "task:finished",
            Self::SaveTriggered { .. } => "task:save_triggered",
            Self::SaveFinished { .. } => "task:save_finished",
        }
    }
}
