//! What happens to a status task once it reaches a terminal status.

use fsb_core::{ItemKind, JobStatus};

use crate::poller::StatusTask;

/// Outcome of a finished task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Remove the task and save the prepared file behind the URL.
    Save(String),
    /// Remove the task; the uploaded file is now part of its directory.
    Dismiss,
    /// Leave the task in the queue until the user dismisses it.
    Keep,
}

/// Decide what to do with a task that finished with `status`.
///
/// Only downloads requested in this session are saved automatically.
/// Restored downloads stay queued for a manual download.
pub fn decide(
    kind: ItemKind,
    status: JobStatus,
    active_session: bool,
    download_url: Option<&str>,
) -> Completion {
    match (kind, status, download_url) {
        (ItemKind::Download, JobStatus::Success, Some(url)) if active_session => {
            Completion::Save(url.to_string())
        }
        (ItemKind::Upload, JobStatus::Success, _) => Completion::Dismiss,
        _ => Completion::Keep,
    }
}

/// [`decide`] for a finished task.
pub fn decide_for(task: &StatusTask) -> Completion {
    decide(
        task.item().kind,
        task.status(),
        task.active_session(),
        task.download_url().as_deref(),
    )
}
