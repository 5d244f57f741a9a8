//! Status polling for server-side jobs.
//!
//! A `StatusTask` wraps a job id and polls `/status/:id` until the job
//! reaches a terminal status.
//!
//! ```text
//! CREATED --start--> fetch --(pending|running)--> sleep(poll_interval) --> fetch ...
//!                      |
//!                      +--(success|failure|cancelled|fetch error)--> hook --> FINISHED
//! ```
//!
//! # Invariants
//!
//! - One polling loop per task: `start` is idempotent
//! - Polls are strictly sequential; the next sleep starts after the
//!   previous fetch resolved
//! - The completion hook is an `FnOnce` moved into the loop, so it runs at
//!   most once, and only on a terminal status
//! - A failed status fetch is terminal and reported as `Failure`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fsb_core::{
    BackendError, BackendPort, EntryKind, ItemKind, JobStatus, StatusReport, TaskEvent,
    TaskEventEmitterPort, TaskId, TaskItem, TaskSummary,
};

use crate::resource::{RemoteResource, ResourceSource, ResourceState};

/// Runs once when a task reaches a terminal status.
pub type FinishHook = Box<dyn FnOnce(Arc<StatusTask>) -> BoxFuture<'static, ()> + Send>;

/// Where the polling loop is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollPhase {
    /// Not started.
    Idle,
    /// Polling.
    Polling,
    /// Reached a terminal status; hook has run.
    Finished(JobStatus),
    /// Stopped locally before reaching a terminal status.
    Stopped,
}

/// Loads `/status/:id`.
pub struct StatusSource {
    backend: Arc<dyn BackendPort>,
    id: TaskId,
}

#[async_trait]
impl ResourceSource for StatusSource {
    type Value = StatusReport;

    async fn load(&self) -> Result<StatusReport, BackendError> {
        self.backend.status(&self.id).await
    }

    fn url(&self) -> String {
        format!("/status/{}", self.id)
    }
}

/// Client-side handle of a server-side job.
pub struct StatusTask {
    id: TaskId,
    item: TaskItem,
    active_session: bool,
    poll_interval: Duration,
    resource: RemoteResource<StatusSource>,
    emitter: Arc<dyn TaskEventEmitterPort>,
    download_url: Mutex<Option<String>>,
    phase: watch::Sender<PollPhase>,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl StatusTask {
    /// Create a task handle. Polling starts with [`StatusTask::start`].
    ///
    /// `active_session` is true for tasks created by a user action in this
    /// process and false for tasks restored from storage.
    pub fn new(
        id: TaskId,
        item: TaskItem,
        active_session: bool,
        backend: Arc<dyn BackendPort>,
        emitter: Arc<dyn TaskEventEmitterPort>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let (phase, _) = watch::channel(PollPhase::Idle);
        Arc::new(Self {
            resource: RemoteResource::new(StatusSource {
                backend,
                id: id.clone(),
            }),
            id,
            item,
            active_session,
            poll_interval,
            emitter,
            download_url: Mutex::new(None),
            phase,
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        })
    }

    /// Job id.
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// What the job operates on.
    pub const fn item(&self) -> &TaskItem {
        &self.item
    }

    /// Created in this session rather than restored from storage.
    pub const fn active_session(&self) -> bool {
        self.active_session
    }

    /// Status resource state.
    pub fn state(&self) -> ResourceState<StatusReport> {
        self.resource.state()
    }

    /// Subscribe to status resource changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<StatusReport>> {
        self.resource.subscribe()
    }

    /// Number of status requests issued so far.
    pub fn poll_count(&self) -> u64 {
        self.resource.load_count()
    }

    /// Current polling phase.
    pub fn phase(&self) -> PollPhase {
        *self.phase.borrow()
    }

    /// Error message of the last status request, if it failed.
    pub fn error(&self) -> Option<String> {
        self.resource.state().error
    }

    /// Effective job status. A failed status request counts as `Failure`.
    pub fn status(&self) -> JobStatus {
        Self::status_of(&self.resource.state())
    }

    /// Whether the job still needs polling.
    pub fn is_running(&self) -> bool {
        self.status().is_running()
    }

    /// Download URL, set once a download job succeeded.
    pub fn download_url(&self) -> Option<String> {
        self.download_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Start polling. Later calls are no-ops and return `None`.
    pub fn start(self: &Arc<Self>, on_finished: Option<FinishHook>) -> Option<JoinHandle<()>> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        self.phase.send_replace(PollPhase::Polling);
        let task = Arc::clone(self);
        Some(tokio::spawn(async move { task.run(on_finished).await }))
    }

    /// Stop polling without contacting the backend.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait until polling ends.
    ///
    /// Returns the terminal status, or `None` if the task was stopped first
    /// or [`StatusTask::start`] has not been called yet.
    pub async fn wait_finished(&self) -> Option<JobStatus> {
        let mut phase = self.phase.subscribe();
        let ended = phase
            .wait_for(|p| match p {
                PollPhase::Idle => !self.started.load(Ordering::SeqCst),
                PollPhase::Polling => false,
                PollPhase::Finished(_) | PollPhase::Stopped => true,
            })
            .await
            .map(|p| *p);
        match ended {
            Ok(PollPhase::Finished(status)) => Some(status),
            _ => None,
        }
    }

    /// Summary for queue snapshots.
    pub fn summary(&self) -> TaskSummary {
        let state = self.resource.state();
        TaskSummary {
            id: self.id.clone(),
            item: self.item.clone(),
            entry: EntryKind::StatusTask,
            status: Some(Self::status_of(&state)),
            percent: None,
            error: state.error,
            download_url: self.download_url(),
            active_session: self.active_session,
        }
    }

    fn status_of(state: &ResourceState<StatusReport>) -> JobStatus {
        if state.error.is_some() {
            JobStatus::Failure
        } else {
            state.value.status
        }
    }

    async fn run(self: Arc<Self>, on_finished: Option<FinishHook>) {
        loop {
            let state = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return self.mark_stopped(),
                state = self.resource.fetch() => state,
            };

            if state.error.is_none() {
                self.emitter
                    .emit(TaskEvent::status_changed(self.id.clone(), state.value.status));
            }

            if Self::status_of(&state).is_terminal() {
                self.finish(&state, on_finished).await;
                return;
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return self.mark_stopped(),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    async fn finish(self: &Arc<Self>, state: &ResourceState<StatusReport>, hook: Option<FinishHook>) {
        let status = Self::status_of(state);

        if self.item.kind == ItemKind::Download && status == JobStatus::Success {
            let url = state.value.download_url().map(str::to_string);
            *self
                .download_url
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = url;
        }

        tracing::debug!(
            id = %self.id,
            status = %status,
            polls = self.poll_count(),
            "Task reached terminal status"
        );

        self.emitter.emit(TaskEvent::TaskFinished {
            id: self.id.clone(),
            item: self.item.clone(),
            status,
            download_url: self.download_url(),
            error: state.error.clone(),
        });

        if let Some(hook) = hook {
            hook(Arc::clone(self)).await;
        }
        self.phase.send_replace(PollPhase::Finished(status));
    }

    fn mark_stopped(&self) {
        tracing::debug!(id = %self.id, "Polling stopped");
        self.phase.send_replace(PollPhase::Stopped);
    }
}

impl std::fmt::Debug for StatusTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusTask")
            .field("id", &self.id)
            .field("item", &self.item)
            .field("active_session", &self.active_session)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
