//! Task manager implementation.
//!
//! The manager owns the queue of status tasks and bucket transfers, persists
//! the queue after every mutation, restores it on construction and sequences
//! the upload pipeline.
//!
//! # Concurrency Model
//!
//! - The queue lives behind a single `tokio::sync::Mutex`; every mutation
//!   writes the snapshot and emits `QueueSnapshot` before the lock is released
//! - Each status task runs its own polling loop; completion hooks hold a
//!   `Weak` reference so a dropped manager does not keep loops alive
//! - Concurrent `upload()` calls proceed independently and only meet at the
//!   queue lock

mod completion;
mod config;

use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use tokio::sync::Mutex;

use fsb_core::{
    BackendPort, FileSaverPort, TaskError, TaskEvent, TaskEventEmitterPort, TaskId, TaskItem,
    TaskStateRepositoryPort, TaskSummary, TransferPayload, TransferPort, TransferRequest,
};

use crate::poller::{FinishHook, StatusTask};
use crate::queue::{QueueEntry, TaskQueue};
use crate::transfer::BucketTransfer;

pub use completion::{Completion, decide};
pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_PROGRESS_INTERVAL, TaskManagerConfig};

/// Dependencies for building a task manager.
pub struct TaskManagerDeps<B, T, R, S, E>
where
    B: BackendPort + 'static,
    T: TransferPort + 'static,
    R: TaskStateRepositoryPort + 'static,
    S: FileSaverPort + 'static,
    E: TaskEventEmitterPort + 'static,
{
    /// Job endpoints of the backend.
    pub backend: Arc<B>,
    /// Binary transport for bucket transfers.
    pub transport: Arc<T>,
    /// Port for persisting the queue.
    pub task_repo: Arc<R>,
    /// Port for saving finished downloads.
    pub file_saver: Arc<S>,
    /// Port for emitting task events.
    pub event_emitter: Arc<E>,
    /// Configuration for the task manager.
    pub config: TaskManagerConfig,
}

/// Build a task manager from its dependencies.
///
/// The persisted queue for `config.scope` is restored and polling resumes
/// for every restored task. Restored tasks are not active-session tasks, so
/// finishing them never saves a file automatically.
pub async fn build_task_manager<B, T, R, S, E>(deps: TaskManagerDeps<B, T, R, S, E>) -> TaskManager
where
    B: BackendPort + 'static,
    T: TransferPort + 'static,
    R: TaskStateRepositoryPort + 'static,
    S: FileSaverPort + 'static,
    E: TaskEventEmitterPort + 'static,
{
    let manager = TaskManager {
        inner: Arc::new(Inner {
            storage_key: deps.config.storage_key(),
            queue: Mutex::new(TaskQueue::new()),
            backend: deps.backend,
            transport: deps.transport,
            task_repo: deps.task_repo,
            file_saver: deps.file_saver,
            emitter: deps.event_emitter,
            config: deps.config,
        }),
    };
    manager.inner.restore().await;
    manager
}

/// Orchestrates downloads, uploads and cancellation.
///
/// Cheap to clone; clones share the same queue.
#[derive(Clone)]
pub struct TaskManager {
    inner: Arc<Inner>,
}

struct Inner {
    queue: Mutex<TaskQueue>,
    backend: Arc<dyn BackendPort>,
    transport: Arc<dyn TransferPort>,
    task_repo: Arc<dyn TaskStateRepositoryPort>,
    file_saver: Arc<dyn FileSaverPort>,
    emitter: Arc<dyn TaskEventEmitterPort>,
    config: TaskManagerConfig,
    storage_key: String,
}

impl TaskManager {
    /// Configuration the manager was built with.
    pub fn config(&self) -> &TaskManagerConfig {
        &self.inner.config
    }

    /// Ask the server to prepare `path` for download and track the job.
    ///
    /// The returned task polls until the job finishes. When it succeeds the
    /// file is saved automatically and the task leaves the queue.
    pub async fn download(&self, path: &str) -> Result<Arc<StatusTask>, TaskError> {
        let id = self.inner.backend.request_download(path).await.map_err(|e| {
            tracing::warn!(target: "fsb.tasks", path = %path, error = %e, "Download request failed");
            TaskError::from(e)
        })?;

        let task = self.inner.new_task(id, TaskItem::download(path), true);
        {
            let mut queue = self.inner.queue.lock().await;
            queue.push(QueueEntry::Task(Arc::clone(&task)))?;
            self.inner.commit(&queue).await;
        }
        self.inner.start(&task);

        tracing::info!(target: "fsb.tasks", id = %task.id(), path = %path, "Download queued");
        Ok(task)
    }

    /// Upload `payload` as `path` below the directory `root`.
    ///
    /// 1. Reserve an upload slot (job id and pre-signed URL)
    /// 2. Transfer the payload to the bucket; the transfer is queued while
    ///    it runs but never persisted
    /// 3. Register the upload and replace the transfer by a status task
    ///
    /// A failure in any phase leaves no entry for this upload in the queue.
    pub async fn upload(
        &self,
        path: &str,
        root: &str,
        payload: TransferPayload,
    ) -> Result<Arc<StatusTask>, TaskError> {
        let slot = self.inner.backend.request_upload_slot(path).await.map_err(|e| {
            tracing::warn!(target: "fsb.tasks", path = %path, error = %e, "Upload slot request failed");
            TaskError::from(e)
        })?;

        let transfer = BucketTransfer::new(
            slot.task.clone(),
            TaskItem::upload_to_bucket(path, root),
            TransferRequest::new(&slot.url, payload),
            Arc::clone(&self.inner.transport),
            Arc::clone(&self.inner.emitter),
            self.inner.config.progress_interval,
        );
        let pending = QueueEntry::Transfer(Arc::clone(&transfer));
        {
            let mut queue = self.inner.queue.lock().await;
            queue.push(pending.clone())?;
            self.inner.commit(&queue).await;
        }

        tracing::debug!(target: "fsb.tasks", id = %slot.task, path = %path, "Bucket transfer started");
        let state = transfer.fetch().await;
        if let Some(error) = state.error {
            self.inner.discard(&pending).await;
            return Err(TaskError::transfer(error));
        }

        if let Err(e) = self.inner.backend.confirm_upload(&slot.task).await {
            tracing::warn!(target: "fsb.tasks", id = %slot.task, error = %e, "Upload registration failed");
            self.inner.discard(&pending).await;
            return Err(TaskError::registration(e.to_string()));
        }

        let task = self
            .inner
            .new_task(slot.task, TaskItem::upload(path, root), true);
        {
            let mut queue = self.inner.queue.lock().await;
            if !queue.replace(&pending, QueueEntry::Task(Arc::clone(&task))) {
                // Cancelled while registering
                return Err(TaskError::not_in_queue(task.id().as_str()));
            }
            self.inner.commit(&queue).await;
        }
        self.inner.start(&task);

        tracing::info!(target: "fsb.tasks", id = %task.id(), path = %path, "Upload registered");
        Ok(task)
    }

    /// Remove `entry` from the queue and stop its polling or transfer.
    ///
    /// Returns `false` if it was not queued.
    pub async fn remove_task(&self, entry: &QueueEntry) -> bool {
        let removed = self.inner.discard(entry).await;
        if removed {
            stop_entry(entry);
            tracing::info!(target: "fsb.tasks", id = %entry.id(), "Removed task from queue");
        }
        removed
    }

    /// Remove the entry with `id`.
    pub async fn remove_by_id(&self, id: &TaskId) -> Result<QueueEntry, TaskError> {
        let entry = self
            .get_task_by_id(id)
            .await
            .ok_or_else(|| TaskError::not_in_queue(id.as_str()))?;
        if self.remove_task(&entry).await {
            Ok(entry)
        } else {
            Err(TaskError::not_in_queue(id.as_str()))
        }
    }

    /// Cancel `entry`: stop it locally, remove it from the queue and ask the
    /// backend to cancel the job.
    ///
    /// The entry is removed even if the backend refuses. Returns `false` if
    /// it was not queued.
    pub async fn cancel_task(&self, entry: &QueueEntry) -> bool {
        let removed = self.remove_task(entry).await;
        if let Err(e) = self.inner.backend.cancel(entry.id()).await {
            tracing::warn!(target: "fsb.tasks", id = %entry.id(), error = %e, "Cancel request failed");
        } else {
            tracing::info!(target: "fsb.tasks", id = %entry.id(), "Task cancelled");
        }
        removed
    }

    /// Cancel the entry with `id`.
    pub async fn cancel_by_id(&self, id: &TaskId) -> Result<(), TaskError> {
        let entry = self
            .get_task_by_id(id)
            .await
            .ok_or_else(|| TaskError::not_in_queue(id.as_str()))?;
        self.cancel_task(&entry).await;
        Ok(())
    }

    /// Save the prepared file of the finished download `id`, then remove it.
    ///
    /// This is the manual path for downloads that were not saved
    /// automatically, such as restored ones. A failed save keeps the entry
    /// so it can be retried.
    ///
    /// # Errors
    ///
    /// `NotInQueue` if nothing has `id`, `NotReady` if the entry has no
    /// download URL yet and `Save` if the file saver fails.
    pub async fn save_task(&self, id: &TaskId) -> Result<(), TaskError> {
        let entry = self
            .get_task_by_id(id)
            .await
            .ok_or_else(|| TaskError::not_in_queue(id.as_str()))?;
        let QueueEntry::Task(task) = &entry else {
            return Err(TaskError::not_ready(id.as_str()));
        };
        let url = task
            .download_url()
            .ok_or_else(|| TaskError::not_ready(id.as_str()))?;

        self.inner.save(task, &url).await?;
        self.remove_task(&entry).await;
        Ok(())
    }

    /// Entry with `id`.
    pub async fn get_task_by_id(&self, id: &TaskId) -> Option<QueueEntry> {
        self.inner.queue.lock().await.get(id).cloned()
    }

    /// Entries whose item path equals `path`.
    pub async fn get_tasks_by_path(&self, path: &str) -> Vec<QueueEntry> {
        self.inner.queue.lock().await.by_path(path)
    }

    /// All entries, oldest first.
    pub async fn items(&self) -> Vec<QueueEntry> {
        self.inner.queue.lock().await.entries().to_vec()
    }

    /// Summaries of all entries, oldest first.
    pub async fn snapshot(&self) -> Vec<TaskSummary> {
        self.inner.queue.lock().await.summaries()
    }

    /// Stop every polling loop and abort running transfers.
    ///
    /// The persisted queue is left untouched so the next manager for the
    /// same scope resumes the restored tasks.
    pub async fn shutdown(&self) {
        let queue = self.inner.queue.lock().await;
        for entry in queue.entries() {
            stop_entry(entry);
        }
        tracing::debug!(target: "fsb.tasks", count = queue.len(), "Task manager shut down");
    }
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

fn stop_entry(entry: &QueueEntry) {
    match entry {
        QueueEntry::Task(task) => task.stop(),
        QueueEntry::Transfer(transfer) => transfer.cancel(),
    }
}

impl Inner {
    fn new_task(&self, id: TaskId, item: TaskItem, active_session: bool) -> Arc<StatusTask> {
        StatusTask::new(
            id,
            item,
            active_session,
            Arc::clone(&self.backend),
            Arc::clone(&self.emitter),
            self.config.poll_interval,
        )
    }

    fn start(self: &Arc<Self>, task: &Arc<StatusTask>) {
        let weak = Arc::downgrade(self);
        let hook: FinishHook = Box::new(move |task: Arc<StatusTask>| {
            async move {
                if let Some(inner) = Weak::upgrade(&weak) {
                    inner.on_finished(task).await;
                }
            }
            .boxed()
        });
        task.start(Some(hook));
    }

    /// Write the snapshot and announce the new queue state.
    ///
    /// Called with the queue lock held.
    async fn commit(&self, queue: &TaskQueue) {
        let snapshot = queue.persisted();
        if let Err(e) = self.task_repo.save(&self.storage_key, &snapshot).await {
            tracing::warn!(
                target: "fsb.tasks",
                key = %self.storage_key,
                error = %e,
                "Failed to persist task queue"
            );
        }
        self.emitter.emit(TaskEvent::QueueSnapshot {
            items: queue.summaries(),
        });
    }

    /// Remove `entry` and commit. Returns whether it was queued.
    async fn discard(&self, entry: &QueueEntry) -> bool {
        let mut queue = self.queue.lock().await;
        let removed = queue.remove(entry);
        if removed {
            self.commit(&queue).await;
        }
        removed
    }

    async fn restore(self: &Arc<Self>) {
        let persisted = match self.task_repo.load(&self.storage_key).await {
            Ok(Some(persisted)) => persisted,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(
                    target: "fsb.tasks",
                    key = %self.storage_key,
                    error = %e,
                    "Ignoring unreadable task queue"
                );
                return;
            }
        };

        let mut restored = Vec::new();
        {
            let mut queue = self.queue.lock().await;
            for entry in persisted.tasks {
                let task = self.new_task(entry.id, entry.item, false);
                if let Err(e) = queue.push(QueueEntry::Task(Arc::clone(&task))) {
                    tracing::warn!(target: "fsb.tasks", error = %e, "Skipping restored task");
                    continue;
                }
                restored.push(task);
            }
            self.emitter.emit(TaskEvent::QueueSnapshot {
                items: queue.summaries(),
            });
        }

        for task in &restored {
            self.start(task);
        }
        tracing::info!(
            target: "fsb.tasks",
            count = restored.len(),
            key = %self.storage_key,
            "Restored task queue"
        );
    }

    /// Hand `url` to the file saver and announce the outcome.
    async fn save(&self, task: &StatusTask, url: &str) -> Result<(), TaskError> {
        self.emitter.emit(TaskEvent::SaveTriggered {
            id: task.id().clone(),
            url: url.to_string(),
        });
        let result = self.file_saver.save(url, task.item()).await;
        self.emitter.emit(TaskEvent::SaveFinished {
            id: task.id().clone(),
            url: url.to_string(),
            error: result.as_ref().err().map(ToString::to_string),
        });
        match result {
            Ok(()) => {
                tracing::info!(target: "fsb.tasks", id = %task.id(), path = %task.item().path, "Download saved");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(target: "fsb.tasks", id = %task.id(), url = %url, error = %e, "Failed to save download");
                Err(TaskError::save(e.to_string()))
            }
        }
    }

    async fn on_finished(&self, task: Arc<StatusTask>) {
        let entry = QueueEntry::Task(Arc::clone(&task));
        match completion::decide_for(&task) {
            Completion::Save(url) => {
                if self.discard(&entry).await {
                    // Reported through `SaveFinished`
                    let _ = self.save(&task, &url).await;
                }
            }
            Completion::Dismiss => {
                if self.discard(&entry).await {
                    tracing::info!(target: "fsb.tasks", id = %task.id(), path = %task.item().path, "Upload finished");
                }
            }
            Completion::Keep => {
                let queue = self.queue.lock().await;
                self.emitter.emit(TaskEvent::QueueSnapshot {
                    items: queue.summaries(),
                });
                tracing::info!(
                    target: "fsb.tasks",
                    id = %task.id(),
                    status = %task.status(),
                    "Task finished"
                );
            }
        }
    }
}
