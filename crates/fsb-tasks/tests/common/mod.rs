//! Shared fakes for task manager integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use fsb_core::{
    BackendError, BackendPort, FileSaverPort, JobStatus, ProgressCallback, SaveError,
    StatusReport, TaskEvent, TaskEventEmitterPort, TaskId, TaskItem, TransferPort,
    TransferRequest, UploadSlot, UploadTarget,
};
use fsb_store::MemoryTaskStore;
use fsb_tasks::{TaskManager, TaskManagerConfig, TaskManagerDeps, build_task_manager};

/// Backend that answers from per-endpoint scripts.
///
/// Status scripts are consumed one entry per poll; the last entry repeats.
#[derive(Default)]
pub struct ScriptedBackend {
    downloads: Mutex<VecDeque<Result<TaskId, BackendError>>>,
    slots: Mutex<VecDeque<Result<UploadSlot, BackendError>>>,
    statuses: Mutex<HashMap<TaskId, VecDeque<Result<StatusReport, BackendError>>>>,
    status_calls: Mutex<HashMap<TaskId, usize>>,
    confirm_error: Mutex<Option<BackendError>>,
    confirmed: Mutex<Vec<TaskId>>,
    cancel_error: Mutex<Option<BackendError>>,
    cancelled: Mutex<Vec<TaskId>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_download(&self, result: Result<&str, BackendError>) -> &Self {
        self.downloads
            .lock()
            .unwrap()
            .push_back(result.map(TaskId::new));
        self
    }

    pub fn on_upload_slot(&self, id: &str, url: &str, tag_value: Option<&str>) -> &Self {
        self.slots.lock().unwrap().push_back(Ok(UploadSlot {
            task: TaskId::new(id),
            url: UploadTarget {
                url: url.to_string(),
                tag_value: tag_value.map(str::to_string),
                canned_acl_value: None,
            },
        }));
        self
    }

    pub fn fail_upload_slot(&self, error: BackendError) -> &Self {
        self.slots.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn on_status(&self, id: &str, script: Vec<Result<StatusReport, BackendError>>) -> &Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(TaskId::new(id), script.into());
        self
    }

    pub fn fail_confirm(&self, error: BackendError) -> &Self {
        *self.confirm_error.lock().unwrap() = Some(error);
        self
    }

    pub fn fail_cancel(&self, error: BackendError) -> &Self {
        *self.cancel_error.lock().unwrap() = Some(error);
        self
    }

    pub fn status_calls(&self, id: &str) -> usize {
        self.status_calls
            .lock()
            .unwrap()
            .get(&TaskId::new(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn confirmed(&self) -> Vec<TaskId> {
        self.confirmed.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<TaskId> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendPort for ScriptedBackend {
    async fn request_download(&self, _path: &str) -> Result<TaskId, BackendError> {
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::rejected("unexpected download request")))
    }

    async fn request_upload_slot(&self, _path: &str) -> Result<UploadSlot, BackendError> {
        self.slots
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::rejected("unexpected upload request")))
    }

    async fn status(&self, id: &TaskId) -> Result<StatusReport, BackendError> {
        *self
            .status_calls
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default() += 1;

        let mut statuses = self.statuses.lock().unwrap();
        let Some(script) = statuses.get_mut(id) else {
            return Err(BackendError::rejected("unknown task"));
        };
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script
                .front()
                .cloned()
                .unwrap_or_else(|| Err(BackendError::rejected("empty script")))
        }
    }

    async fn confirm_upload(&self, id: &TaskId) -> Result<(), BackendError> {
        self.confirmed.lock().unwrap().push(id.clone());
        match self.confirm_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn cancel(&self, id: &TaskId) -> Result<(), BackendError> {
        self.cancelled.lock().unwrap().push(id.clone());
        match self.cancel_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Transport that reports progress in quarters, optionally waits for a
/// gate to open, then returns the configured result.
pub struct ScriptedTransport {
    result: Result<(), BackendError>,
    gate: watch::Sender<bool>,
    requests: Mutex<Vec<TransferRequest>>,
}

impl ScriptedTransport {
    pub fn succeeding() -> Arc<Self> {
        Self::with_result(Ok(()))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::with_result(Err(BackendError::transport(message)))
    }

    fn with_result(result: Result<(), BackendError>) -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        Arc::new(Self {
            result,
            gate,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Hold transfers until [`ScriptedTransport::open`].
    pub fn close(&self) {
        self.gate.send_replace(false);
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferPort for ScriptedTransport {
    async fn put(
        &self,
        request: &TransferRequest,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<(), BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        progress(0, 4);

        let mut gate = self.gate.subscribe();
        let opened = async move { gate.wait_for(|open| *open).await.is_ok() };
        tokio::select! {
            () = cancel.cancelled() => return Err(BackendError::Cancelled),
            _ = opened => {}
        }

        for sent in 1..=4 {
            progress(sent, 4);
        }
        self.result.clone()
    }
}

/// Emitter that records every event.
#[derive(Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<TaskEvent>>>,
}

impl RecordingEmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| event.event_name() == name)
            .count()
    }
}

impl TaskEventEmitterPort for RecordingEmitter {
    fn emit(&self, event: TaskEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn TaskEventEmitterPort> {
        Box::new(self.clone())
    }
}

/// Saver that records what it was asked to save.
#[derive(Default)]
pub struct RecordingSaver {
    saved: Mutex<Vec<(String, TaskItem)>>,
}

impl RecordingSaver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn saved(&self) -> Vec<(String, TaskItem)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSaverPort for RecordingSaver {
    async fn save(&self, url: &str, item: &TaskItem) -> Result<(), SaveError> {
        self.saved
            .lock()
            .unwrap()
            .push((url.to_string(), item.clone()));
        Ok(())
    }
}

pub fn report(status: JobStatus) -> Result<StatusReport, BackendError> {
    Ok(StatusReport::new(status))
}

pub fn success_with_url(url: &str) -> Result<StatusReport, BackendError> {
    Ok(StatusReport::new(JobStatus::Success).with_result(serde_json::json!({ "url": url })))
}

pub struct Harness<S: FileSaverPort + 'static> {
    pub backend: Arc<ScriptedBackend>,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryTaskStore>,
    pub saver: Arc<S>,
    pub emitter: Arc<RecordingEmitter>,
}

impl<S: FileSaverPort + 'static> Harness<S> {
    pub fn new(saver: Arc<S>) -> Self {
        Self {
            backend: ScriptedBackend::new(),
            transport: ScriptedTransport::succeeding(),
            store: Arc::new(MemoryTaskStore::new()),
            saver,
            emitter: RecordingEmitter::new(),
        }
    }

    pub async fn manager(&self) -> TaskManager {
        build_task_manager(TaskManagerDeps {
            backend: Arc::clone(&self.backend),
            transport: Arc::clone(&self.transport),
            task_repo: Arc::clone(&self.store),
            file_saver: Arc::clone(&self.saver),
            event_emitter: Arc::clone(&self.emitter),
            config: TaskManagerConfig::new("/data"),
        })
        .await
    }

    /// Ids stored in the persisted snapshot.
    pub fn persisted_ids(&self) -> Vec<String> {
        self.store
            .snapshot(&TaskManagerConfig::new("/data").storage_key())
            .map(|queue| {
                queue
                    .tasks
                    .into_iter()
                    .map(|task| task.id.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Wait (in virtual time) until `condition` holds.
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..12_000 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
