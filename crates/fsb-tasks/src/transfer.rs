//! Direct upload of a payload to a pre-signed bucket URL.
//!
//! A `BucketTransfer` performs exactly one PUT through the [`TransferPort`].
//! Progress is published on a `watch` channel and, throttled, as
//! `TaskEvent::TransferProgress`.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use fsb_core::{
    BackendError, EntryKind, ProgressCallback, TaskEvent, TaskEventEmitterPort, TaskId, TaskItem,
    TaskSummary, TransferPort, TransferRequest,
};

use crate::progress::ProgressThrottle;
use crate::resource::{RemoteResource, ResourceSource, ResourceState};

struct ProgressSink {
    id: TaskId,
    percent: watch::Sender<f64>,
    throttle: Mutex<ProgressThrottle>,
    emitter: Arc<dyn TaskEventEmitterPort>,
}

impl ProgressSink {
    fn report(&self, percent: f64) {
        let percent = percent.clamp(0.0, 1.0);
        let advanced = self.percent.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
        if !advanced {
            return;
        }

        let due = self
            .throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .should_emit(percent);
        if due {
            self.emitter
                .emit(TaskEvent::transfer_progress(self.id.clone(), percent));
        }
    }
}

/// Performs the PUT.
pub struct TransferSource {
    transport: Arc<dyn TransferPort>,
    request: TransferRequest,
    sink: Arc<ProgressSink>,
    cancel: CancellationToken,
}

#[async_trait]
impl ResourceSource for TransferSource {
    type Value = ();

    async fn load(&self) -> Result<(), BackendError> {
        let sink = Arc::clone(&self.sink);
        let progress: ProgressCallback = Arc::new(move |sent, total| {
            if total > 0 {
                #[allow(clippy::cast_precision_loss)]
                sink.report(sent as f64 / total as f64);
            }
        });

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(BackendError::Cancelled),
            result = self.transport.put(&self.request, progress, self.cancel.clone()) => result,
        }
    }

    fn url(&self) -> String {
        self.request.url.clone()
    }
}

/// One upload attempt to a pre-signed URL.
pub struct BucketTransfer {
    id: TaskId,
    item: TaskItem,
    resource: RemoteResource<TransferSource>,
    sink: Arc<ProgressSink>,
    cancel: CancellationToken,
}

impl BucketTransfer {
    /// Create a transfer for the job `id`. Nothing is sent until
    /// [`BucketTransfer::fetch`].
    pub fn new(
        id: TaskId,
        item: TaskItem,
        request: TransferRequest,
        transport: Arc<dyn TransferPort>,
        emitter: Arc<dyn TaskEventEmitterPort>,
        progress_interval: Duration,
    ) -> Arc<Self> {
        let (percent, _) = watch::channel(0.0);
        let sink = Arc::new(ProgressSink {
            id: id.clone(),
            percent,
            throttle: Mutex::new(ProgressThrottle::new(progress_interval)),
            emitter,
        });
        let cancel = CancellationToken::new();
        Arc::new(Self {
            resource: RemoteResource::new(TransferSource {
                transport,
                request,
                sink: Arc::clone(&sink),
                cancel: cancel.clone(),
            }),
            id,
            item,
            sink,
            cancel,
        })
    }

    /// Job id the transfer belongs to.
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Item being uploaded.
    pub const fn item(&self) -> &TaskItem {
        &self.item
    }

    /// Destination URL.
    pub fn url(&self) -> String {
        self.resource.url()
    }

    /// Run the transfer, or join / return the single attempt already made.
    ///
    /// On return `percent` is 1.0 regardless of the outcome.
    pub async fn fetch(&self) -> ResourceState<()> {
        let state = self.resource.fetch_if_needed_or_wait().await;
        let finished = self.sink.percent.send_if_modified(|current| {
            if *current < 1.0 {
                *current = 1.0;
                true
            } else {
                false
            }
        });
        if finished {
            self.sink
                .emitter
                .emit(TaskEvent::transfer_progress(self.id.clone(), 1.0));
        }
        if let Some(error) = state.error.as_deref() {
            tracing::warn!(id = %self.id, path = %self.item.path, error = %error, "Bucket transfer failed");
        }
        state
    }

    /// Abort an in-flight transfer. It resolves as failed with a
    /// "cancelled" error.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Progress in `[0, 1]`.
    pub fn percent(&self) -> f64 {
        *self.sink.percent.borrow()
    }

    /// Subscribe to progress changes.
    pub fn subscribe_percent(&self) -> watch::Receiver<f64> {
        self.sink.percent.subscribe()
    }

    /// The transfer completed successfully.
    pub fn loaded(&self) -> bool {
        self.resource.state().loaded
    }

    /// The transfer failed or was aborted.
    pub fn failed(&self) -> bool {
        self.resource.state().error.is_some()
    }

    /// Failure message.
    pub fn error(&self) -> Option<String> {
        self.resource.state().error
    }

    /// Summary for queue snapshots.
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            item: self.item.clone(),
            entry: EntryKind::Transfer,
            status: None,
            percent: Some(self.percent()),
            error: self.error(),
            download_url: None,
            active_session: true,
        }
    }
}

impl std::fmt::Debug for BucketTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketTransfer")
            .field("id", &self.id)
            .field("item", &self.item)
            .field("percent", &self.percent())
            .finish_non_exhaustive()
    }
}
