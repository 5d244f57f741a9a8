//! Lazily fetched network resource.
//!
//! A `RemoteResource` wraps a [`ResourceSource`] and keeps the last fetched
//! value together with `pending` / `loaded` / `error` flags. State changes
//! are published on a `watch` channel.
//!
//! # Concurrency Model
//!
//! - At most one load in flight per resource; concurrent `fetch()` calls
//!   await the same shared future
//! - The result of a load is applied to the state exactly once, by whichever
//!   awaiter observes it first
//! - Failures never escape as errors: they land in `ResourceState::error`

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;

use fsb_core::BackendError;

/// Something a [`RemoteResource`] can load.
#[async_trait]
pub trait ResourceSource: Send + Sync + 'static {
    /// Value produced by a successful load.
    type Value: Clone + Default + Send + Sync + 'static;

    /// Perform one network request.
    async fn load(&self) -> Result<Self::Value, BackendError>;

    /// Human-readable location, for logs.
    fn url(&self) -> String;
}

/// Observable state of a resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceState<V> {
    /// A load is in flight.
    pub pending: bool,
    /// The last load succeeded.
    pub loaded: bool,
    /// Message of the last failed load, cleared on success.
    pub error: Option<String>,
    /// Last successfully loaded value (`Default` until then).
    pub value: V,
}

type SharedLoad<V> = Shared<BoxFuture<'static, Result<V, BackendError>>>;

/// A cacheable network value with request de-duplication.
pub struct RemoteResource<S: ResourceSource> {
    source: Arc<S>,
    state: watch::Sender<ResourceState<S::Value>>,
    inflight: Mutex<Option<SharedLoad<S::Value>>>,
    needs_fetch: AtomicBool,
    load_count: AtomicU64,
}

impl<S: ResourceSource> RemoteResource<S> {
    /// Create an empty resource. Nothing is fetched until asked.
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            source: Arc::new(source),
            state,
            inflight: Mutex::new(None),
            needs_fetch: AtomicBool::new(true),
            load_count: AtomicU64::new(0),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Location of the resource.
    pub fn url(&self) -> String {
        self.source.url()
    }

    /// Current state.
    pub fn state(&self) -> ResourceState<S::Value> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<S::Value>> {
        self.state.subscribe()
    }

    /// Number of loads actually started.
    pub fn load_count(&self) -> u64 {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Whether a load is in flight.
    pub fn is_pending(&self) -> bool {
        self.lock_inflight().is_some()
    }

    /// Fetch the resource, joining the in-flight load if there is one.
    ///
    /// Returns the state after the load resolved.
    pub async fn fetch(&self) -> ResourceState<S::Value> {
        let load = self.start_or_join();
        let result = load.clone().await;
        self.settle(&load, result);
        self.state()
    }

    /// Fetch only if nothing was loaded yet (or the cache was invalidated);
    /// otherwise wait for the in-flight load, or return the cached state.
    pub async fn fetch_if_needed_or_wait(&self) -> ResourceState<S::Value> {
        if self.needs_fetch.load(Ordering::SeqCst) || self.is_pending() {
            return self.fetch().await;
        }
        self.state()
    }

    /// Mark the resource stale. The last value stays readable until the
    /// next fetch replaces it.
    pub fn invalidate_cache(&self) {
        self.needs_fetch.store(true, Ordering::SeqCst);
    }

    fn start_or_join(&self) -> SharedLoad<S::Value> {
        let mut inflight = self.lock_inflight();
        if let Some(load) = inflight.as_ref() {
            return load.clone();
        }

        self.load_count.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| state.pending = true);

        let source = Arc::clone(&self.source);
        let load = async move { source.load().await }.boxed().shared();
        *inflight = Some(load.clone());
        load
    }

    fn settle(&self, load: &SharedLoad<S::Value>, result: Result<S::Value, BackendError>) {
        let mut inflight = self.lock_inflight();
        if !inflight.as_ref().is_some_and(|current| current.ptr_eq(load)) {
            // Another awaiter already applied this result
            return;
        }
        *inflight = None;
        self.needs_fetch.store(false, Ordering::SeqCst);

        match result {
            Ok(value) => self.state.send_modify(|state| {
                state.pending = false;
                state.loaded = true;
                state.error = None;
                state.value = value;
            }),
            Err(err) => {
                tracing::debug!(url = %self.source.url(), error = %err, "Resource fetch failed");
                self.state.send_modify(|state| {
                    state.pending = false;
                    state.loaded = false;
                    state.error = Some(err.to_string());
                });
            }
        }
    }

    fn lock_inflight(&self) -> MutexGuard<'_, Option<SharedLoad<S::Value>>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ResourceSource> std::fmt::Debug for RemoteResource<S>
where
    S::Value: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResource")
            .field("url", &self.source.url())
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
