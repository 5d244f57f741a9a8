//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter. All concrete implementations are instantiated here:
//! - Job endpoints and bucket transport (via fsb-http)
//! - Queue persistence (via fsb-store)
//! - Download saving (via [`DiskFileSaver`])
//! - The task manager (via fsb-tasks)
//!
//! Command handlers receive the composed [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fsb_core::{BroadcastTaskEmitter, TaskEvent};
use fsb_http::{BackendConfig, HttpBackend, HttpTransfer};
use fsb_store::JsonFileTaskStore;
use fsb_tasks::{TaskManager, TaskManagerConfig, TaskManagerDeps, build_task_manager};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;
use crate::saver::DiskFileSaver;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Base URL of the file-browser API.
    pub api_url: String,
    /// Bearer token.
    pub token: Option<String>,
    /// Directory holding the persisted queue.
    pub state_dir: PathBuf,
    /// Directory finished downloads are saved into.
    pub download_dir: PathBuf,
    /// Queue scope.
    pub scope: String,
    /// Status poll interval.
    pub poll_interval: Duration,
}

impl CliConfig {
    /// Resolve configuration from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let state_dir = match &cli.state_dir {
            Some(dir) => dir.clone(),
            None => default_state_dir()?,
        };
        Ok(Self {
            api_url: cli.api_url.clone(),
            token: cli.token.clone(),
            state_dir,
            download_dir: cli.download_dir.clone(),
            scope: cli.scope.clone(),
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
        })
    }
}

/// `<data dir>/fsb`, e.g. `~/.local/share/fsb` on Linux.
pub fn default_state_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("fsb"))
        .ok_or_else(|| {
            CliError::Config("cannot determine a data directory; set FSB_STATE_DIR".to_string())
        })
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    tasks: TaskManager,
    events: Arc<BroadcastTaskEmitter>,
    saver: Arc<DiskFileSaver>,
    config: CliConfig,
}

impl CliContext {
    /// The task manager.
    pub const fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    /// Subscribe to task events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// The file saver used for finished downloads.
    pub fn saver(&self) -> &DiskFileSaver {
        &self.saver
    }

    /// Resolved configuration.
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }
}

/// Bootstrap the CLI application.
///
/// This is the composition root. It:
/// 1. Validates the API URL and builds the HTTP backend and bucket transport
/// 2. Opens the JSON file store in the state directory
/// 3. Creates the download saver and the event broadcaster
/// 4. Builds the task manager, which restores the persisted queue
pub async fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let backend_config =
        BackendConfig::parse(&config.api_url)?.with_optional_token(config.token.clone());
    let backend = Arc::new(HttpBackend::new(&backend_config)?);
    let transport = Arc::new(HttpTransfer::new(&backend_config)?);
    let store = Arc::new(JsonFileTaskStore::new(config.state_dir.clone()));
    let saver = Arc::new(DiskFileSaver::new(config.download_dir.clone())?);
    let events = Arc::new(BroadcastTaskEmitter::with_defaults());

    debug!(
        api_url = %config.api_url,
        state_dir = %config.state_dir.display(),
        scope = %config.scope,
        "Bootstrapping task manager"
    );

    let tasks = build_task_manager(TaskManagerDeps {
        backend,
        transport,
        task_repo: store,
        file_saver: Arc::clone(&saver),
        event_emitter: Arc::clone(&events),
        config: TaskManagerConfig::new(config.scope.clone())
            .with_poll_interval(config.poll_interval),
    })
    .await;

    Ok(CliContext {
        tasks,
        events,
        saver,
        config,
    })
}
