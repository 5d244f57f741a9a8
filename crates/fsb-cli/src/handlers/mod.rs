//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that call the task manager and format terminal output

pub mod download;
pub mod list;
pub mod manage;
pub mod save;
pub mod upload;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use fsb_core::{JobStatus, TaskEvent};
use fsb_tasks::StatusTask;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::bootstrap::CliContext;
use crate::commands::Commands;
use crate::error::CliError;
use crate::presentation::describe_event;

/// Route a parsed command to its handler.
pub async fn dispatch(ctx: &CliContext, command: Commands) -> Result<()> {
    match command {
        Commands::Download { path, detach } => download::execute(ctx, &path, detach).await,
        Commands::Upload {
            path,
            root,
            file,
            detach,
        } => upload::execute(ctx, &path, &root, &file, detach).await,
        Commands::List => list::execute(ctx).await,
        Commands::Watch => watch::execute(ctx).await,
        Commands::Cancel { id } => manage::cancel(ctx, &id).await,
        Commands::Dismiss { id } => manage::dismiss(ctx, &id).await,
        Commands::Save { id } => save::execute(ctx, &id).await,
    }
}

/// How a followed task ended.
#[derive(Debug, Default)]
pub(crate) struct Followed {
    /// Terminal status, `None` if polling stopped first.
    pub status: Option<JobStatus>,
    /// Outcome of the automatic save, if one ran.
    pub saved: Option<Result<(), String>>,
}

/// Print events for `task` until it finishes.
///
/// `events` must be subscribed before the task was queued so no event of
/// the task is missed. Events emitted by the completion hook, including
/// the save outcome, are drained after the task finished.
pub(crate) async fn follow(
    task: &Arc<StatusTask>,
    mut events: broadcast::Receiver<TaskEvent>,
) -> Result<Followed> {
    let mut followed = Followed::default();
    let finished = task.wait_finished();
    tokio::pin!(finished);

    loop {
        tokio::select! {
            status = &mut finished => {
                followed.status = status;
                break;
            }
            event = events.recv() => match event {
                Ok(event) => observe(task, &event, &mut followed),
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Event stream lagged");
                }
                Err(RecvError::Closed) => {
                    followed.status = task.wait_finished().await;
                    return Ok(followed);
                }
            },
            _ = tokio::signal::ctrl_c() => return Err(CliError::Interrupted.into()),
        }
    }

    loop {
        match events.try_recv() {
            Ok(event) => observe(task, &event, &mut followed),
            Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    Ok(followed)
}

fn observe(task: &StatusTask, event: &TaskEvent, followed: &mut Followed) {
    if event.task_id() != Some(task.id()) {
        return;
    }
    if let Some(line) = describe_event(event) {
        println!("{line}");
    }
    if let TaskEvent::SaveFinished { error, .. } = event {
        followed.saved = Some(error.clone().map_or(Ok(()), Err));
    }
}
