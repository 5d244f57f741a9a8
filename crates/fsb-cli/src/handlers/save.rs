//! Save command handler.

use anyhow::Result;
use fsb_core::TaskId;
use fsb_tasks::QueueEntry;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Save the file of a finished download and remove it from the queue.
///
/// Restored downloads are polled again on startup, so this waits for the
/// first poll (or the job) to finish before asking for the file.
pub async fn execute(ctx: &CliContext, id: &str) -> Result<()> {
    let id = TaskId::new(id);
    let Some(entry) = ctx.tasks().get_task_by_id(&id).await else {
        return Err(CliError::Arguments(format!("Task '{id}' is not in the queue.")).into());
    };

    if let QueueEntry::Task(task) = &entry {
        if task.is_running() {
            println!("Waiting for {id} to finish...");
        }
        tokio::select! {
            _ = task.wait_finished() => {}
            _ = tokio::signal::ctrl_c() => return Err(CliError::Interrupted.into()),
        }
    }

    ctx.tasks().save_task(&id).await.map_err(CliError::from)?;
    println!("Saved {}", ctx.saver().target_for(entry.item()).display());
    Ok(())
}
