//! Download command handler.

use anyhow::Result;
use fsb_core::JobStatus;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the download command.
///
/// Queues the job, then (unless `detach`) waits for it. A successful job
/// is saved into the download directory by the task manager; the command
/// fails if that save did not succeed.
pub async fn execute(ctx: &CliContext, path: &str, detach: bool) -> Result<()> {
    let events = ctx.subscribe();
    let task = ctx.tasks().download(path).await.map_err(CliError::from)?;
    println!("Queued download of {path} as {}", task.id());

    if detach {
        println!("Run 'fsb watch' to follow it and 'fsb save {}' once it is ready.", task.id());
        return Ok(());
    }

    let followed = super::follow(&task, events).await?;
    match followed.status {
        Some(JobStatus::Success) => match (task.download_url(), followed.saved) {
            (Some(_), Some(Ok(()))) => {
                let target = ctx.saver().target_for(task.item());
                println!("Saved {}", target.display());
                Ok(())
            }
            (Some(url), Some(Err(error))) => Err(CliError::Task(format!(
                "The file is ready at {url} but could not be saved: {error}"
            ))
            .into()),
            (Some(url), None) => Err(CliError::Task(format!(
                "Download {} was removed before {url} could be saved",
                task.id()
            ))
            .into()),
            (None, _) => Err(CliError::Task(format!(
                "Download {} finished without a file URL",
                task.id()
            ))
            .into()),
        },
        Some(status) => {
            let reason = task.error().unwrap_or_else(|| status.to_string());
            Err(CliError::Task(format!("Download {} failed: {reason}", task.id())).into())
        }
        None => Err(CliError::Interrupted.into()),
    }
}
