//! Upload command handler.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use fsb_core::{JobStatus, TaskEvent, TransferPayload};
use tokio::sync::broadcast::error::RecvError;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the upload command.
///
/// Sends `file` to the pre-signed URL for `path`, showing progress on
/// stderr, then (unless `detach`) waits until the server has registered
/// the file.
pub async fn execute(
    ctx: &CliContext,
    path: &str,
    root: &str,
    file: &Path,
    detach: bool,
) -> Result<()> {
    if !tokio::fs::metadata(file).await.is_ok_and(|m| m.is_file()) {
        return Err(CliError::Arguments(format!("{} is not a file", file.display())).into());
    }

    let followed_events = ctx.subscribe();
    let mut events = ctx.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TaskEvent::TransferProgress { percent, .. }) => {
                    eprint!("\rUploading... {:>3.0}%", percent * 100.0);
                    let _ = std::io::stderr().flush();
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = ctx
        .tasks()
        .upload(path, root, TransferPayload::File(file.to_path_buf()))
        .await;
    progress.abort();
    eprintln!();

    let task = result.map_err(CliError::from)?;
    println!("Uploaded {} to {path} as {}", file.display(), task.id());

    if detach {
        return Ok(());
    }

    match super::follow(&task, followed_events).await?.status {
        Some(JobStatus::Success) => {
            println!("Registered {path}; {root} is up to date");
            Ok(())
        }
        Some(status) => {
            let reason = task.error().unwrap_or_else(|| status.to_string());
            Err(CliError::Task(format!("Upload {} failed: {reason}", task.id())).into())
        }
        None => Err(CliError::Interrupted.into()),
    }
}
