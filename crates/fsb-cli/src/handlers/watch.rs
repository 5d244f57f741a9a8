//! Watch command handler.

use anyhow::Result;
use fsb_core::TaskSummary;
use tokio::sync::broadcast::error::RecvError;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{describe_event, print_queue};

/// Execute the watch command.
///
/// Prints every status change until no entry in the queue is running.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let mut events = ctx.subscribe();
    print_queue(&ctx.tasks().snapshot().await);

    while any_running(ctx).await {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(line) = describe_event(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => return Err(CliError::Interrupted.into()),
        }
    }

    println!();
    print_queue(&ctx.tasks().snapshot().await);
    Ok(())
}

async fn any_running(ctx: &CliContext) -> bool {
    ctx.tasks()
        .snapshot()
        .await
        .iter()
        .any(TaskSummary::is_running)
}
