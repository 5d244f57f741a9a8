//! Cancel and dismiss command handlers.

use anyhow::Result;
use fsb_core::TaskId;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Cancel a job on the server and remove it from the queue.
///
/// The entry is removed even if the server rejects the cancellation.
pub async fn cancel(ctx: &CliContext, id: &str) -> Result<()> {
    ctx.tasks()
        .cancel_by_id(&TaskId::new(id))
        .await
        .map_err(CliError::from)?;
    println!("Cancelled {id}");
    Ok(())
}

/// Remove a job from the queue without contacting the server.
pub async fn dismiss(ctx: &CliContext, id: &str) -> Result<()> {
    ctx.tasks()
        .remove_by_id(&TaskId::new(id))
        .await
        .map_err(CliError::from)?;
    println!("Removed {id}");
    Ok(())
}
