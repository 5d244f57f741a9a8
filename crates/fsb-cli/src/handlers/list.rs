//! List command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_queue;

/// Execute the list command.
///
/// Prints the restored queue. Statuses are the last known ones; run
/// `fsb watch` for live updates.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let items = ctx.tasks().snapshot().await;
    print_queue(&items);
    Ok(())
}
