//! Queue and event formatting for CLI output.

use fsb_core::{EntryKind, TaskEvent, TaskSummary};

/// Truncates a string to a maximum length, adding "..." if needed.
///
/// # Examples
///
/// ```rust
/// use fsb_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Short status for one queue entry.
pub fn status_label(summary: &TaskSummary) -> String {
    if summary.error.is_some() {
        return "failed".to_string();
    }
    match summary.entry {
        EntryKind::Transfer => {
            let percent = summary.percent.unwrap_or(0.0) * 100.0;
            format!("uploading {percent:.0}%")
        }
        EntryKind::StatusTask => summary
            .status
            .map_or_else(|| "queued".to_string(), |status| status.to_string()),
    }
}

/// Print the queue as a table, oldest first.
pub fn print_queue(items: &[TaskSummary]) {
    if items.is_empty() {
        println!("The queue is empty.");
        return;
    }

    println!(
        "{:<12} {:<17} {:<15} {:<9} Path",
        "ID", "Type", "Status", "Session"
    );
    print_separator(80);

    for summary in items {
        let session = if summary.active_session {
            "current"
        } else {
            "restored"
        };
        println!(
            "{:<12} {:<17} {:<15} {:<9} {}",
            truncate_string(summary.id.as_str(), 12),
            summary.item.kind.to_string(),
            status_label(summary),
            session,
            summary.item.path,
        );
        if let Some(error) = &summary.error {
            println!("{:<12} error: {error}", "");
        }
        if let Some(url) = &summary.download_url {
            println!("{:<12} ready: {url}", "");
        }
    }
}

/// One line describing an event, or `None` for events not worth printing.
pub fn describe_event(event: &TaskEvent) -> Option<String> {
    match event {
        TaskEvent::StatusChanged { id, status } => Some(format!("{id}: {status}")),
        TaskEvent::TaskFinished {
            id,
            item,
            status,
            download_url,
            error,
        } => Some(match (error, download_url) {
            (Some(error), _) => format!("{id}: {} {} failed: {error}", item.kind, item.path),
            (None, Some(url)) => {
                format!("{id}: {} {} finished ({status}), ready at {url}", item.kind, item.path)
            }
            (None, None) => format!("{id}: {} {} finished ({status})", item.kind, item.path),
        }),
        TaskEvent::SaveTriggered { id, url } => Some(format!("{id}: saving {url}")),
        TaskEvent::SaveFinished { id, error, .. } => Some(match error {
            Some(error) => format!("{id}: save failed: {error}"),
            None => format!("{id}: saved"),
        }),
        TaskEvent::QueueSnapshot { .. } | TaskEvent::TransferProgress { .. } => None,
    }
}
