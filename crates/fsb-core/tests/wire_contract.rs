//! Wire-format contract tests for types consumed by front-ends.

use fsb_core::{
    EntryKind, JobStatus, PersistedQueue, PersistedTask, TaskEvent, TaskId, TaskItem, TaskSummary,
};
use serde_json::json;

#[test]
fn queue_snapshot_event_shape() {
    let event = TaskEvent::QueueSnapshot {
        items: vec![TaskSummary {
            id: TaskId::new("T2"),
            item: TaskItem::upload_to_bucket("/data/new.txt", "/data"),
            entry: EntryKind::Transfer,
            status: None,
            percent: Some(0.0),
            error: None,
            download_url: None,
            active_session: true,
        }],
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "queue_snapshot",
            "items": [{
                "id": "T2",
                "item": {"path": "/data/new.txt", "root": "/data", "type": "upload-to-bucket"},
                "entry": "transfer",
                "percent": 0.0,
                "active_session": true
            }]
        })
    );
}

#[test]
fn task_finished_event_shape() {
    let event = TaskEvent::TaskFinished {
        id: TaskId::new("T1"),
        item: TaskItem::download("/data/file.txt"),
        status: JobStatus::Success,
        download_url: Some("https://files.example/T1".to_string()),
        error: None,
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "task_finished");
    assert_eq!(value["status"], "success");
    assert_eq!(value["download_url"], "https://files.example/T1");
    assert!(value.get("error").is_none());

    let parsed: TaskEvent = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, event);
}

#[test]
fn persisted_snapshot_shape() {
    let queue = PersistedQueue::new(vec![
        PersistedTask::new(TaskId::new("T1"), TaskItem::download("/data/file.txt")),
        PersistedTask::new(TaskId::new("T3"), TaskItem::upload("/data/up.bin", "/data")),
    ]);

    let value: serde_json::Value = serde_json::from_str(&queue.encode().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "version": 1,
            "tasks": [
                {"id": "T1", "item": {"path": "/data/file.txt", "type": "download"}},
                {"id": "T3", "item": {"path": "/data/up.bin", "root": "/data", "type": "upload"}}
            ]
        })
    );
}
