//! Integration tests for `TaskManager`.
//!
//! The manager is wired to scripted ports and an in-memory store. Time is
//! paused so polling runs in virtual time.
//!
//! # What is tested
//!
//! - Download flow and the auto-save policy
//! - The three-phase upload pipeline, including partial failures
//! - Persistence and restoration of the queue
//! - Unconditional cancellation

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;

use fsb_core::{
    BackendError, EntryKind, FileSaverPort, ItemKind, JobStatus, SaveError, TaskError, TaskEvent,
    TaskId, TaskItem, TransferPayload,
};
use fsb_tasks::TaskManager;

use common::{Harness, RecordingSaver, ScriptedTransport, eventually, report, success_with_url};

mock! {
    pub Saver {}

    #[async_trait]
    impl FileSaverPort for Saver {
        async fn save(&self, url: &str, item: &TaskItem) -> Result<(), SaveError>;
    }
}

const STORAGE_KEY: &str = "fsb.tasks:/data";

fn payload() -> TransferPayload {
    TransferPayload::Memory(b"hello".to_vec())
}

async fn wait_for_len(manager: &TaskManager, len: usize) {
    eventually(|| {
        let manager = manager.clone();
        async move { manager.items().await.len() == len }
    })
    .await;
}

// ── Downloads ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn download_scenario_saves_and_clears_queue() {
    let mut saver = MockSaver::new();
    saver
        .expect_save()
        .withf(|url, item| url == "https://files.example/T1" && item.path == "/data/file.txt")
        .times(1)
        .returning(|_, _| Ok(()));
    let h = Harness::new(Arc::new(saver));
    h.backend.on_download(Ok("T1")).on_status(
        "T1",
        vec![
            report(JobStatus::Pending),
            report(JobStatus::Running),
            success_with_url("https://files.example/T1"),
        ],
    );
    let manager = h.manager().await;

    let task = manager.download("/data/file.txt").await.unwrap();

    let items = manager.snapshot().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, TaskId::new("T1"));
    assert_eq!(items[0].item, TaskItem::download("/data/file.txt"));
    assert!(items[0].active_session);
    assert_eq!(h.persisted_ids(), ["T1"]);

    assert_eq!(task.wait_finished().await, Some(JobStatus::Success));

    assert!(manager.items().await.is_empty());
    assert!(h.persisted_ids().is_empty());
    assert_eq!(h.backend.status_calls("T1"), 3);
    assert_eq!(h.emitter.count("task:save_triggered"), 1);
}

#[tokio::test(start_paused = true)]
async fn download_request_error_is_returned() {
    let h = Harness::new(RecordingSaver::new());
    h.backend.on_download(Err(BackendError::Unauthenticated));
    let manager = h.manager().await;

    let err = manager.download("/data/file.txt").await.unwrap_err();

    assert_eq!(err, TaskError::Backend(BackendError::Unauthenticated));
    assert!(err.user_message().contains("session"));
    assert!(manager.items().await.is_empty());
    assert_eq!(h.emitter.count("task:queue_snapshot"), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_job_id_is_rejected() {
    let h = Harness::new(RecordingSaver::new());
    h.backend
        .on_download(Ok("T1"))
        .on_download(Ok("T1"))
        .on_status("T1", vec![report(JobStatus::Running)]);
    let manager = h.manager().await;

    manager.download("/data/a.txt").await.unwrap();
    let err = manager.download("/data/b.txt").await.unwrap_err();

    assert_eq!(err, TaskError::already_queued("T1"));
    assert_eq!(manager.items().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_download_stays_until_dismissed() {
    let h = Harness::new(RecordingSaver::new());
    h.backend.on_download(Ok("T1")).on_status(
        "T1",
        vec![report(JobStatus::Running), report(JobStatus::Failure)],
    );
    let manager = h.manager().await;

    let task = manager.download("/data/file.txt").await.unwrap();
    assert_eq!(task.wait_finished().await, Some(JobStatus::Failure));

    let items = manager.snapshot().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, Some(JobStatus::Failure));
    assert!(h.saver.saved().is_empty());
    assert_eq!(manager.get_tasks_by_path("/data/file.txt").await.len(), 1);

    let removed = manager.remove_by_id(&TaskId::new("T1")).await.unwrap();
    assert_eq!(removed.id(), &TaskId::new("T1"));
    assert!(manager.items().await.is_empty());
    assert!(h.persisted_ids().is_empty());
    assert_eq!(
        manager.remove_by_id(&TaskId::new("T1")).await.unwrap_err(),
        TaskError::not_in_queue("T1")
    );
}

#[tokio::test(start_paused = true)]
async fn download_without_url_is_kept() {
    let h = Harness::new(RecordingSaver::new());
    h.backend
        .on_download(Ok("T1"))
        .on_status("T1", vec![report(JobStatus::Success)]);
    let manager = h.manager().await;

    let task = manager.download("/data/file.txt").await.unwrap();
    task.wait_finished().await;

    assert!(h.saver.saved().is_empty());
    assert_eq!(manager.items().await.len(), 1);
}

// ── Auto-save policy ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn restored_download_is_not_saved() {
    let mut saver = MockSaver::new();
    saver.expect_save().never();
    let h = Harness::new(Arc::new(saver));
    h.store.set_raw(
        STORAGE_KEY,
        r#"[{"id":"T1","item":{"path":"/data/file.txt","type":"download"}}]"#,
    );
    h.backend
        .on_status("T1", vec![success_with_url("https://files.example/T1")]);

    let manager = h.manager().await;
    let items = manager.items().await;
    assert_eq!(items.len(), 1);
    let task = items[0].as_task().unwrap();
    assert!(!task.active_session());

    assert_eq!(task.wait_finished().await, Some(JobStatus::Success));

    let items = manager.snapshot().await;
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].download_url.as_deref(),
        Some("https://files.example/T1")
    );
    assert_eq!(h.emitter.count("task:save_triggered"), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_save_still_removes_task() {
    let mut saver = MockSaver::new();
    saver.expect_save().times(1).returning(|url, _| {
        Err(SaveError::Fetch {
            url: url.to_string(),
            message: "404".to_string(),
        })
    });
    let h = Harness::new(Arc::new(saver));
    h.backend
        .on_download(Ok("T1"))
        .on_status("T1", vec![success_with_url("https://files.example/T1")]);
    let manager = h.manager().await;

    let task = manager.download("/data/file.txt").await.unwrap();
    task.wait_finished().await;

    assert!(manager.items().await.is_empty());
    let outcome = h
        .emitter
        .events()
        .into_iter()
        .find(|event| matches!(event, TaskEvent::SaveFinished { .. }));
    assert_eq!(
        outcome,
        Some(TaskEvent::SaveFinished {
            id: TaskId::new("T1"),
            url: "https://files.example/T1".to_string(),
            error: Some("Failed to fetch https://files.example/T1: 404".to_string()),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn restored_download_can_be_saved_manually() {
    let h = Harness::new(RecordingSaver::new());
    h.store.set_raw(
        STORAGE_KEY,
        r#"[{"id":"T1","item":{"path":"/data/file.txt","type":"download"}}]"#,
    );
    h.backend
        .on_status("T1", vec![success_with_url("https://files.example/T1")]);
    let manager = h.manager().await;

    let task = manager.items().await[0].as_task().unwrap().clone();
    task.wait_finished().await;
    manager.save_task(&TaskId::new("T1")).await.unwrap();

    assert_eq!(
        h.saver.saved(),
        vec![(
            "https://files.example/T1".to_string(),
            TaskItem::download("/data/file.txt")
        )]
    );
    assert!(manager.items().await.is_empty());
    assert!(h.persisted_ids().is_empty());
    assert!(h.emitter.events().contains(&TaskEvent::SaveFinished {
        id: TaskId::new("T1"),
        url: "https://files.example/T1".to_string(),
        error: None,
    }));
}

#[tokio::test(start_paused = true)]
async fn failed_manual_save_keeps_entry() {
    let mut saver = MockSaver::new();
    saver.expect_save().times(1).returning(|url, _| {
        Err(SaveError::Fetch {
            url: url.to_string(),
            message: "404".to_string(),
        })
    });
    let h = Harness::new(Arc::new(saver));
    h.store.set_raw(
        STORAGE_KEY,
        r#"[{"id":"T1","item":{"path":"/data/file.txt","type":"download"}}]"#,
    );
    h.backend
        .on_status("T1", vec![success_with_url("https://files.example/T1")]);
    let manager = h.manager().await;

    let task = manager.items().await[0].as_task().unwrap().clone();
    task.wait_finished().await;
    let err = manager.save_task(&TaskId::new("T1")).await.unwrap_err();

    assert!(matches!(err, TaskError::Save { .. }));
    assert_eq!(manager.items().await.len(), 1);
    assert_eq!(h.persisted_ids(), vec!["T1"]);
}

#[tokio::test(start_paused = true)]
async fn save_requires_finished_download() {
    let mut saver = MockSaver::new();
    saver.expect_save().never();
    let h = Harness::new(Arc::new(saver));
    h.store.set_raw(
        STORAGE_KEY,
        r#"[{"id":"T1","item":{"path":"/data/file.txt","type":"download"}}]"#,
    );
    h.backend.on_status("T1", vec![report(JobStatus::Running)]);
    let manager = h.manager().await;

    assert_eq!(
        manager.save_task(&TaskId::new("T1")).await,
        Err(TaskError::not_ready("T1"))
    );
    assert_eq!(
        manager.save_task(&TaskId::new("T9")).await,
        Err(TaskError::not_in_queue("T9"))
    );
    assert_eq!(manager.items().await.len(), 1);
    manager.shutdown().await;
}

// ── Uploads ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn upload_scenario_replaces_transfer_with_task() {
    let h = Harness::new(RecordingSaver::new());
    h.backend
        .on_upload_slot("T2", "https://bucket/T2", Some("v"))
        .on_status(
            "T2",
            vec![report(JobStatus::Running), report(JobStatus::Success)],
        );
    h.transport.close();
    let manager = h.manager().await;

    let uploader = manager.clone();
    let upload = tokio::spawn(async move {
        uploader
            .upload("/data/new.txt", "/data", payload())
            .await
    });

    wait_for_len(&manager, 1).await;
    let items = manager.snapshot().await;
    assert_eq!(items[0].entry, EntryKind::Transfer);
    assert_eq!(items[0].item.kind, ItemKind::UploadToBucket);
    assert_eq!(items[0].percent, Some(0.0));
    assert!(h.persisted_ids().is_empty());

    h.transport.open();
    let task = upload.await.unwrap().unwrap();

    let items = manager.items().await;
    assert_eq!(items.len(), 1);
    let queued = items[0].as_task().unwrap();
    assert!(Arc::ptr_eq(queued, &task));
    assert_eq!(task.item(), &TaskItem::upload("/data/new.txt", "/data"));
    assert!(task.active_session());
    assert_eq!(h.persisted_ids(), ["T2"]);
    assert_eq!(h.backend.confirmed(), [TaskId::new("T2")]);

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://bucket/T2");
    assert_eq!(requests[0].headers(), vec![("x-amz-tagging", "v")]);

    assert_eq!(task.wait_finished().await, Some(JobStatus::Success));
    assert!(manager.items().await.is_empty());
    assert!(h.persisted_ids().is_empty());
    assert!(h.saver.saved().is_empty());

    let progress: Vec<f64> = h
        .emitter
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TaskEvent::TransferProgress { percent, .. } => Some(percent),
            _ => None,
        })
        .collect();
    assert_eq!(progress.last().copied(), Some(1.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn failed_transfer_leaves_nothing_behind() {
    let mut h = Harness::new(RecordingSaver::new());
    h.transport = ScriptedTransport::failing("connection reset");
    h.backend.on_upload_slot("T2", "https://bucket/T2", None);
    let manager = h.manager().await;

    let err = manager
        .upload("/data/new.txt", "/data", payload())
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::Transfer { .. }));
    assert!(err.to_string().contains("connection reset"));
    assert!(manager.items().await.is_empty());
    assert!(h.persisted_ids().is_empty());
    assert!(h.backend.confirmed().is_empty());
    assert_eq!(h.backend.status_calls("T2"), 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(manager.items().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_registration_leaves_nothing_behind() {
    let h = Harness::new(RecordingSaver::new());
    h.backend
        .on_upload_slot("T2", "https://bucket/T2", None)
        .fail_confirm(BackendError::rejected("Quota exceeded"));
    let manager = h.manager().await;

    let err = manager
        .upload("/data/new.txt", "/data", payload())
        .await
        .unwrap_err();

    assert_eq!(err, TaskError::registration("Quota exceeded"));
    assert!(manager.items().await.is_empty());
    assert_eq!(h.backend.status_calls("T2"), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_upload_slot_creates_no_entry() {
    let h = Harness::new(RecordingSaver::new());
    h.backend
        .fail_upload_slot(BackendError::rejected("Read-only folder"));
    let manager = h.manager().await;

    let err = manager
        .upload("/data/new.txt", "/data", payload())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Read-only folder");
    assert!(h.transport.requests().is_empty());
    assert_eq!(h.emitter.count("task:queue_snapshot"), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_transfer_aborts_the_upload() {
    let h = Harness::new(RecordingSaver::new());
    h.backend.on_upload_slot("T2", "https://bucket/T2", None);
    h.transport.close();
    let manager = h.manager().await;

    let uploader = manager.clone();
    let upload = tokio::spawn(async move {
        uploader
            .upload("/data/new.txt", "/data", payload())
            .await
    });
    wait_for_len(&manager, 1).await;

    manager.cancel_by_id(&TaskId::new("T2")).await.unwrap();

    let err = upload.await.unwrap().unwrap_err();
    assert_eq!(err, TaskError::transfer("cancelled"));
    assert!(manager.items().await.is_empty());
    assert!(h.backend.confirmed().is_empty());
    assert_eq!(h.backend.cancelled(), [TaskId::new("T2")]);
}

// ── Persistence ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn snapshot_skips_transfers_and_restores_inactive() {
    let h = Harness::new(RecordingSaver::new());
    h.backend
        .on_download(Ok("T1"))
        .on_status("T1", vec![report(JobStatus::Running)])
        .on_upload_slot("T2", "https://bucket/T2", None);
    h.transport.close();
    let manager = h.manager().await;

    manager.download("/data/file.txt").await.unwrap();
    let uploader = manager.clone();
    let upload = tokio::spawn(async move {
        uploader
            .upload("/data/new.txt", "/data", payload())
            .await
    });
    wait_for_len(&manager, 2).await;

    assert_eq!(h.persisted_ids(), ["T1"]);
    let raw = h.store.get_raw(STORAGE_KEY).unwrap();
    assert!(!raw.contains("upload-to-bucket"));

    manager.shutdown().await;
    assert!(upload.await.unwrap().is_err());
    assert_eq!(h.persisted_ids(), ["T1"]);

    let restored = h.manager().await;
    let items = restored.items().await;
    assert_eq!(items.len(), 1);
    let task = items[0].as_task().unwrap();
    assert_eq!(task.id(), &TaskId::new("T1"));
    assert_eq!(task.item(), &TaskItem::download("/data/file.txt"));
    assert!(!task.active_session());

    // Polling resumed for the restored task
    let calls = h.backend.status_calls("T1");
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(h.backend.status_calls("T1") > calls);
}

#[tokio::test(start_paused = true)]
async fn future_snapshot_version_is_ignored() {
    let h = Harness::new(RecordingSaver::new());
    h.store.set_raw(
        STORAGE_KEY,
        r#"{"version":2,"tasks":[{"id":"T1","item":{"path":"/a","type":"download"}}]}"#,
    );

    let manager = h.manager().await;

    assert!(manager.items().await.is_empty());
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.backend.status_calls("T1"), 0);
}

// ── Cancellation ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn cancel_removes_task_even_if_backend_fails() {
    let h = Harness::new(RecordingSaver::new());
    h.backend
        .on_download(Ok("T1"))
        .on_status("T1", vec![report(JobStatus::Running)])
        .fail_cancel(BackendError::transport_with_status("Internal error", 500));
    let manager = h.manager().await;

    let task = manager.download("/data/file.txt").await.unwrap();
    let entry = manager.get_task_by_id(&TaskId::new("T1")).await.unwrap();

    assert!(manager.cancel_task(&entry).await);

    assert!(manager.items().await.is_empty());
    assert!(h.persisted_ids().is_empty());
    assert_eq!(h.backend.cancelled(), [TaskId::new("T1")]);
    assert_eq!(task.wait_finished().await, None);

    let calls = h.backend.status_calls("T1");
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.backend.status_calls("T1"), calls);

    assert!(!manager.cancel_task(&entry).await);
    assert_eq!(
        manager.cancel_by_id(&TaskId::new("T1")).await.unwrap_err(),
        TaskError::not_in_queue("T1")
    );
}
