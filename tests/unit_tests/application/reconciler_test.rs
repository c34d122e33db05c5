use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use bytes::Bytes;

use papermill::application::ports::{
    BlobStore, TaskRepository, WorkerClientError, WorkerStatusSnapshot,
};
use papermill::application::services::{IngestionWriter, Reconciler, ReconcilerConfig};
use papermill::domain::{
    CollectionId, ConversionOptions, OwnerId, StoragePath, Task, TaskPatch, TaskStatus,
};

use crate::fixtures::{dispatched_task, harness, result_for_file_pdf, Harness};

async fn run_pass(h: &Harness) -> usize {
    Arc::clone(&h.reconciler).run_pass().await.expect("pass")
}

async fn stored(h: &Harness, task: &Task) -> Task {
    h.tasks
        .get(task.id)
        .await
        .expect("get task")
        .expect("task exists")
}

#[tokio::test]
async fn given_running_then_completed_worker_when_passes_run_then_task_reaches_ingested_completed()
{
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;

    h.worker.push_poll_status("running");
    assert_eq!(run_pass(&h).await, 1);

    let after_first = stored(&h, &task).await;
    assert_eq!(after_first.status, TaskStatus::Processing);
    assert!(!after_first.metadata.ingested);
    assert!(after_first.metadata.last_sync.is_some());

    h.worker.push_poll_status("completed");
    h.worker.set_result(result_for_file_pdf());
    assert_eq!(run_pass(&h).await, 1);

    let after_second = stored(&h, &task).await;
    assert_eq!(after_second.status, TaskStatus::Completed);
    assert!(after_second.metadata.ingested);
    assert!(after_second.metadata.worker_result.is_some());
    assert!(after_second.metadata.error.is_none());

    assert_eq!(h.documents.documents().len(), 1);
    assert_eq!(h.documents.chunks().len(), 2);
    assert_eq!(h.embedding.triggered().len(), 1);
}

#[tokio::test]
async fn given_submitted_file_when_worker_finishes_then_full_lifecycle_lands_documents() {
    let h = harness();
    let owner_id = OwnerId::new();
    let path = StoragePath::new(&owner_id, "file.pdf");
    h.blobs
        .upload(&path, Bytes::from_static(b"%PDF-1.4 body"))
        .await
        .expect("seed blob");

    let task = h
        .orchestrator
        .submit_task(
            CollectionId::new(),
            owner_id,
            path,
            ConversionOptions::new(),
        )
        .await
        .expect("submit");
    assert_eq!(task.status, TaskStatus::Pending);

    h.worker.push_poll_status("processing");
    run_pass(&h).await;
    assert_eq!(stored(&h, &task).await.status, TaskStatus::Processing);

    h.worker.push_poll_status("success");
    h.worker.set_result(result_for_file_pdf());
    run_pass(&h).await;

    let final_task = stored(&h, &task).await;
    assert_eq!(final_task.status, TaskStatus::Completed);
    assert!(final_task.metadata.ingested);
    assert_eq!(h.documents.documents().len(), 1);
    assert_eq!(h.documents.chunks().len(), 2);
}

#[tokio::test]
async fn given_two_overlapping_reconciliations_when_both_see_completed_then_ingestion_runs_once() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.worker.push_poll_status("completed");
    h.worker.set_result(result_for_file_pdf());

    let (a, b) = tokio::join!(
        h.reconciler.reconcile_task(task.clone()),
        h.reconciler.reconcile_task(task.clone()),
    );
    a.expect("first reconciliation");
    b.expect("second reconciliation");

    assert_eq!(h.documents.documents().len(), 1);
    assert_eq!(h.documents.chunks().len(), 2);
    assert_eq!(h.embedding.triggered().len(), 1);
    assert!(stored(&h, &task).await.metadata.ingested);
}

#[tokio::test]
async fn given_transient_poll_failures_when_passes_run_then_task_is_left_untouched() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.worker.push_poll(Err(WorkerClientError::Unavailable(
        "connection refused".to_string(),
    )));

    for _ in 0..3 {
        run_pass(&h).await;
    }

    let after = stored(&h, &task).await;
    assert_eq!(after.status, TaskStatus::Pending);
    assert!(after.metadata.error.is_none());
    assert!(after.metadata.last_sync.is_none());
    assert_eq!(h.worker.poll_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_worker_failure_status_when_reconciling_then_task_fails_with_worker_message() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.worker.push_poll(Ok(WorkerStatusSnapshot {
        status: "failed".to_string(),
        raw: json!({ "status": "failed", "error": "ocr engine crashed" }),
    }));

    run_pass(&h).await;

    let after = stored(&h, &task).await;
    assert_eq!(after.status, TaskStatus::Failed);
    assert_eq!(after.metadata.error.as_deref(), Some("ocr engine crashed"));
    assert_eq!(h.worker.fetch_calls.load(Ordering::SeqCst), 0);
    assert!(h.documents.documents().is_empty());
}

#[tokio::test]
async fn given_unknown_worker_status_when_reconciling_then_task_is_left_unchanged() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.worker.push_poll_status("warming_up");

    run_pass(&h).await;

    let after = stored(&h, &task).await;
    assert_eq!(after.status, TaskStatus::Pending);
    assert!(after.metadata.last_sync.is_none());
}

#[tokio::test]
async fn given_settled_tasks_when_pass_runs_then_worker_is_not_polled() {
    let h = harness();
    dispatched_task(&h, "owner/file.pdf").await;
    h.worker.push_poll_status("completed");
    h.worker.set_result(result_for_file_pdf());
    run_pass(&h).await;

    let polls_before = h.worker.poll_calls.load(Ordering::SeqCst);
    assert_eq!(run_pass(&h).await, 0);
    assert_eq!(h.worker.poll_calls.load(Ordering::SeqCst), polls_before);
}

#[tokio::test]
async fn given_embedding_outage_when_ingesting_then_task_still_completes_ingested() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.embedding.fail_all();
    h.worker.push_poll_status("completed");
    h.worker.set_result(result_for_file_pdf());

    run_pass(&h).await;

    let after = stored(&h, &task).await;
    assert_eq!(after.status, TaskStatus::Completed);
    assert!(after.metadata.ingested);
    assert_eq!(h.documents.chunks().len(), 2);
    assert!(h.embedding.triggered().is_empty());
}

#[tokio::test]
async fn given_transient_result_fetch_failure_when_next_pass_runs_then_ingestion_catches_up() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.worker.push_poll_status("completed");
    h.worker
        .set_result_error(WorkerClientError::Unavailable("timeout".to_string()));

    run_pass(&h).await;

    let after_first = stored(&h, &task).await;
    assert_eq!(after_first.status, TaskStatus::Completed);
    assert!(!after_first.metadata.ingested);
    assert!(h.documents.documents().is_empty());

    // The completed-but-not-ingested task is still listed as unsettled.
    h.worker.set_result(result_for_file_pdf());
    assert_eq!(run_pass(&h).await, 1);

    let after_second = stored(&h, &task).await;
    assert!(after_second.metadata.ingested);
    assert_eq!(h.documents.chunks().len(), 2);
    assert_eq!(h.worker.fetch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn given_worker_refusing_result_when_reconciling_then_task_fails() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.worker.push_poll_status("completed");
    h.worker.set_result_error(WorkerClientError::Rejected {
        status: 404,
        message: "result purged".to_string(),
    });

    run_pass(&h).await;

    let after = stored(&h, &task).await;
    assert_eq!(after.status, TaskStatus::Failed);
    assert_eq!(
        after.metadata.error.as_deref(),
        Some("result unavailable: result purged")
    );
    assert!(h.documents.documents().is_empty());
}

#[tokio::test]
async fn given_cached_worker_result_when_reconciling_then_result_is_not_fetched_again() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.tasks
        .update(
            task.id,
            TaskPatch {
                worker_result: Some(result_for_file_pdf()),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("cache result");
    h.worker.push_poll_status("completed");

    run_pass(&h).await;

    assert_eq!(h.worker.fetch_calls.load(Ordering::SeqCst), 0);
    let after = stored(&h, &task).await;
    assert!(after.metadata.ingested);
    assert_eq!(h.documents.chunks().len(), 2);
}

#[tokio::test]
async fn given_task_without_worker_job_when_reconciling_then_it_is_skipped() {
    let h = harness();
    let task = Task::new(
        CollectionId::new(),
        OwnerId::new(),
        StoragePath::from_raw("owner/file.pdf"),
        ConversionOptions::new(),
    );
    h.tasks.create(&task).await.expect("create task");

    run_pass(&h).await;

    assert_eq!(h.worker.poll_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stored(&h, &task).await.status, TaskStatus::Pending);
}

#[tokio::test]
async fn given_task_past_stall_threshold_when_reconciling_then_it_is_never_auto_failed() {
    let h = harness();
    let task = dispatched_task(&h, "owner/file.pdf").await;
    h.tasks
        .update(
            task.id,
            TaskPatch {
                status: Some(TaskStatus::Processing),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("mark processing");

    let reconciler = Arc::new(Reconciler::new(
        h.tasks.clone(),
        h.worker.clone(),
        Arc::new(IngestionWriter::new(h.documents.clone())),
        h.embedding.clone(),
        ReconcilerConfig {
            interval: Duration::from_millis(10),
            max_concurrent: 4,
            stalled_after: Duration::ZERO,
        },
    ));
    h.worker.push_poll_status("running");
    reconciler.run_pass().await.expect("pass");

    let after = stored(&h, &task).await;
    assert_eq!(after.status, TaskStatus::Processing);
    assert!(after.metadata.error.is_none());
}
