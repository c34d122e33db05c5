use bytes::Bytes;
use chrono::Duration;
use serde_json::json;

use papermill::application::ports::{
    BlobStore, DocumentRepository, SettingsRepository, TaskRepository,
};
use papermill::application::services::SubmitError;
use papermill::domain::{
    CollectionId, ConversionOptions, Document, OwnerId, StoragePath, Task, TaskStatus,
};

use crate::fixtures::{harness, Harness};

async fn seeded_blob(h: &Harness, owner_id: &OwnerId, filename: &str) -> StoragePath {
    let path = StoragePath::new(owner_id, filename);
    h.blobs
        .upload(&path, Bytes::from_static(b"%PDF-1.4 fake"))
        .await
        .expect("seed blob");
    path
}

#[tokio::test]
async fn given_stored_file_when_submitting_then_pending_task_with_dispatched_job_is_returned() {
    let h = harness();
    let owner_id = OwnerId::new();
    let path = seeded_blob(&h, &owner_id, "report.pdf").await;

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
    let job = task.metadata.worker_job.expect("worker job recorded");
    assert_eq!(job.job_id, "job-1");
    let filenames = h.worker.submitted_filenames.lock().unwrap();
    assert_eq!(filenames.len(), 1);
    assert_eq!(filenames[0], "report.pdf");
}

#[tokio::test]
async fn given_unwhitelisted_keys_in_defaults_and_request_then_worker_sees_only_whitelisted_ones()
{
    let h = harness();
    let owner_id = OwnerId::new();
    let path = seeded_blob(&h, &owner_id, "report.pdf").await;

    let mut defaults = ConversionOptions::new();
    defaults.set("parse_mode", json!("fast"));
    defaults.set("secret_override", json!("admin"));
    h.settings
        .put_default_options(owner_id, &defaults)
        .await
        .expect("store defaults");

    let mut options = ConversionOptions::new();
    options.set("chunk_size", json!(512));
    options.set("callback_url", json!("http://evil.example"));

    let task = h
        .orchestrator
        .submit_task(CollectionId::new(), owner_id, path, options)
        .await
        .expect("submit");

    let submitted = h.worker.submitted_options.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].get("parse_mode"), Some(&json!("fast")));
    assert_eq!(submitted[0].get("chunk_size"), Some(&json!(512)));
    assert!(!submitted[0].contains("secret_override"));
    assert!(!submitted[0].contains("callback_url"));

    // The persisted task carries the same sanitized set.
    assert!(!task.metadata.options.contains("secret_override"));
    assert!(!task.metadata.options.contains("callback_url"));
}

#[tokio::test]
async fn given_key_in_both_defaults_and_request_when_submitting_then_request_value_wins() {
    let h = harness();
    let owner_id = OwnerId::new();
    let path = seeded_blob(&h, &owner_id, "report.pdf").await;

    let mut defaults = ConversionOptions::new();
    defaults.set("parse_mode", json!("fast"));
    h.settings
        .put_default_options(owner_id, &defaults)
        .await
        .expect("store defaults");

    let mut options = ConversionOptions::new();
    options.set("parse_mode", json!("accurate"));

    h.orchestrator
        .submit_task(CollectionId::new(), owner_id, path, options)
        .await
        .expect("submit");

    let submitted = h.worker.submitted_options.lock().unwrap();
    assert_eq!(submitted[0].get("parse_mode"), Some(&json!("accurate")));
}

#[tokio::test]
async fn given_worker_rejection_when_submitting_then_failed_task_survives_and_error_is_raised() {
    let h = harness();
    let owner_id = OwnerId::new();
    let collection_id = CollectionId::new();
    let path = seeded_blob(&h, &owner_id, "report.pdf").await;
    h.worker.reject_submissions(422, "unsupported file type");

    let err = h
        .orchestrator
        .submit_task(collection_id, owner_id, path, ConversionOptions::new())
        .await
        .expect_err("submission must fail");
    assert!(matches!(err, SubmitError::Worker(_)));

    let tasks = h.orchestrator.list_tasks(collection_id).await.expect("list");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Failed);
    assert!(tasks[0]
        .metadata
        .error
        .as_deref()
        .is_some_and(|e| e.contains("unsupported file type")));
}

#[tokio::test]
async fn given_missing_blob_when_submitting_then_no_task_is_created_and_worker_is_not_called() {
    let h = harness();
    let owner_id = OwnerId::new();
    let collection_id = CollectionId::new();

    let err = h
        .orchestrator
        .submit_task(
            collection_id,
            owner_id,
            StoragePath::new(&owner_id, "missing.pdf"),
            ConversionOptions::new(),
        )
        .await
        .expect_err("submission must fail");
    assert!(matches!(err, SubmitError::Storage(_)));

    assert!(h
        .orchestrator
        .list_tasks(collection_id)
        .await
        .expect("list")
        .is_empty());
    assert!(h.worker.submitted_filenames.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_tasks_created_at_different_times_when_listing_then_newest_comes_first() {
    let h = harness();
    let collection_id = CollectionId::new();
    let owner_id = OwnerId::new();

    let mut older = Task::new(
        collection_id,
        owner_id,
        StoragePath::new(&owner_id, "older.pdf"),
        ConversionOptions::new(),
    );
    older.created_at -= Duration::minutes(5);
    let newer = Task::new(
        collection_id,
        owner_id,
        StoragePath::new(&owner_id, "newer.pdf"),
        ConversionOptions::new(),
    );
    h.tasks.create(&older).await.expect("create older");
    h.tasks.create(&newer).await.expect("create newer");

    let listed = h.orchestrator.list_tasks(collection_id).await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[1].id, older.id);
}

#[tokio::test]
async fn given_ingested_documents_when_deleting_task_then_only_the_task_row_goes() {
    let h = harness();
    let owner_id = OwnerId::new();
    let collection_id = CollectionId::new();
    let task = Task::new(
        collection_id,
        owner_id,
        StoragePath::new(&owner_id, "report.pdf"),
        ConversionOptions::new(),
    );
    h.tasks.create(&task).await.expect("create task");
    let document = Document::new(
        collection_id,
        owner_id,
        task.id,
        "report.pdf".to_string(),
        task.file_path.clone(),
        "full text".to_string(),
        json!(null),
    );
    h.documents
        .insert_document(&document)
        .await
        .expect("insert document");

    h.orchestrator.delete_task(task.id).await.expect("delete");

    assert!(h.tasks.get(task.id).await.expect("get").is_none());
    assert_eq!(h.documents.documents().len(), 1);
}

#[tokio::test]
async fn given_admin_calls_when_invoked_then_they_reach_the_worker() {
    let h = harness();

    h.orchestrator.cancel_all_running().await.expect("cancel");
    h.orchestrator.clear_all_results().await.expect("clear");

    use std::sync::atomic::Ordering;
    assert_eq!(h.worker.cancel_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.worker.clear_calls.load(Ordering::SeqCst), 1);
}
