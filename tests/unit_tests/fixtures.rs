use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use papermill::application::ports::{
    BlobStore, DocumentRepository, EmbeddingTrigger, SettingsRepository, TaskRepository,
    WorkerClient,
};
use papermill::application::services::{
    IngestionWriter, Orchestrator, Reconciler, ReconcilerConfig,
};
use papermill::domain::{
    CollectionId, ConversionOptions, OwnerId, StoragePath, Task, TaskPatch, WorkerChunk,
    WorkerDocument, WorkerJob, WorkerResult,
};
use papermill::infrastructure::embedding::MockEmbeddingTrigger;
use papermill::infrastructure::persistence::{
    InMemoryDocumentRepository, InMemorySettingsRepository, InMemoryTaskRepository,
};
use papermill::infrastructure::storage::MockBlobStore;
use papermill::infrastructure::worker::MockWorkerClient;

/// Fully wired orchestrator + reconciler over in-memory fakes.
pub struct Harness {
    pub tasks: Arc<InMemoryTaskRepository>,
    pub documents: Arc<InMemoryDocumentRepository>,
    pub settings: Arc<InMemorySettingsRepository>,
    pub blobs: Arc<MockBlobStore>,
    pub worker: Arc<MockWorkerClient>,
    pub embedding: Arc<MockEmbeddingTrigger>,
    pub reconciler: Arc<Reconciler>,
    pub orchestrator: Orchestrator,
}

pub fn harness() -> Harness {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let documents = Arc::new(InMemoryDocumentRepository::new());
    let settings = Arc::new(InMemorySettingsRepository::new());
    let blobs = Arc::new(MockBlobStore::new());
    let worker = Arc::new(MockWorkerClient::new());
    let embedding = Arc::new(MockEmbeddingTrigger::new());

    // The harness keeps concrete handles for inspection; the services see
    // the same instances through their port types.
    let task_port: Arc<dyn TaskRepository> = tasks.clone();
    let document_port: Arc<dyn DocumentRepository> = documents.clone();
    let settings_port: Arc<dyn SettingsRepository> = settings.clone();
    let blob_port: Arc<dyn BlobStore> = blobs.clone();
    let worker_port: Arc<dyn WorkerClient> = worker.clone();
    let embedding_port: Arc<dyn EmbeddingTrigger> = embedding.clone();

    let writer = Arc::new(IngestionWriter::new(document_port));
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&task_port),
        Arc::clone(&worker_port),
        writer,
        embedding_port,
        ReconcilerConfig {
            interval: Duration::from_millis(10),
            max_concurrent: 4,
            stalled_after: Duration::from_secs(3600),
        },
    ));
    let orchestrator = Orchestrator::new(task_port, settings_port, blob_port, worker_port);

    Harness {
        tasks,
        documents,
        settings,
        blobs,
        worker,
        embedding,
        reconciler,
        orchestrator,
    }
}

/// A task already created in the store with a dispatched worker job,
/// the state submit_task leaves behind.
pub async fn dispatched_task(harness: &Harness, file_path: &str) -> Task {
    let task = Task::new(
        CollectionId::new(),
        OwnerId::new(),
        StoragePath::from_raw(file_path),
        ConversionOptions::new(),
    );
    harness.tasks.create(&task).await.expect("create task");
    harness
        .tasks
        .update(
            task.id,
            TaskPatch {
                worker_job: Some(WorkerJob::new(
                    "job-1".to_string(),
                    ConversionOptions::new(),
                )),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("record worker job")
}

pub fn worker_document(filename: &str, content: &str) -> WorkerDocument {
    WorkerDocument {
        filename: filename.to_string(),
        content: content.to_string(),
        metadata: Value::Null,
    }
}

pub fn worker_chunk(filename: &str, content: &str) -> WorkerChunk {
    WorkerChunk {
        filename: filename.to_string(),
        content: content.to_string(),
        chunk_index: None,
        token_count: Some(content.split_whitespace().count() as u32),
        metadata: json!({ "page": 1 }),
    }
}

pub fn result_for_file_pdf() -> WorkerResult {
    WorkerResult {
        documents: vec![worker_document("file.pdf", "Full text of file.pdf")],
        chunks: vec![
            worker_chunk("file.pdf", "First section of the report."),
            worker_chunk("file.pdf", "   "),
            worker_chunk("file.pdf", "Second section of the report."),
        ],
    }
}
