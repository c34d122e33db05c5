use std::sync::Arc;

use crate::application::ports::{
    BlobStore, BlobStoreError, RepositoryError, SettingsRepository, TaskRepository, WorkerClient,
    WorkerClientError,
};
use crate::domain::{
    CollectionId, ConversionOptions, OwnerId, StoragePath, Task, TaskId, TaskPatch, TaskStatus,
    WorkerJob,
};

/// Public operations of the ingestion orchestrator: submit, list, get,
/// delete, plus the best-effort worker admin calls. Reconciliation runs in
/// its own periodic loop; reads here return the last persisted state only.
pub struct Orchestrator {
    tasks: Arc<dyn TaskRepository>,
    settings: Arc<dyn SettingsRepository>,
    blobs: Arc<dyn BlobStore>,
    worker: Arc<dyn WorkerClient>,
}

impl Orchestrator {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        settings: Arc<dyn SettingsRepository>,
        blobs: Arc<dyn BlobStore>,
        worker: Arc<dyn WorkerClient>,
    ) -> Self {
        Self {
            tasks,
            settings,
            blobs,
            worker,
        }
    }

    /// Reads the stored file, creates a `pending` task and dispatches the
    /// conversion job. A worker failure is persisted on the task (so the
    /// failed record survives in history) and re-raised to the caller.
    #[tracing::instrument(
        skip(self, options),
        fields(
            collection_id = %collection_id.as_uuid(),
            owner_id = %owner_id.as_uuid(),
            file_path = %file_path
        )
    )]
    pub async fn submit_task(
        &self,
        collection_id: CollectionId,
        owner_id: OwnerId,
        file_path: StoragePath,
        options: ConversionOptions,
    ) -> Result<Task, SubmitError> {
        let defaults = self.settings.default_options(owner_id).await?;
        let (sanitized, stripped) = options.merged_over(&defaults).sanitized();
        for key in &stripped {
            tracing::warn!(key = %key, "Stripped non-whitelisted option key");
        }

        let data = self.blobs.download(&file_path).await?;
        tracing::debug!(bytes = data.len(), "Source file downloaded");

        let task = Task::new(collection_id, owner_id, file_path.clone(), sanitized.clone());
        self.tasks.create(&task).await?;

        match self
            .worker
            .submit(data, file_path.filename(), &sanitized)
            .await
        {
            Ok(job_ref) => {
                let patch = TaskPatch {
                    worker_job: Some(WorkerJob::new(job_ref.job_id.clone(), sanitized)),
                    ..TaskPatch::default()
                };
                let task = self.tasks.update(task.id, patch).await?;
                tracing::info!(
                    task_id = %task.id.as_uuid(),
                    job_id = %job_ref.job_id,
                    "Conversion job dispatched"
                );
                Ok(task)
            }
            Err(e) => {
                let patch = TaskPatch {
                    status: Some(TaskStatus::Failed),
                    error: Some(e.to_string()),
                    ..TaskPatch::default()
                };
                if let Err(update_err) = self.tasks.update(task.id, patch).await {
                    tracing::error!(
                        task_id = %task.id.as_uuid(),
                        error = %update_err,
                        "Failed to persist submission failure"
                    );
                }
                Err(SubmitError::Worker(e))
            }
        }
    }

    /// Last-persisted snapshot, newest first.
    pub async fn list_tasks(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Task>, RepositoryError> {
        self.tasks.list_by_collection(collection_id).await
    }

    pub async fn get_task(&self, task_id: TaskId) -> Result<Option<Task>, RepositoryError> {
        self.tasks.get(task_id).await
    }

    /// Hard-deletes the task row only. Already-ingested documents and
    /// chunks belong to the knowledge-base domain and are left alone.
    pub async fn delete_task(&self, task_id: TaskId) -> Result<(), RepositoryError> {
        self.tasks.delete(task_id).await
    }

    pub async fn cancel_all_running(&self) -> Result<(), WorkerClientError> {
        self.worker.cancel_all().await
    }

    pub async fn clear_all_results(&self) -> Result<(), WorkerClientError> {
        self.worker.clear_results().await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("storage: {0}")]
    Storage(#[from] BlobStoreError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("worker: {0}")]
    Worker(#[from] WorkerClientError),
}
