use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::application::ports::{
    EmbeddingTrigger, RepositoryError, TaskRepository, WorkerClient, WorkerClientError,
};
use crate::domain::{Task, TaskPatch, TaskStatus};

use super::ingestion_writer::IngestionWriter;

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Time between reconciliation passes.
    pub interval: Duration,
    /// Cap on concurrent per-task reconciliations within one pass.
    pub max_concurrent: usize,
    /// A task `processing` longer than this logs a warning each pass.
    /// There is no automatic timeout-to-failed transition.
    pub stalled_after: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_concurrent: 4,
            stalled_after: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

/// Background process advancing every unsettled task: poll the worker,
/// map its status, cache the result, ingest exactly once, trigger embedding,
/// persist. Safe to run concurrently across tasks and redundantly for the
/// same task; exactly-once ingestion rests on the task store's
/// `try_mark_ingested` check-and-set, not on locking here.
pub struct Reconciler {
    tasks: Arc<dyn TaskRepository>,
    worker: Arc<dyn WorkerClient>,
    writer: Arc<IngestionWriter>,
    embedding: Arc<dyn EmbeddingTrigger>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        worker: Arc<dyn WorkerClient>,
        writer: Arc<IngestionWriter>,
        embedding: Arc<dyn EmbeddingTrigger>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            tasks,
            worker,
            writer,
            embedding,
            config,
        }
    }

    /// Periodic scheduler loop. Runs until the runtime shuts down.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            max_concurrent = self.config.max_concurrent,
            "Reconciler started"
        );
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = Arc::clone(&self).run_pass().await {
                tracing::error!(error = %e, "Reconciliation pass failed");
            }
        }
    }

    /// One pass over all unsettled tasks, with bounded fan-out.
    pub async fn run_pass(self: Arc<Self>) -> Result<usize, ReconcileError> {
        let pending = self.tasks.list_unsettled().await?;
        if pending.is_empty() {
            return Ok(0);
        }
        tracing::debug!(tasks = pending.len(), "Reconciling unsettled tasks");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut join_set = JoinSet::new();
        let count = pending.len();

        for task in pending {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let this = Arc::clone(&self);
            join_set.spawn(async move {
                let _permit = permit;
                let task_id = task.id;
                if let Err(e) = this.reconcile_task(task).await {
                    tracing::error!(
                        task_id = %task_id.as_uuid(),
                        error = %e,
                        "Task reconciliation failed"
                    );
                }
            });
        }
        while join_set.join_next().await.is_some() {}

        Ok(count)
    }

    /// Advances a single task. Invoked from the periodic pass; redundant
    /// invocations for the same task are harmless.
    #[tracing::instrument(skip(self, task), fields(task_id = %task.id.as_uuid(), status = %task.status))]
    pub async fn reconcile_task(&self, task: Task) -> Result<(), ReconcileError> {
        if task.is_settled() {
            return Ok(());
        }

        let Some(job) = task.metadata.worker_job.clone() else {
            tracing::warn!("Unsettled task has no worker job recorded, skipping");
            return Ok(());
        };

        let snapshot = match self.worker.poll(&job.job_id).await {
            Ok(snapshot) => snapshot,
            Err(WorkerClientError::Unavailable(e)) => {
                // Transient: leave the task untouched, retry next pass.
                tracing::debug!(error = %e, "Worker poll unavailable, leaving task unchanged");
                return Ok(());
            }
            Err(WorkerClientError::Rejected { status, message }) => {
                tracing::warn!(
                    http_status = status,
                    message = %message,
                    "Worker rejected poll, leaving task unchanged"
                );
                return Ok(());
            }
        };

        let Some(new_status) = TaskStatus::from_worker_status(&snapshot.status) else {
            tracing::debug!(
                worker_status = %snapshot.status,
                "Unknown worker status, leaving task unchanged"
            );
            return Ok(());
        };

        // Nothing to do when the status is unchanged, unless a completed
        // task still owes its ingestion.
        if new_status == task.status
            && (new_status != TaskStatus::Completed || task.metadata.ingested)
        {
            self.warn_if_stalled(&task);
            return Ok(());
        }

        let mut patch = TaskPatch {
            status: Some(new_status),
            worker_status_snapshot: Some(snapshot.raw.clone()),
            last_sync: Some(Utc::now()),
            ..TaskPatch::default()
        };

        match new_status {
            TaskStatus::Failed => {
                patch.error = Some(worker_error_message(&snapshot.raw));
                tracing::info!(error = ?patch.error, "Worker reported failure");
            }
            TaskStatus::Completed => {
                let result = match task.metadata.worker_result.clone() {
                    Some(cached) => Some(cached),
                    None => match self.worker.fetch_result(&job.job_id).await {
                        Ok(result) => {
                            // Cached regardless of what happens next, so it
                            // is never fetched twice.
                            patch.worker_result = Some(result.clone());
                            Some(result)
                        }
                        Err(WorkerClientError::Unavailable(e)) => {
                            tracing::debug!(error = %e, "Result fetch unavailable, retrying next pass");
                            None
                        }
                        Err(WorkerClientError::Rejected { status, message }) => {
                            tracing::error!(
                                http_status = status,
                                message = %message,
                                "Worker refused to hand over result"
                            );
                            patch.status = Some(TaskStatus::Failed);
                            patch.error = Some(format!("result unavailable: {}", message));
                            None
                        }
                    },
                };

                if let Some(result) = result {
                    if !task.metadata.ingested {
                        self.ingest_once(&task, &result).await?;
                    }
                }
            }
            TaskStatus::Pending | TaskStatus::Processing => {
                self.warn_if_stalled(&task);
            }
        }

        self.tasks.update(task.id, patch).await?;
        Ok(())
    }

    /// Claims the ingestion guard before writing anything, so two
    /// overlapping passes can never both materialize the result.
    async fn ingest_once(
        &self,
        task: &Task,
        result: &crate::domain::WorkerResult,
    ) -> Result<(), ReconcileError> {
        if !self.tasks.try_mark_ingested(task.id).await? {
            tracing::debug!("Ingestion already claimed by another pass");
            return Ok(());
        }

        let outcome = self.writer.ingest(task, result).await;
        tracing::info!(
            documents = outcome.document_ids.len(),
            chunks = outcome.chunk_count,
            "Task output ingested"
        );

        for (filename, document_id) in &outcome.document_ids {
            if let Err(e) = self.embedding.trigger(*document_id).await {
                // Not fatal and never reverts `ingested`: the rows are
                // durable, re-triggering embedding is the recovery path.
                tracing::warn!(
                    error = %e,
                    filename = %filename,
                    document_id = %document_id.as_uuid(),
                    "Embedding trigger failed"
                );
            }
        }
        Ok(())
    }

    fn warn_if_stalled(&self, task: &Task) {
        if task.status != TaskStatus::Processing {
            return;
        }
        let age = Utc::now().signed_duration_since(task.created_at);
        if age.to_std().unwrap_or_default() > self.config.stalled_after {
            tracing::warn!(
                age_secs = age.num_seconds(),
                "Task processing beyond stall threshold"
            );
        }
    }
}

/// Pulls a human-readable error out of the worker's raw poll response.
fn worker_error_message(raw: &serde_json::Value) -> String {
    for key in ["error", "message", "detail"] {
        if let Some(msg) = raw.get(key).and_then(|v| v.as_str()) {
            if !msg.is_empty() {
                return msg.to_string();
            }
        }
    }
    "worker reported failure".to_string()
}
