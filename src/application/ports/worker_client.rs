use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::domain::{ConversionOptions, WorkerResult};

/// Acknowledgement of a submitted conversion job.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerJobRef {
    pub job_id: String,
}

/// Raw poll response. `status` is the worker's own vocabulary; mapping onto
/// task statuses happens in the reconciler, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStatusSnapshot {
    pub status: String,
    pub raw: Value,
}

/// Contract wrapper around the external conversion worker service.
///
/// Submitting does not touch the task store; that composition belongs to
/// the orchestrator facade.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    async fn submit(
        &self,
        file: Bytes,
        filename: &str,
        options: &ConversionOptions,
    ) -> Result<WorkerJobRef, WorkerClientError>;

    /// Callers must treat `Unavailable` as transient, never task-failing.
    async fn poll(&self, job_id: &str) -> Result<WorkerStatusSnapshot, WorkerClientError>;

    /// Only valid once `poll` reports a terminal success status.
    async fn fetch_result(&self, job_id: &str) -> Result<WorkerResult, WorkerClientError>;

    /// Best-effort: ask the worker to abandon all in-flight jobs.
    async fn cancel_all(&self) -> Result<(), WorkerClientError>;

    /// Best-effort: purge the worker's result cache.
    async fn clear_results(&self) -> Result<(), WorkerClientError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerClientError {
    /// Network error or timeout; retried on the next reconciliation pass.
    #[error("worker unavailable: {0}")]
    Unavailable(String),
    /// The worker refused the request; permanent for this submission.
    #[error("worker rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}
