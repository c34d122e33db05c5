use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::conversion_options::ConversionOptions;
use super::storage_path::StoragePath;
use super::task_status::TaskStatus;
use super::worker_result::WorkerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(Uuid);

impl CollectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference to the conversion job dispatched to the worker, with the
/// sanitized option set echoed at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerJob {
    pub job_id: String,
    pub submitted_at: DateTime<Utc>,
    pub options_echo: ConversionOptions,
}

impl WorkerJob {
    pub fn new(job_id: String, options_echo: ConversionOptions) -> Self {
        Self {
            job_id,
            submitted_at: Utc::now(),
            options_echo,
        }
    }
}

/// Typed task metadata. Persisted as JSONB; every write goes through
/// [`TaskMetadata::apply`] so concurrent writers merge fields instead of
/// clobbering each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Conversion options fixed at submission time.
    #[serde(default)]
    pub options: ConversionOptions,
    #[serde(default)]
    pub worker_job: Option<WorkerJob>,
    /// Last raw poll response from the worker.
    #[serde(default)]
    pub worker_status_snapshot: Option<Value>,
    /// Structured result, fetched from the worker at most once.
    #[serde(default)]
    pub worker_result: Option<WorkerResult>,
    /// Exactly-once ingestion guard. Set only through
    /// `TaskRepository::try_mark_ingested`, never through a patch.
    #[serde(default)]
    pub ingested: bool,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskMetadata {
    fn apply(&mut self, patch: &TaskPatch) {
        if let Some(job) = &patch.worker_job {
            self.worker_job = Some(job.clone());
        }
        if let Some(snapshot) = &patch.worker_status_snapshot {
            self.worker_status_snapshot = Some(snapshot.clone());
        }
        if let Some(result) = &patch.worker_result {
            self.worker_result = Some(result.clone());
        }
        if let Some(last_sync) = patch.last_sync {
            self.last_sync = Some(last_sync);
        }
        if let Some(error) = &patch.error {
            self.error = Some(error.clone());
        }
    }
}

/// Partial update to a task. `None` fields are left untouched by the merge;
/// `options` and `ingested` are deliberately absent so they cannot be
/// rewritten after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub worker_job: Option<WorkerJob>,
    pub worker_status_snapshot: Option<Value>,
    pub worker_result: Option<WorkerResult>,
    pub last_sync: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// A single request to convert and chunk one stored file.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub collection_id: CollectionId,
    pub owner_id: OwnerId,
    pub file_path: StoragePath,
    pub status: TaskStatus,
    pub metadata: TaskMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        collection_id: CollectionId,
        owner_id: OwnerId,
        file_path: StoragePath,
        options: ConversionOptions,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            collection_id,
            owner_id,
            file_path,
            status: TaskStatus::Pending,
            metadata: TaskMetadata {
                options,
                ..TaskMetadata::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// True once reconciliation owes this task nothing more. `completed`
    /// alone is not enough: a transient result-fetch failure can persist
    /// `completed` before ingestion, and that task must be revisited.
    pub fn is_settled(&self) -> bool {
        match self.status {
            TaskStatus::Pending | TaskStatus::Processing => false,
            TaskStatus::Completed => self.metadata.ingested,
            TaskStatus::Failed => true,
        }
    }

    /// Merges a patch into the task. Status moves only along permitted
    /// transitions; a patch that would leave a terminal state keeps the
    /// current status and still merges the metadata fields.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(next) = patch.status {
            if self.status.can_transition_to(next) {
                self.status = next;
            }
        }
        self.metadata.apply(patch);
        self.updated_at = Utc::now();
    }
}
