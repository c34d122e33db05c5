use async_trait::async_trait;

use crate::domain::{CollectionId, Task, TaskId, TaskPatch};

use super::RepositoryError;

/// Durable store of ingestion tasks.
///
/// `update` is a field-level merge: implementations must read-modify-write
/// (or merge at the storage layer) so concurrent patches never clobber
/// unrelated metadata fields.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<(), RepositoryError>;

    async fn get(&self, id: TaskId) -> Result<Option<Task>, RepositoryError>;

    /// Tasks for a collection, newest first.
    async fn list_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Task>, RepositoryError>;

    /// Every task the reconciler still owes work, across all collections:
    /// non-terminal tasks plus `completed` ones whose result was never
    /// ingested (see [`Task::is_settled`]).
    ///
    /// [`Task::is_settled`]: crate::domain::Task::is_settled
    async fn list_unsettled(&self) -> Result<Vec<Task>, RepositoryError>;

    /// Merges the patch into the stored task and returns the merged row.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, RepositoryError>;

    /// Atomic check-and-set of the exactly-once ingestion guard. Returns
    /// `true` for the single caller that flips `ingested` false -> true;
    /// every later (or concurrent) caller gets `false`.
    async fn try_mark_ingested(&self, id: TaskId) -> Result<bool, RepositoryError>;

    /// Hard-deletes the task row. Does not cascade to documents or chunks.
    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError>;
}
