use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::application::ports::{RepositoryError, TaskRepository};
use crate::domain::{
    CollectionId, OwnerId, StoragePath, Task, TaskId, TaskMetadata, TaskPatch, TaskStatus,
};

pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn task_from_row(row: &PgRow) -> Result<Task, RepositoryError> {
    let status: String = row
        .try_get("status")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let status = status
        .parse::<TaskStatus>()
        .map_err(RepositoryError::QueryFailed)?;

    let metadata: serde_json::Value = row
        .try_get("metadata")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let metadata: TaskMetadata = serde_json::from_value(metadata)
        .map_err(|e| RepositoryError::QueryFailed(format!("metadata decode: {e}")))?;

    let id: Uuid = row
        .try_get("id")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let collection_id: Uuid = row
        .try_get("collection_id")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let owner_id: Uuid = row
        .try_get("owner_id")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let file_path: String = row
        .try_get("file_path")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

    Ok(Task {
        id: TaskId::from_uuid(id),
        collection_id: CollectionId::from_uuid(collection_id),
        owner_id: OwnerId::from_uuid(owner_id),
        file_path: StoragePath::from_raw(file_path),
        status,
        metadata,
        created_at,
        updated_at,
    })
}

const SELECT_COLUMNS: &str =
    "id, collection_id, owner_id, file_path, status, metadata, created_at, updated_at";

#[async_trait]
impl TaskRepository for PgTaskRepository {
    #[tracing::instrument(skip(self, task), fields(task_id = %task.id.as_uuid()))]
    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_value(&task.metadata)
            .map_err(|e| RepositoryError::QueryFailed(format!("metadata encode: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, collection_id, owner_id, file_path, status, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(task.id.as_uuid())
        .bind(task.collection_id.as_uuid())
        .bind(task.owner_id.as_uuid())
        .bind(task.file_path.as_str())
        .bind(task.status.as_str())
        .bind(metadata)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(task_id = %id.as_uuid()))]
    async fn get(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(task_from_row).transpose()
    }

    #[tracing::instrument(skip(self), fields(collection_id = %collection_id.as_uuid()))]
    async fn list_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM tasks WHERE collection_id = $1 ORDER BY created_at DESC"
        ))
        .bind(collection_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(task_from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn list_unsettled(&self) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM tasks \
             WHERE status IN ('pending', 'processing') \
                OR (status = 'completed' \
                    AND COALESCE((metadata->>'ingested')::boolean, false) = false) \
             ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(task_from_row).collect()
    }

    /// Read-modify-write inside a transaction with a row lock, so two
    /// concurrent patches merge instead of overwriting each other.
    #[tracing::instrument(skip(self, patch), fields(task_id = %id.as_uuid()))]
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound(format!(
                "task {}",
                id.as_uuid()
            )));
        };
        let mut task = task_from_row(&row)?;
        task.apply(&patch);

        let metadata = serde_json::to_value(&task.metadata)
            .map_err(|e| RepositoryError::QueryFailed(format!("metadata encode: {e}")))?;

        sqlx::query(
            r#"
            UPDATE tasks
            SET status = $1, metadata = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(task.status.as_str())
        .bind(metadata)
        .bind(task.updated_at)
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(task)
    }

    /// Conditional update at the storage layer: only the caller whose
    /// UPDATE matches `ingested = false` wins the claim.
    #[tracing::instrument(skip(self), fields(task_id = %id.as_uuid()))]
    async fn try_mark_ingested(&self, id: TaskId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET metadata = jsonb_set(metadata, '{ingested}', 'true'::jsonb),
                updated_at = $2
            WHERE id = $1
              AND COALESCE((metadata->>'ingested')::boolean, false) = false
            "#,
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(task_id = %id.as_uuid()))]
    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        Ok(())
    }
}
