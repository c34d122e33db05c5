use async_trait::async_trait;
use sqlx::PgPool;

use crate::application::ports::{DocumentRepository, RepositoryError};
use crate::domain::{Chunk, Document};

pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    #[tracing::instrument(skip(self, document), fields(document_id = %document.id.as_uuid(), title = %document.title))]
    async fn insert_document(&self, document: &Document) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_value(&document.metadata)
            .map_err(|e| RepositoryError::QueryFailed(format!("metadata encode: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, collection_id, owner_id, title, source, content, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(document.collection_id.as_uuid())
        .bind(document.owner_id.as_uuid())
        .bind(&document.title)
        .bind(document.source.as_str())
        .bind(&document.content)
        .bind(metadata)
        .bind(document.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// All rows in one transaction; any failure rolls the whole batch back
    /// so the caller can retry row by row.
    #[tracing::instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, document_id, content, chunk_index, token_count, metadata)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(chunk.id.as_uuid())
            .bind(chunk.document_id.as_uuid())
            .bind(&chunk.content)
            .bind(chunk.chunk_index as i32)
            .bind(chunk.token_count as i32)
            .bind(&chunk.metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[tracing::instrument(skip(self, chunk), fields(chunk_id = %chunk.id.as_uuid()))]
    async fn insert_chunk(&self, chunk: &Chunk) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chunks (id, document_id, content, chunk_index, token_count, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(chunk.id.as_uuid())
        .bind(chunk.document_id.as_uuid())
        .bind(&chunk.content)
        .bind(chunk.chunk_index as i32)
        .bind(chunk.token_count as i32)
        .bind(&chunk.metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
