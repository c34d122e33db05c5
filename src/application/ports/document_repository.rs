use async_trait::async_trait;

use crate::domain::{Chunk, Document};

use super::RepositoryError;

/// Write side of the knowledge-base store. The ingestion writer is the only
/// caller; documents and chunks are owned by the knowledge-base domain once
/// written.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert_document(&self, document: &Document) -> Result<(), RepositoryError>;

    /// All-or-nothing batch insert. Callers fall back to `insert_chunk`
    /// per row when the batch fails.
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<(), RepositoryError>;

    async fn insert_chunk(&self, chunk: &Chunk) -> Result<(), RepositoryError>;
}
