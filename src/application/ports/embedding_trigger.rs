use async_trait::async_trait;

use crate::domain::DocumentId;

/// Fire-and-forget call that marks a document for vector embedding.
/// Failures are logged by callers, never fatal: documents and chunks are
/// already durable, and re-triggering embedding is the recovery path.
#[async_trait]
pub trait EmbeddingTrigger: Send + Sync {
    async fn trigger(&self, document_id: DocumentId) -> Result<(), EmbeddingTriggerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingTriggerError {
    #[error("embedding trigger failed: {0}")]
    Unavailable(String),
}
