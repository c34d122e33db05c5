use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::document::DocumentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(Uuid);

impl ChunkId {
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

impl Default for ChunkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Retrieval unit owned by exactly one document; cascade-deleted with it.
/// Content is guaranteed non-empty by the ingestion writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: DocumentId,
    pub content: String,
    pub chunk_index: u32,
    pub token_count: u32,
    /// Headings, captions, page numbers, source filename, task id.
    pub metadata: Value,
}

impl Chunk {
    pub fn new(
        document_id: DocumentId,
        content: String,
        chunk_index: u32,
        token_count: u32,
        metadata: Value,
    ) -> Self {
        Self {
            id: ChunkId::new(),
            document_id,
            content,
            chunk_index,
            token_count,
            metadata,
        }
    }
}
