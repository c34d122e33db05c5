use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::storage_path::StoragePath;
use super::task::{CollectionId, OwnerId, TaskId};

/// Safety cap on stored document text.
pub const MAX_CONTENT_CHARS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
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

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingStatus {
    Pending,
    Completed,
}

impl EmbeddingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingStatus::Pending => "pending",
            EmbeddingStatus::Completed => "completed",
        }
    }
}

impl FromStr for EmbeddingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EmbeddingStatus::Pending),
            "completed" => Ok(EmbeddingStatus::Completed),
            _ => Err(format!("Invalid embedding status: {}", s)),
        }
    }
}

impl fmt::Display for EmbeddingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Back-reference to the producing task; not ownership.
    pub task_id: TaskId,
    pub embedding_status: EmbeddingStatus,
    /// Set on fallback documents created because the worker returned chunks
    /// for a filename without a document echo.
    #[serde(default)]
    pub dummy: bool,
    #[serde(default)]
    pub extra: Value,
}

/// Knowledge-base record materialized from a worker result. Created by the
/// ingestion writer, owned by the knowledge-base domain afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub collection_id: CollectionId,
    pub owner_id: OwnerId,
    pub title: String,
    pub source: StoragePath,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        collection_id: CollectionId,
        owner_id: OwnerId,
        task_id: TaskId,
        title: String,
        source: StoragePath,
        content: String,
        extra: Value,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            collection_id,
            owner_id,
            title,
            source,
            content: truncate_content(content),
            metadata: DocumentMetadata {
                task_id,
                embedding_status: EmbeddingStatus::Pending,
                dummy: false,
                extra,
            },
            created_at: Utc::now(),
        }
    }

    /// Placeholder document for chunks whose filename had no document echo
    /// in the worker result. Keeps the "every chunk's document exists"
    /// invariant intact.
    pub fn fallback(
        collection_id: CollectionId,
        owner_id: OwnerId,
        task_id: TaskId,
        filename: String,
        source: StoragePath,
    ) -> Self {
        let content = format!("Content for {} is stored as chunks.", filename);
        let mut doc = Self::new(
            collection_id,
            owner_id,
            task_id,
            filename,
            source,
            content,
            Value::Null,
        );
        doc.metadata.dummy = true;
        doc
    }
}

fn truncate_content(content: String) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        content
    } else {
        content.chars().take(MAX_CONTENT_CHARS).collect()
    }
}
