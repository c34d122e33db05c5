use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured output of a completed conversion job, as returned by the
/// worker's result endpoint. Cached verbatim into task metadata so it is
/// fetched at most once per task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    #[serde(default)]
    pub documents: Vec<WorkerDocument>,
    #[serde(default)]
    pub chunks: Vec<WorkerChunk>,
}

/// Full-document echo. Depending on the requested options the worker may
/// omit these entirely and return only chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDocument {
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerChunk {
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub chunk_index: Option<u32>,
    #[serde(default)]
    pub token_count: Option<u32>,
    /// Headings, captions, page numbers and other per-chunk annotations.
    #[serde(default)]
    pub metadata: Value,
}
