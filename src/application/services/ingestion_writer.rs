use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::application::ports::DocumentRepository;
use crate::domain::{Chunk, Document, DocumentId, Task, WorkerChunk, WorkerResult};

/// What a single ingestion materialized: the filename -> document-id map and
/// how many chunk rows actually landed.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub document_ids: HashMap<String, DocumentId>,
    pub chunk_count: usize,
}

/// Maps a worker result into document and chunk rows.
///
/// Stateless and idempotent only under the caller's `ingested` guard; the
/// writer itself never checks the flag. Per-item storage failures are logged
/// and skipped so one malformed row cannot lose a whole document's
/// ingestion; a document whose insert fails is simply absent from the
/// outcome and its chunks are dropped with it.
pub struct IngestionWriter {
    documents: Arc<dyn DocumentRepository>,
}

impl IngestionWriter {
    pub fn new(documents: Arc<dyn DocumentRepository>) -> Self {
        Self { documents }
    }

    #[tracing::instrument(skip(self, result), fields(task_id = %task.id.as_uuid()))]
    pub async fn ingest(&self, task: &Task, result: &WorkerResult) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();

        // Documents first: chunks reference them by filename, not id.
        for worker_doc in &result.documents {
            let document = Document::new(
                task.collection_id,
                task.owner_id,
                task.id,
                worker_doc.filename.clone(),
                task.file_path.clone(),
                worker_doc.content.clone(),
                worker_doc.metadata.clone(),
            );
            self.insert_document(&mut outcome, document).await;
        }

        // The worker may omit the document echo entirely; every chunk
        // filename still needs a document row before chunk insertion.
        for chunk in &result.chunks {
            if outcome.document_ids.contains_key(&chunk.filename) {
                continue;
            }
            let fallback = Document::fallback(
                task.collection_id,
                task.owner_id,
                task.id,
                chunk.filename.clone(),
                task.file_path.clone(),
            );
            tracing::debug!(filename = %chunk.filename, "Creating fallback document");
            self.insert_document(&mut outcome, fallback).await;
        }

        let rows = self.build_chunk_rows(task, &result.chunks, &outcome.document_ids);
        if rows.is_empty() {
            return outcome;
        }

        match self.documents.insert_chunks(&rows).await {
            Ok(()) => outcome.chunk_count = rows.len(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    chunks = rows.len(),
                    "Batch chunk insert failed, falling back to per-row inserts"
                );
                for row in &rows {
                    match self.documents.insert_chunk(row).await {
                        Ok(()) => outcome.chunk_count += 1,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                chunk_id = %row.id.as_uuid(),
                                chunk_index = row.chunk_index,
                                "Chunk insert failed, skipping row"
                            );
                        }
                    }
                }
            }
        }

        tracing::info!(
            documents = outcome.document_ids.len(),
            chunks = outcome.chunk_count,
            "Ingestion finished"
        );
        outcome
    }

    async fn insert_document(&self, outcome: &mut IngestOutcome, document: Document) {
        let filename = document.title.clone();
        match self.documents.insert_document(&document).await {
            Ok(()) => {
                outcome.document_ids.insert(filename, document.id);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    filename = %filename,
                    "Document insert failed; its chunks will be dropped"
                );
            }
        }
    }

    fn build_chunk_rows(
        &self,
        task: &Task,
        chunks: &[WorkerChunk],
        document_ids: &HashMap<String, DocumentId>,
    ) -> Vec<Chunk> {
        let mut next_index: HashMap<DocumentId, u32> = HashMap::new();
        let mut rows = Vec::new();

        for chunk in chunks {
            // Empty chunks carry no retrieval value and would violate the
            // non-empty-content invariant downstream.
            if chunk.content.trim().is_empty() {
                tracing::debug!(filename = %chunk.filename, "Dropping empty chunk");
                continue;
            }
            let Some(&document_id) = document_ids.get(&chunk.filename) else {
                tracing::warn!(
                    filename = %chunk.filename,
                    "Chunk has no surviving document, dropping"
                );
                continue;
            };

            let counter = next_index.entry(document_id).or_insert(0);
            let chunk_index = chunk.chunk_index.unwrap_or(*counter);
            *counter = chunk_index + 1;

            let mut metadata = chunk.metadata.clone();
            if !metadata.is_object() {
                metadata = json!({});
            }
            if let Some(map) = metadata.as_object_mut() {
                map.insert("filename".into(), json!(chunk.filename));
                map.insert("task_id".into(), json!(task.id.as_uuid()));
            }

            rows.push(Chunk::new(
                document_id,
                chunk.content.clone(),
                chunk_index,
                chunk.token_count.unwrap_or(0),
                metadata,
            ));
        }

        rows
    }
}
