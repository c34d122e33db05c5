use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::{
    DocumentRepository, RepositoryError, SettingsRepository, TaskRepository,
};
use crate::domain::{
    Chunk, CollectionId, ConversionOptions, Document, OwnerId, Task, TaskId, TaskPatch,
};

/// In-memory task store with the same merge and check-and-set semantics as
/// the Postgres implementation. Used by unit and scenario tests.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<Uuid, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains_key(&task.id.as_uuid()) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "task {} already exists",
                task.id.as_uuid()
            )));
        }
        tasks.insert(task.id.as_uuid(), task.clone());
        Ok(())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        Ok(self.tasks.lock().unwrap().get(&id.as_uuid()).cloned())
    }

    async fn list_by_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<Task>, RepositoryError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.collection_id == collection_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn list_unsettled(&self) -> Result<Vec<Task>, RepositoryError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| !t.is_settled())
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, RepositoryError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id.as_uuid())))?;
        task.apply(&patch);
        Ok(task.clone())
    }

    async fn try_mark_ingested(&self, id: TaskId) -> Result<bool, RepositoryError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(&id.as_uuid())
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id.as_uuid())))?;
        if task.metadata.ingested {
            return Ok(false);
        }
        task.metadata.ingested = true;
        Ok(true)
    }

    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        self.tasks.lock().unwrap().remove(&id.as_uuid());
        Ok(())
    }
}

/// In-memory knowledge-base store with switchable failure modes for
/// exercising the batch-then-per-row fallback path.
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<Vec<Document>>,
    chunks: Mutex<Vec<Chunk>>,
    fail_batch_insert: AtomicBool,
    fail_content_containing: Mutex<Option<String>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_batch_inserts(&self) {
        self.fail_batch_insert.store(true, Ordering::SeqCst);
    }

    /// Makes any single-row insert whose content contains `marker` fail.
    pub fn fail_content_containing(&self, marker: &str) {
        *self.fail_content_containing.lock().unwrap() = Some(marker.to_string());
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks.lock().unwrap().clone()
    }

    fn poisoned(&self, content: &str) -> bool {
        self.fail_content_containing
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|marker| content.contains(marker))
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn insert_document(&self, document: &Document) -> Result<(), RepositoryError> {
        if self.poisoned(&document.content) {
            return Err(RepositoryError::QueryFailed("poisoned document".into()));
        }
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<(), RepositoryError> {
        if self.fail_batch_insert.load(Ordering::SeqCst)
            || chunks.iter().any(|c| self.poisoned(&c.content))
        {
            return Err(RepositoryError::QueryFailed("batch insert failed".into()));
        }
        self.chunks.lock().unwrap().extend(chunks.iter().cloned());
        Ok(())
    }

    async fn insert_chunk(&self, chunk: &Chunk) -> Result<(), RepositoryError> {
        if self.poisoned(&chunk.content) {
            return Err(RepositoryError::QueryFailed("poisoned chunk".into()));
        }
        self.chunks.lock().unwrap().push(chunk.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySettingsRepository {
    options: Mutex<HashMap<Uuid, ConversionOptions>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn default_options(
        &self,
        owner_id: OwnerId,
    ) -> Result<ConversionOptions, RepositoryError> {
        Ok(self
            .options
            .lock()
            .unwrap()
            .get(&owner_id.as_uuid())
            .cloned()
            .unwrap_or_default())
    }

    async fn put_default_options(
        &self,
        owner_id: OwnerId,
        options: &ConversionOptions,
    ) -> Result<(), RepositoryError> {
        self.options
            .lock()
            .unwrap()
            .insert(owner_id.as_uuid(), options.clone());
        Ok(())
    }
}
