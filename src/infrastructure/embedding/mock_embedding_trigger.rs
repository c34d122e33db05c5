use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{EmbeddingTrigger, EmbeddingTriggerError};
use crate::domain::DocumentId;

/// Records triggered document ids; optionally fails every call.
#[derive(Default)]
pub struct MockEmbeddingTrigger {
    triggered: Mutex<Vec<DocumentId>>,
    fail: Mutex<bool>,
}

impl MockEmbeddingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn triggered(&self) -> Vec<DocumentId> {
        self.triggered.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingTrigger for MockEmbeddingTrigger {
    async fn trigger(&self, document_id: DocumentId) -> Result<(), EmbeddingTriggerError> {
        if *self.fail.lock().unwrap() {
            return Err(EmbeddingTriggerError::Unavailable(
                "embedding service down".to_string(),
            ));
        }
        self.triggered.lock().unwrap().push(document_id);
        Ok(())
    }
}
