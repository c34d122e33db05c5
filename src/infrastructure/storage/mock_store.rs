use std::collections::BTreeMap;
use std::sync::Mutex;

use bytes::Bytes;

use crate::application::ports::{BlobEntry, BlobStore, BlobStoreError};
use crate::domain::StoragePath;

/// In-memory blob store for tests.
#[derive(Default)]
pub struct MockBlobStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlobStore for MockBlobStore {
    async fn download(&self, path: &StoragePath) -> Result<Bytes, BlobStoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(path.to_string()))
    }

    async fn upload(&self, path: &StoragePath, data: Bytes) -> Result<(), BlobStoreError> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), data);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, BlobStoreError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, data)| BlobEntry {
                name: name.clone(),
                size: data.len() as u64,
                mimetype: None,
                is_folder: false,
            })
            .collect())
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), BlobStoreError> {
        self.objects.lock().unwrap().remove(path.as_str());
        Ok(())
    }
}
