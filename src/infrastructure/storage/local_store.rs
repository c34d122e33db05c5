use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{BlobEntry, BlobStore, BlobStoreError};
use crate::domain::StoragePath;

/// Filesystem-backed object store for local and single-node deployments.
pub struct LocalBlobStore {
    inner: Arc<LocalFileSystem>,
}

impl LocalBlobStore {
    pub fn new(base_path: PathBuf) -> Result<Self, BlobStoreError> {
        std::fs::create_dir_all(&base_path).map_err(BlobStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn download(&self, path: &StoragePath) -> Result<Bytes, BlobStoreError> {
        let store_path = StorePath::from(path.as_str());
        let result = self
            .inner
            .get(&store_path)
            .await
            .map_err(|e| BlobStoreError::NotFound(e.to_string()))?;

        result
            .bytes()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))
    }

    async fn upload(&self, path: &StoragePath, data: Bytes) -> Result<(), BlobStoreError> {
        let store_path = StorePath::from(path.as_str());
        self.inner
            .put(&store_path, PutPayload::from(data))
            .await
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, BlobStoreError> {
        let store_prefix = StorePath::from(prefix);
        let listing = self
            .inner
            .list_with_delimiter(Some(&store_prefix))
            .await
            .map_err(|e| BlobStoreError::ListFailed(e.to_string()))?;

        let mut entries: Vec<BlobEntry> = listing
            .common_prefixes
            .iter()
            .map(|p| BlobEntry {
                name: p.to_string(),
                size: 0,
                mimetype: None,
                is_folder: true,
            })
            .collect();

        entries.extend(listing.objects.iter().map(|meta| BlobEntry {
            name: meta.location.to_string(),
            size: meta.size as u64,
            mimetype: guess_mimetype(meta.location.filename().unwrap_or_default()),
            is_folder: false,
        }));

        Ok(entries)
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), BlobStoreError> {
        let store_path = StorePath::from(path.as_str());
        self.inner
            .delete(&store_path)
            .await
            .map_err(|e| BlobStoreError::DeleteFailed(e.to_string()))
    }
}

fn guess_mimetype(filename: &str) -> Option<String> {
    let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => return None,
    };
    Some(mime.to_string())
}
