use std::io;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::StoragePath;

/// Listing entry. Folders come from the store's common-prefix listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobEntry {
    pub name: String,
    pub size: u64,
    pub mimetype: Option<String>,
    pub is_folder: bool,
}

/// Object store holding raw uploaded files, addressed by path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, path: &StoragePath) -> Result<Bytes, BlobStoreError>;

    /// Overwrites any existing object at `path`.
    async fn upload(&self, path: &StoragePath, data: Bytes) -> Result<(), BlobStoreError>;

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, BlobStoreError>;

    async fn delete(&self, path: &StoragePath) -> Result<(), BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("list failed: {0}")]
    ListFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
