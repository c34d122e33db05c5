mod blob_store;
mod document_repository;
mod embedding_trigger;
mod repository_error;
mod settings_repository;
mod task_repository;
mod worker_client;

pub use blob_store::{BlobEntry, BlobStore, BlobStoreError};
pub use document_repository::DocumentRepository;
pub use embedding_trigger::{EmbeddingTrigger, EmbeddingTriggerError};
pub use repository_error::RepositoryError;
pub use settings_repository::SettingsRepository;
pub use task_repository::TaskRepository;
pub use worker_client::{WorkerClient, WorkerClientError, WorkerJobRef, WorkerStatusSnapshot};
