mod chunk;
mod conversion_options;
mod document;
mod storage_path;
mod task;
mod task_status;
mod worker_result;

pub use chunk::{Chunk, ChunkId};
pub use conversion_options::{ConversionOptions, ALLOWED_OPTION_KEYS, ALLOWED_OPTION_PREFIXES};
pub use document::{Document, DocumentId, DocumentMetadata, EmbeddingStatus, MAX_CONTENT_CHARS};
pub use storage_path::StoragePath;
pub use task::{CollectionId, OwnerId, Task, TaskId, TaskMetadata, TaskPatch, WorkerJob};
pub use task_status::TaskStatus;
pub use worker_result::{WorkerChunk, WorkerDocument, WorkerResult};
