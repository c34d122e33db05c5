mod mock_repository;
mod pg_document_repository;
mod pg_settings_repository;
mod pg_task_repository;

pub use mock_repository::{
    InMemoryDocumentRepository, InMemorySettingsRepository, InMemoryTaskRepository,
};
pub use pg_document_repository::PgDocumentRepository;
pub use pg_settings_repository::PgSettingsRepository;
pub use pg_task_repository::PgTaskRepository;
