/// Storage-layer failures shared by the task, document, and settings
/// repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}
