mod http_embedding_trigger;
mod mock_embedding_trigger;

pub use http_embedding_trigger::HttpEmbeddingTrigger;
pub use mock_embedding_trigger::MockEmbeddingTrigger;
