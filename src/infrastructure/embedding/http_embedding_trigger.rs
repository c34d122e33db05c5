use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::application::ports::{EmbeddingTrigger, EmbeddingTriggerError};
use crate::domain::DocumentId;

/// POSTs the document id to the embedding service. Callers treat failures
/// as non-fatal; the document stays `pending` and can be re-triggered.
pub struct HttpEmbeddingTrigger {
    client: Client,
    endpoint: String,
}

impl HttpEmbeddingTrigger {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingTrigger for HttpEmbeddingTrigger {
    #[tracing::instrument(skip(self), fields(document_id = %document_id.as_uuid()))]
    async fn trigger(&self, document_id: DocumentId) -> Result<(), EmbeddingTriggerError> {
        let response = self
            .client
            .post(format!("{}/embed", self.endpoint))
            .json(&json!({ "document_id": document_id.as_uuid() }))
            .send()
            .await
            .map_err(|e| EmbeddingTriggerError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingTriggerError::Unavailable(format!(
                "embedding endpoint returned {status}: {message}"
            )));
        }
        Ok(())
    }
}
