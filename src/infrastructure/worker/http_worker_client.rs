use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::application::ports::{
    WorkerClient, WorkerClientError, WorkerJobRef, WorkerStatusSnapshot,
};
use crate::domain::{ConversionOptions, WorkerResult};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP adapter for the conversion worker service. The worker is an opaque
/// RPC boundary: submit a multipart job, poll its status, fetch the result.
pub struct HttpWorkerClient {
    client: Client,
    base_url: String,
}

impl HttpWorkerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(&self, response: Response) -> Result<Response, WorkerClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(WorkerClientError::Unavailable(format!(
                "worker returned {status}: {message}"
            )))
        } else {
            Err(WorkerClientError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    #[tracing::instrument(skip(self, file, options), fields(filename = %filename, bytes = file.len()))]
    async fn submit(
        &self,
        file: Bytes,
        filename: &str,
        options: &ConversionOptions,
    ) -> Result<WorkerJobRef, WorkerClientError> {
        let mut form = Form::new().part(
            "file",
            Part::bytes(file.to_vec()).file_name(filename.to_string()),
        );
        for (key, value) in options.iter() {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), text);
        }

        let response = self
            .client
            .post(self.url("/jobs"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("submit failed: {e}")))?;
        let response = self.check(response).await?;

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("submit response parse: {e}")))?;
        Ok(WorkerJobRef { job_id: body.job_id })
    }

    #[tracing::instrument(skip(self))]
    async fn poll(&self, job_id: &str) -> Result<WorkerStatusSnapshot, WorkerClientError> {
        let response = self
            .client
            .get(self.url(&format!("/jobs/{job_id}/status")))
            .send()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("poll failed: {e}")))?;
        let response = self.check(response).await?;

        let raw: Value = response
            .json()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("poll response parse: {e}")))?;
        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(WorkerStatusSnapshot { status, raw })
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_result(&self, job_id: &str) -> Result<WorkerResult, WorkerClientError> {
        let response = self
            .client
            .get(self.url(&format!("/jobs/{job_id}/result")))
            .send()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("result fetch failed: {e}")))?;
        let response = self.check(response).await?;

        response
            .json()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("result parse: {e}")))
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_all(&self) -> Result<(), WorkerClientError> {
        let response = self
            .client
            .get(self.url("/admin/cancel-all"))
            .send()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("cancel-all failed: {e}")))?;
        self.check(response).await.map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn clear_results(&self) -> Result<(), WorkerClientError> {
        let response = self
            .client
            .get(self.url("/admin/clear-results"))
            .send()
            .await
            .map_err(|e| WorkerClientError::Unavailable(format!("clear-results failed: {e}")))?;
        self.check(response).await.map(|_| ())
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}
