use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use crate::application::ports::{
    WorkerClient, WorkerClientError, WorkerJobRef, WorkerStatusSnapshot,
};
use crate::domain::{ConversionOptions, WorkerResult};

/// Scriptable worker fake: queue poll responses, set a canned result, and
/// inspect what was submitted.
#[derive(Default)]
pub struct MockWorkerClient {
    submit_response: Mutex<Option<Result<WorkerJobRef, WorkerClientError>>>,
    poll_script: Mutex<VecDeque<Result<WorkerStatusSnapshot, WorkerClientError>>>,
    last_poll: Mutex<Option<Result<WorkerStatusSnapshot, WorkerClientError>>>,
    result: Mutex<Option<Result<WorkerResult, WorkerClientError>>>,
    pub submitted_options: Mutex<Vec<ConversionOptions>>,
    pub submitted_filenames: Mutex<Vec<String>>,
    pub poll_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
}

impl MockWorkerClient {
    pub fn new() -> Self {
        let mock = Self::default();
        *mock.submit_response.lock().unwrap() = Some(Ok(WorkerJobRef {
            job_id: "job-1".to_string(),
        }));
        mock
    }

    pub fn reject_submissions(&self, status: u16, message: &str) {
        *self.submit_response.lock().unwrap() = Some(Err(WorkerClientError::Rejected {
            status,
            message: message.to_string(),
        }));
    }

    /// Queues one poll response; once the queue drains, the last response
    /// repeats (a worker keeps reporting its current state).
    pub fn push_poll_status(&self, status: &str) {
        self.push_poll(Ok(WorkerStatusSnapshot {
            status: status.to_string(),
            raw: json!({ "status": status }),
        }));
    }

    pub fn push_poll(&self, response: Result<WorkerStatusSnapshot, WorkerClientError>) {
        self.poll_script.lock().unwrap().push_back(response);
    }

    pub fn set_result(&self, result: WorkerResult) {
        *self.result.lock().unwrap() = Some(Ok(result));
    }

    pub fn set_result_error(&self, error: WorkerClientError) {
        *self.result.lock().unwrap() = Some(Err(error));
    }
}

#[async_trait]
impl WorkerClient for MockWorkerClient {
    async fn submit(
        &self,
        _file: Bytes,
        filename: &str,
        options: &ConversionOptions,
    ) -> Result<WorkerJobRef, WorkerClientError> {
        self.submitted_filenames
            .lock()
            .unwrap()
            .push(filename.to_string());
        self.submitted_options.lock().unwrap().push(options.clone());
        self.submit_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Ok(WorkerJobRef {
                job_id: "job-1".to_string(),
            }))
    }

    async fn poll(&self, _job_id: &str) -> Result<WorkerStatusSnapshot, WorkerClientError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.poll_script.lock().unwrap().pop_front();
        match next {
            Some(response) => {
                *self.last_poll.lock().unwrap() = Some(response.clone());
                response
            }
            None => self
                .last_poll
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(WorkerClientError::Unavailable(
                    "no scripted poll response".to_string(),
                ))),
        }
    }

    async fn fetch_result(&self, _job_id: &str) -> Result<WorkerResult, WorkerClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Err(WorkerClientError::Unavailable(
                "no scripted result".to_string(),
            )))
    }

    async fn cancel_all(&self) -> Result<(), WorkerClientError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_results(&self) -> Result<(), WorkerClientError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
