mod http_worker_client;
mod mock_worker_client;

pub use http_worker_client::{HttpWorkerClient, DEFAULT_REQUEST_TIMEOUT};
pub use mock_worker_client::MockWorkerClient;
