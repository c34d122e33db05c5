mod ingestion_writer;
mod orchestrator;
mod reconciler;

pub use ingestion_writer::{IngestOutcome, IngestionWriter};
pub use orchestrator::{Orchestrator, SubmitError};
pub use reconciler::{ReconcileError, Reconciler, ReconcilerConfig};
