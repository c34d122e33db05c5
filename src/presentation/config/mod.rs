mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, EmbeddingSettings, ReconcilerSettings, ServerSettings, Settings,
    StorageSettings, WorkerSettings,
};
