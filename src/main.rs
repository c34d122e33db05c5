use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use papermill::application::ports::{TaskRepository, WorkerClient};
use papermill::application::services::{IngestionWriter, Orchestrator, Reconciler};
use papermill::infrastructure::embedding::HttpEmbeddingTrigger;
use papermill::infrastructure::observability::{init_tracing, TracingConfig};
use papermill::infrastructure::persistence::{
    create_pool, run_migrations, PgDocumentRepository, PgSettingsRepository, PgTaskRepository,
};
use papermill::infrastructure::storage::LocalBlobStore;
use papermill::infrastructure::worker::HttpWorkerClient;
use papermill::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    init_tracing(
        TracingConfig {
            environment: settings.environment.to_string(),
            ..TracingConfig::default()
        },
        settings.server.port,
    );

    let pool = create_pool(&settings.database.url, settings.database.max_connections)
        .await
        .map_err(|e| anyhow::anyhow!("database pool: {e}"))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("migrations: {e}"))?;

    let task_repository: Arc<dyn TaskRepository> = Arc::new(PgTaskRepository::new(pool.clone()));
    let document_repository = Arc::new(PgDocumentRepository::new(pool.clone()));
    let settings_repository = Arc::new(PgSettingsRepository::new(pool));
    let blob_store = Arc::new(
        LocalBlobStore::new(PathBuf::from(&settings.storage.root_path))
            .map_err(|e| anyhow::anyhow!("blob store: {e}"))?,
    );
    let worker_client: Arc<dyn WorkerClient> = Arc::new(HttpWorkerClient::new(
        &settings.worker.base_url,
        settings.worker.request_timeout,
    ));
    let embedding_trigger = Arc::new(HttpEmbeddingTrigger::new(
        &settings.embedding.endpoint,
        settings.embedding.request_timeout,
    ));

    let writer = Arc::new(IngestionWriter::new(document_repository));
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&task_repository),
        Arc::clone(&worker_client),
        writer,
        embedding_trigger,
        (&settings.reconciler).into(),
    ));
    tokio::spawn(Arc::clone(&reconciler).run());

    let orchestrator = Arc::new(Orchestrator::new(
        task_repository,
        settings_repository,
        blob_store,
        worker_client,
    ));

    let state = AppState {
        orchestrator,
        settings: settings.clone(),
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
