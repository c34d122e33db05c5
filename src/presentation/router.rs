use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    cancel_all_handler, clear_results_handler, delete_task_handler, get_task_handler,
    health_handler, list_tasks_handler, submit_task_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/tasks", post(submit_task_handler))
        .route("/api/v1/tasks/{task_id}", get(get_task_handler))
        .route("/api/v1/tasks/{task_id}", delete(delete_task_handler))
        .route(
            "/api/v1/collections/{collection_id}/tasks",
            get(list_tasks_handler),
        )
        .route("/api/v1/admin/cancel-all", post(cancel_all_handler))
        .route("/api/v1/admin/clear-results", post(clear_results_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
