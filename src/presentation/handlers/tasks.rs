use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::{BlobStoreError, RepositoryError, WorkerClientError};
use crate::application::services::SubmitError;
use crate::domain::{CollectionId, ConversionOptions, OwnerId, StoragePath, Task, TaskId};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct SubmitTaskRequest {
    pub collection_id: Uuid,
    pub owner_id: Uuid,
    pub file_path: String,
    #[serde(default)]
    pub options: ConversionOptions,
}

#[derive(Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub collection_id: String,
    pub owner_id: String,
    pub file_path: String,
    pub status: String,
    pub ingested: bool,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.as_uuid().to_string(),
            collection_id: task.collection_id.as_uuid().to_string(),
            owner_id: task.owner_id.as_uuid().to_string(),
            file_path: task.file_path.as_str().to_string(),
            status: task.status.as_str().to_string(),
            ingested: task.metadata.ingested,
            error: task.metadata.error.clone(),
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn submit_task_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitTaskRequest>,
) -> impl IntoResponse {
    let result = state
        .orchestrator
        .submit_task(
            CollectionId::from_uuid(request.collection_id),
            OwnerId::from_uuid(request.owner_id),
            StoragePath::from_raw(request.file_path),
            request.options,
        )
        .await;

    match result {
        Ok(task) => (StatusCode::ACCEPTED, Json(TaskResponse::from(&task))).into_response(),
        Err(SubmitError::Storage(BlobStoreError::NotFound(path))) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Source file not found: {}", path),
            }),
        )
            .into_response(),
        Err(SubmitError::Worker(e)) => {
            tracing::warn!(error = %e, "Worker refused or was unreachable at submission");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Task submission failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Path(collection_id): Path<String>,
) -> impl IntoResponse {
    let Ok(collection_id) = Uuid::parse_str(&collection_id) else {
        return invalid_id("collection", &collection_id);
    };

    match state
        .orchestrator
        .list_tasks(CollectionId::from_uuid(collection_id))
        .await
    {
        Ok(tasks) => {
            let body: Vec<TaskResponse> = tasks.iter().map(TaskResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn get_task_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    let Ok(task_id) = Uuid::parse_str(&task_id) else {
        return invalid_id("task", &task_id);
    };

    match state.orchestrator.get_task(TaskId::from_uuid(task_id)).await {
        Ok(Some(task)) => (StatusCode::OK, Json(TaskResponse::from(&task))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Task not found: {}", task_id),
            }),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_task_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    let Ok(task_id) = Uuid::parse_str(&task_id) else {
        return invalid_id("task", &task_id);
    };

    match state
        .orchestrator
        .delete_task(TaskId::from_uuid(task_id))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn cancel_all_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.orchestrator.cancel_all_running().await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "All in-flight worker jobs cancelled".to_string(),
            }),
        )
            .into_response(),
        Err(e) => worker_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn clear_results_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.orchestrator.clear_all_results().await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Worker result cache cleared".to_string(),
            }),
        )
            .into_response(),
        Err(e) => worker_error(e),
    }
}

fn invalid_id(kind: &str, value: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: format!("Invalid {} ID: {}", kind, value),
        }),
    )
        .into_response()
}

fn internal_error(e: RepositoryError) -> axum::response::Response {
    tracing::error!(error = %e, "Repository operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

fn worker_error(e: WorkerClientError) -> axum::response::Response {
    tracing::error!(error = %e, "Worker admin call failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
