//! Processing handlers: one task, or every queued task.

use axum::{
    Json,
    extract::{Path, State},
};

use super::{ProcessResponse, QueueResponse};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::TaskId;

/// POST /process/:task_id - Process one queued task
#[utoipa::path(
    post,
    path = "/process/{task_id}",
    tag = "processing",
    params(
        ("task_id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task processed", body = ProcessResponse),
        (status = 400, description = "Task references or inputs could not be resolved", body = crate::error::ApiError),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 409, description = "Task is not QUEUED", body = crate::error::ApiError),
        (status = 500, description = "Generation or rendering failed", body = crate::error::ApiError)
    )
)]
pub async fn process_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ProcessResponse>> {
    let task_id = TaskId::from(task_id);
    let outcome = state.orchestrator.process(&task_id).await?;

    Ok(Json(ProcessResponse {
        status: "success".to_string(),
        message: "Task processed successfully".to_string(),
        email_sent: outcome.email_sent,
    }))
}

/// POST /process_queue - Process every queued task, oldest first
#[utoipa::path(
    post,
    path = "/process_queue",
    tag = "processing",
    responses(
        (status = 200, description = "Queue pass finished; per-task results included", body = QueueResponse),
        (status = 500, description = "Queue could not be read", body = crate::error::ApiError)
    )
)]
pub async fn process_queue(State(state): State<AppState>) -> Result<Json<QueueResponse>> {
    // The pass keeps going if the client disconnects
    let orchestrator = state.orchestrator.clone();
    let report = tokio::spawn(async move { orchestrator.process_queue().await })
        .await
        .map_err(|e| Error::Other(format!("queue pass stopped: {}", e)))??;

    let message = if report.entries.is_empty() {
        "No queued tasks found".to_string()
    } else {
        format!("Processed {} tasks", report.entries.len())
    };

    Ok(Json(QueueResponse {
        status: "success".to_string(),
        message,
        tasks: report.entries,
    }))
}
