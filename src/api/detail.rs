//! Single-task handlers: `GET`, `PUT` and `DELETE /tasks/{id}`.
//!
//! The path segment is taken as a raw string and parsed here so that a
//! non-numeric id yields the service's own 400 body rather than axum's
//! plain-text path rejection.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use super::dto::{
    MessageResponse, TaskEnvelope, TaskMessageResponse, TaskResponse, UpdateTaskRequest,
    validate_update,
};
use super::error::{ApiErrorResponse, ValidationError};
use super::handlers::AppState;
use crate::domain::TaskId;

fn parse_task_id(raw: &str) -> Result<TaskId, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidTaskId)
}

/// `GET /tasks/{id}`
///
/// # Errors
///
/// - 400 when the id is not an integer
/// - 404 when no active task has that id
/// - 500 on store failure
pub async fn get_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<TaskEnvelope>, ApiErrorResponse> {
    let id = parse_task_id(&raw_id)?;

    let task = state
        .task_repository
        .find_active(id)
        .await?
        .ok_or_else(ApiErrorResponse::task_not_found)?;

    Ok(Json(TaskEnvelope {
        task: TaskResponse::from(task),
    }))
}

/// `PUT /tasks/{id}`
///
/// Only the supplied fields change. The id and body are both validated
/// before the store is consulted, and the change is applied by a single
/// conditional statement, so a task deleted concurrently yields 404.
///
/// # Errors
///
/// - 400 for a bad id, a bad field value or an empty change set
/// - 404 when no active task has that id
/// - 500 on store failure
pub async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskMessageResponse>, ApiErrorResponse> {
    let id = parse_task_id(&raw_id)?;
    let Json(request) = payload?;
    let changes = validate_update(&request)?;

    let task = state
        .task_repository
        .update(id, changes)
        .await?
        .ok_or_else(ApiErrorResponse::task_not_found)?;
    tracing::debug!(task_id = %task.id, "Task updated");

    Ok(Json(TaskMessageResponse {
        message: "Task updated successfully",
        task: TaskResponse::from(task),
    }))
}

/// `DELETE /tasks/{id}`
///
/// Soft delete: the row is kept with `is_active = false`. Deleting the same
/// id twice yields 404 the second time.
///
/// # Errors
///
/// - 400 when the id is not an integer
/// - 404 when no active task has that id
/// - 500 on store failure
pub async fn delete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    let id = parse_task_id(&raw_id)?;

    if !state.task_repository.soft_delete(id).await? {
        return Err(ApiErrorResponse::task_not_found());
    }
    tracing::debug!(task_id = %id, "Task deleted");

    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}
