//! HTTP handlers for task creation and service health.
//!
//! Handlers validate first and touch the repository only with input that is
//! already known to be acceptable.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::dto::{CreateTaskRequest, TaskMessageResponse, TaskResponse, validate_create};
use super::error::ApiErrorResponse;
use crate::infrastructure::TaskRepository;

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Uses a trait object so the backend chosen by `RepositoryFactory` at
/// startup can be swapped without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
}

impl AppState {
    #[must_use]
    pub fn new(task_repository: Arc<dyn TaskRepository + Send + Sync>) -> Self {
        Self { task_repository }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .finish()
    }
}

// =============================================================================
// POST /tasks Handler
// =============================================================================

/// Creates a new task.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Buy milk",
///   "due_date": "2025-07-25",
///   "status": "PENDING|DONE|IN_PROGRESS|PAUSED",
///   "priority": "RED|YELLOW|BLUE"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: `{"message": "Task created successfully", "task": {...}}`
/// - **400 Bad Request**: Missing name, bad enum value or malformed body
/// - **500 Internal Server Error**: Database error
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] for validation and repository failures.
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskMessageResponse>), ApiErrorResponse> {
    let Json(request) = payload?;
    let new_task = validate_create(&request)?;

    let task = state.task_repository.insert(new_task).await?;
    tracing::debug!(task_id = %task.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskMessageResponse {
            message: "Task created successfully",
            task: TaskResponse::from(task),
        }),
    ))
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Database section of a healthy response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub current_time: String,
}

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Health check endpoint.
///
/// Round-trips to the store so a broken pool is reported, not hidden.
///
/// # Response
///
/// - **200 OK**
///
/// ```json
/// {
///   "status": "healthy",
///   "timestamp": "2025-07-25T10:00:00.000Z",
///   "database": { "status": "connected", "currentTime": "2025-07-25T10:00:00.000Z" }
/// }
/// ```
///
/// - **500 Internal Server Error**
///
/// ```json
/// { "status": "unhealthy", "timestamp": "...", "error": "Database connection failed" }
/// ```
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    match state.task_repository.ping().await {
        Ok(current_time) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                timestamp,
                database: Some(DatabaseHealth {
                    status: "connected",
                    current_time: current_time.to_rfc3339_opts(SecondsFormat::Millis, true),
                }),
                error: None,
            }),
        ),
        Err(error) => {
            tracing::error!(%error, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "unhealthy",
                    timestamp,
                    database: None,
                    error: Some("Database connection failed"),
                }),
            )
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
