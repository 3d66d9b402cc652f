//! Query handlers for task listing and export.
//!
//! # Endpoints
//!
//! - `GET /tasks` - List tasks with pagination, filtering and name search
//! - `GET /tasks/export` - Every matching task, unpaginated

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use super::dto::{ExportTasksResponse, ListTasksResponse, parse_priority, parse_status};
use super::error::{ApiErrorResponse, ValidationError};
use super::handlers::AppState;
use crate::infrastructure::{Pagination, TaskFilter};

// =============================================================================
// Query Parameters
// =============================================================================

/// Query parameters for listing tasks.
///
/// Everything arrives as text; numbers that fail to parse fall back to the
/// pagination defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
}

/// Query parameters for exporting tasks.
#[derive(Debug, Default, Deserialize)]
pub struct ExportTasksQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Parses a non-negative integer. Values past `u32::MAX` saturate instead of
/// falling back to the default.
fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let digits = raw?.trim();
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse::<u32>().unwrap_or(u32::MAX))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Builds the status/priority part of a filter. Blank values are ignored.
fn filter_from(status: Option<&str>, priority: Option<&str>) -> Result<TaskFilter, ValidationError> {
    let status = non_blank(status).map(parse_status).transpose()?;
    let priority = non_blank(priority).map(parse_priority).transpose()?;

    Ok(TaskFilter::new().with_status(status).with_priority(priority))
}

// =============================================================================
// GET /tasks Handler
// =============================================================================

/// Lists tasks with pagination.
///
/// # Query Parameters
///
/// - `page`: 1-based page number (default 1)
/// - `limit`: page size (default 10)
/// - `status`: exact status literal
/// - `priority`: exact priority literal
/// - `search`: case-insensitive substring of the name
///
/// # Errors
///
/// - 400 for an unknown status or priority
/// - 500 on store failure
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<ListTasksResponse>, ApiErrorResponse> {
    let Query(query) = query?;

    let filter = filter_from(query.status.as_deref(), query.priority.as_deref())?
        .with_search(query.search.as_deref());
    let pagination = Pagination::new(
        parse_positive(query.page.as_deref()),
        parse_positive(query.limit.as_deref()),
    );

    let result = state.task_repository.list(filter, pagination).await?;

    Ok(Json(ListTasksResponse::from(result)))
}

// =============================================================================
// GET /tasks/export Handler
// =============================================================================

/// Exports every active task matching the optional filters, newest first.
///
/// # Errors
///
/// - 400 for an unknown status or priority
/// - 500 on store failure
pub async fn export_tasks(
    State(state): State<AppState>,
    query: Result<Query<ExportTasksQuery>, QueryRejection>,
) -> Result<Json<ExportTasksResponse>, ApiErrorResponse> {
    let Query(query) = query?;

    let filter = filter_from(query.status.as_deref(), query.priority.as_deref())?;
    let tasks = state.task_repository.export(filter).await?;
    tracing::debug!(count = tasks.len(), "Tasks exported");

    Ok(Json(ExportTasksResponse::from(tasks)))
}

// =============================================================================
// Tests
// =============================================================================
