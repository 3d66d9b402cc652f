//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs keep enumerations and dates as raw strings so that a bad
//! value produces the service's own validation message instead of a serde
//! rejection. The `validate_*` functions turn them into domain inputs.

use chrono::{DateTime, NaiveDate, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ValidationError;
use crate::domain::{NewTask, Priority, Task, TaskChanges, TaskName, TaskStatus};
use crate::infrastructure::PaginatedResult;

// =============================================================================
// Request DTOs
// =============================================================================

/// Request DTO for creating a new task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// `YYYY-MM-DD`. Empty or `null` means no due date.
    #[serde(default)]
    pub due_date: Option<String>,
    /// Defaults to `PENDING`.
    #[serde(default)]
    pub status: Option<String>,
    /// Defaults to `BLUE`.
    #[serde(default)]
    pub priority: Option<String>,
}

/// Request DTO for a partial update.
///
/// Each field distinguishes "absent" (`None`) from "explicitly null"
/// (`Some(None)`). A null `due_date` clears the date; a null for any other
/// field is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Option<String>>,
}

/// Marks a field that appeared in the body, even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Response DTOs
// =============================================================================

/// Wire representation of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub name: String,
    /// `YYYY-MM-DD` or `null`.
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: Priority,
    /// RFC 3339, UTC, millisecond precision.
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.get(),
            name: task.name.clone(),
            due_date: task.due_date,
            status: task.status,
            priority: task.priority,
            created_at: task.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: task.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            is_active: task.is_active,
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

/// `{"task": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct TaskEnvelope {
    pub task: TaskResponse,
}

/// `{"message": ..., "task": ...}` returned by create and update.
#[derive(Debug, Clone, Serialize)]
pub struct TaskMessageResponse {
    pub message: &'static str,
    pub task: TaskResponse,
}

/// `{"message": ...}` returned by delete.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Pagination metadata for list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub total_tasks: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> From<&PaginatedResult<T>> for PaginationInfo {
    fn from(result: &PaginatedResult<T>) -> Self {
        Self {
            page: result.page,
            limit: result.limit,
            total_tasks: result.total,
            total_pages: result.total_pages(),
            has_next: result.has_next(),
            has_prev: result.has_previous(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskResponse>,
    pub pagination: PaginationInfo,
}

impl From<PaginatedResult<Task>> for ListTasksResponse {
    fn from(result: PaginatedResult<Task>) -> Self {
        let pagination = PaginationInfo::from(&result);
        Self {
            tasks: result.items.iter().map(TaskResponse::from).collect(),
            pagination,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportTasksResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: usize,
}

impl From<Vec<Task>> for ExportTasksResponse {
    fn from(tasks: Vec<Task>) -> Self {
        Self {
            total: tasks.len(),
            tasks: tasks.iter().map(TaskResponse::from).collect(),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Parses an exact status literal.
///
/// # Errors
///
/// Returns `ValidationError::InvalidStatus` for anything else.
pub fn parse_status(raw: &str) -> Result<TaskStatus, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidStatus)
}

/// Parses an exact priority literal.
///
/// # Errors
///
/// Returns `ValidationError::InvalidPriority` for anything else.
pub fn parse_priority(raw: &str) -> Result<Priority, ValidationError> {
    raw.parse().map_err(|_| ValidationError::InvalidPriority)
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
/// Blank input means "no date".
fn parse_due_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|moment| moment.date_naive()))
        .map(Some)
        .map_err(|_| ValidationError::InvalidDueDate)
}

/// Validates a create request.
///
/// # Errors
///
/// Returns the first failing rule: name, status, priority, due date.
pub fn validate_create(request: &CreateTaskRequest) -> Result<NewTask, ValidationError> {
    let name = request
        .name
        .as_deref()
        .and_then(TaskName::parse)
        .ok_or(ValidationError::NameRequired)?;
    let status = request
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?
        .unwrap_or_default();
    let priority = request
        .priority
        .as_deref()
        .map(parse_priority)
        .transpose()?
        .unwrap_or_default();
    let due_date = parse_due_date(request.due_date.as_deref())?;

    Ok(NewTask::new(name)
        .with_due_date(due_date)
        .with_status(status)
        .with_priority(priority))
}

/// Validates an update request.
///
/// # Errors
///
/// Returns the first failing rule: status, priority, name, due date, and
/// finally `NoFieldsToUpdate` when nothing was supplied.
pub fn validate_update(request: &UpdateTaskRequest) -> Result<TaskChanges, ValidationError> {
    let status = request
        .status
        .as_ref()
        .map(|value| value.as_deref().map_or(Err(ValidationError::InvalidStatus), parse_status))
        .transpose()?;
    let priority = request
        .priority
        .as_ref()
        .map(|value| {
            value
                .as_deref()
                .map_or(Err(ValidationError::InvalidPriority), parse_priority)
        })
        .transpose()?;
    let name = request
        .name
        .as_ref()
        .map(|value| {
            value
                .as_deref()
                .and_then(TaskName::parse)
                .ok_or(ValidationError::NameEmpty)
        })
        .transpose()?;
    let due_date = request
        .due_date
        .as_ref()
        .map(|value| parse_due_date(value.as_deref()))
        .transpose()?;

    let changes = TaskChanges {
        name,
        due_date,
        status,
        priority,
    };

    if changes.is_empty() {
        return Err(ValidationError::NoFieldsToUpdate);
    }
    Ok(changes)
}

// =============================================================================
// Tests
// =============================================================================
