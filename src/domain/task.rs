//! Task domain model.
//!
//! A task is the only entity managed by the API. Identifiers and timestamps
//! are assigned by the store; everything else is validated here before it
//! ever reaches a repository.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Value Objects
// =============================================================================

/// Store-assigned identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw identifier coming from the store.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(Self)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A task name that is guaranteed to be non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskName(String);

impl TaskName {
    /// Trims `raw` and returns `None` when nothing is left.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Raised when a string does not name a known enumeration literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct UnknownVariant {
    /// The enumeration that was being parsed (`status` or `priority`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// =============================================================================
// Enumerations
// =============================================================================

/// Progress state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    InProgress,
    Paused,
}

impl TaskStatus {
    /// Every accepted status, in declaration order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Done, Self::InProgress, Self::Paused];

    /// Returns the literal stored in the database and exposed over the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Done => "DONE",
            Self::InProgress => "IN_PROGRESS",
            Self::Paused => "PAUSED",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    /// Parses the exact upper-case literal; no case folding is applied.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: value.to_string(),
            })
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Colour-coded priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Red,
    Yellow,
    #[default]
    Blue,
}

impl Priority {
    /// Every accepted priority, in declaration order.
    pub const ALL: [Self; 3] = [Self::Red, Self::Yellow, Self::Blue];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::Blue => "BLUE",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| UnknownVariant {
                kind: "priority",
                value: value.to_string(),
            })
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// =============================================================================
// Entity
// =============================================================================

/// A persisted task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `false` once the task has been soft-deleted.
    pub is_active: bool,
}

/// Validated input for inserting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: TaskName,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: Priority,
}

impl NewTask {
    /// Creates insert data with the default status and priority and no due date.
    #[must_use]
    pub fn new(name: TaskName) -> Self {
        Self {
            name,
            due_date: None,
            status: TaskStatus::default(),
            priority: Priority::default(),
        }
    }

    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Validated partial update.
///
/// `None` means "leave the column alone". For `due_date`, `Some(None)` clears
/// the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub name: Option<TaskName>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl TaskChanges {
    /// Returns true when no field would be modified.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }

    /// Applies the supplied fields to `task` and stamps `updated_at`.
    pub fn apply_to(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            task.name = name.as_str().to_string();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        task.updated_at = now;
    }
}

// =============================================================================
// Tests
// =============================================================================
