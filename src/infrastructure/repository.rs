//! Repository contract for task persistence.
//!
//! Every method returns a boxed future so implementations can be stored as
//! `Arc<dyn TaskRepository>` and selected at runtime.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;

use super::query_builder::{Pagination, TaskFilter};
use crate::domain::{NewTask, Task, TaskChanges, TaskId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Connectivity, pool exhaustion, timeout or constraint violation.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be mapped back into a [`Task`].
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::DecodeError(error.to_string())
            }
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

/// Boxed future returned by every repository method.
pub type RepositoryFuture<'a, T> = BoxFuture<'a, Result<T, RepositoryError>>;

// =============================================================================
// Paginated Result
// =============================================================================

/// One page of items plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedResult<T> {
    /// The items in the current page.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Current page (1-indexed).
    pub page: u32,
    /// Requested page size.
    pub limit: u32,
}

impl<T> PaginatedResult<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        }
    }

    /// `ceil(total / limit)`; zero when nothing matches.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit as u64)
    }

    /// True iff `page < total_pages`.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        (self.page as u64) < self.total_pages()
    }

    /// True iff `page > 1`.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

// =============================================================================
// Task Repository
// =============================================================================

/// Data-access contract shared by all task handlers.
///
/// Only active rows are visible: lookups, updates and deletes of an inactive
/// id behave exactly like lookups of an id that never existed.
pub trait TaskRepository: Send + Sync {
    /// Inserts a task and returns the stored row with its generated fields.
    fn insert(&self, task: NewTask) -> RepositoryFuture<'_, Task>;

    /// Finds an active task by id.
    fn find_active(&self, id: TaskId) -> RepositoryFuture<'_, Option<Task>>;

    /// Applies `changes` to an active task and returns the updated row,
    /// or `None` if no active row has that id.
    fn update(&self, id: TaskId, changes: TaskChanges) -> RepositoryFuture<'_, Option<Task>>;

    /// Marks an active task inactive. Returns `false` if there was none.
    fn soft_delete(&self, id: TaskId) -> RepositoryFuture<'_, bool>;

    /// Returns one page of matching tasks, most recent first.
    fn list(
        &self,
        filter: TaskFilter,
        pagination: Pagination,
    ) -> RepositoryFuture<'_, PaginatedResult<Task>>;

    /// Returns every matching task, most recent first.
    fn export(&self, filter: TaskFilter) -> RepositoryFuture<'_, Vec<Task>>;

    /// Round-trips to the store and returns its current time.
    fn ping(&self) -> RepositoryFuture<'_, DateTime<Utc>>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn page(total: u64, page: u32, limit: u32) -> PaginatedResult<()> {
        PaginatedResult::new(vec![], total, Pagination::new(Some(page), Some(limit)))
    }

    #[rstest]
    #[case(12, 5, 3)]
    #[case(10, 5, 2)]
    #[case(0, 10, 0)]
    #[case(1, 10, 1)]
    fn test_total_pages(#[case] total: u64, #[case] limit: u32, #[case] expected: u64) {
        assert_eq!(page(total, 1, limit).total_pages(), expected);
    }

    #[rstest]
    fn test_middle_page_has_both_neighbours() {
        let result = page(12, 2, 5);
        assert!(result.has_next());
        assert!(result.has_previous());
    }

    #[rstest]
    fn test_last_page_has_no_next() {
        let result = page(12, 3, 5);
        assert!(!result.has_next());
        assert!(result.has_previous());
    }

    #[rstest]
    fn test_empty_result_has_no_neighbours() {
        let result = page(0, 1, 10);
        assert!(!result.has_next());
        assert!(!result.has_previous());
    }

    #[rstest]
    fn test_repository_error_display() {
        let error = RepositoryError::DatabaseError("connection refused".to_string());
        assert_eq!(format!("{error}"), "Database error: connection refused");
    }

    #[rstest]
    fn test_pool_timeout_maps_to_database_error() {
        let error = RepositoryError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, RepositoryError::DatabaseError(_)));
    }

    proptest! {
        #[test]
        fn prop_total_pages_is_ceiling(total in 0u64..1_000_000, limit in 1u32..500, current in 1u32..5000) {
            let result = page(total, current, limit);
            let expected = total.div_ceil(u64::from(limit));
            prop_assert_eq!(result.total_pages(), expected);
            prop_assert_eq!(result.has_next(), u64::from(current) < expected);
            prop_assert_eq!(result.has_previous(), current > 1);
        }
    }
}
