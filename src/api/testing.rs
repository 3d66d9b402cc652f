//! Repository double shared by the handler unit tests.

use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::domain::{NewTask, Task, TaskChanges, TaskId};
use crate::infrastructure::{
    PaginatedResult, Pagination, RepositoryError, RepositoryFuture, TaskFilter, TaskRepository,
};

/// Repository whose every call fails, for exercising the error paths.
pub struct UnavailableRepository;

fn unavailable<'a, T: Send + 'a>() -> RepositoryFuture<'a, T> {
    async { Err(RepositoryError::DatabaseError("connection refused".to_string())) }.boxed()
}

impl TaskRepository for UnavailableRepository {
    fn insert(&self, _task: NewTask) -> RepositoryFuture<'_, Task> {
        unavailable()
    }
    fn find_active(&self, _id: TaskId) -> RepositoryFuture<'_, Option<Task>> {
        unavailable()
    }
    fn update(&self, _id: TaskId, _changes: TaskChanges) -> RepositoryFuture<'_, Option<Task>> {
        unavailable()
    }
    fn soft_delete(&self, _id: TaskId) -> RepositoryFuture<'_, bool> {
        unavailable()
    }
    fn list(
        &self,
        _filter: TaskFilter,
        _pagination: Pagination,
    ) -> RepositoryFuture<'_, PaginatedResult<Task>> {
        unavailable()
    }
    fn export(&self, _filter: TaskFilter) -> RepositoryFuture<'_, Vec<Task>> {
        unavailable()
    }
    fn ping(&self) -> RepositoryFuture<'_, DateTime<Utc>> {
        unavailable()
    }
}
