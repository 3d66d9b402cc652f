//! In-memory repository implementation.
//!
//! Backs the API when `STORAGE_MODE=in_memory` and is used by the router
//! tests. Behaviour mirrors the `PostgreSQL` repository: ids are assigned
//! monotonically, soft-deleted rows stay stored but are invisible, and
//! listings are ordered by `created_at DESC, id DESC`.
//!
//! # Features
//!
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Ordered storage keyed by id so ties on `created_at` resolve by id

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::RwLock;

use super::query_builder::{Pagination, TaskFilter};
use super::repository::{PaginatedResult, RepositoryError, RepositoryFuture, TaskRepository};
use crate::domain::{NewTask, Task, TaskChanges, TaskId};

#[derive(Debug, Default)]
struct TaskTable {
    rows: BTreeMap<TaskId, Task>,
    last_id: i64,
}

impl TaskTable {
    /// Active rows matching `filter`, most recent first.
    fn matching(&self, filter: &TaskFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .rows
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });
        tasks
    }

    fn active_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.rows.get_mut(&id).filter(|task| task.is_active)
    }
}

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of [`TaskRepository`].
///
/// # Example
///
/// ```ignore
/// let repository = InMemoryTaskRepository::new();
/// let task = repository.insert(NewTask::new(name)).await?;
/// let found = repository.find_active(task.id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    table: Arc<RwLock<TaskTable>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a task up regardless of its active flag.
    pub async fn find_including_inactive(&self, id: TaskId) -> Option<Task> {
        self.table.read().await.rows.get(&id).cloned()
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    fn insert(&self, task: NewTask) -> RepositoryFuture<'_, Task> {
        async move {
            let mut table = self.table.write().await;
            table.last_id += 1;
            let now = Utc::now();
            let stored = Task {
                id: TaskId::new(table.last_id),
                name: task.name.into_inner(),
                due_date: task.due_date,
                status: task.status,
                priority: task.priority,
                created_at: now,
                updated_at: now,
                is_active: true,
            };
            table.rows.insert(stored.id, stored.clone());
            Ok(stored)
        }
        .boxed()
    }

    fn find_active(&self, id: TaskId) -> RepositoryFuture<'_, Option<Task>> {
        async move {
            let table = self.table.read().await;
            Ok(table.rows.get(&id).filter(|task| task.is_active).cloned())
        }
        .boxed()
    }

    fn update(&self, id: TaskId, changes: TaskChanges) -> RepositoryFuture<'_, Option<Task>> {
        async move {
            let mut table = self.table.write().await;
            Ok(table.active_mut(id).map(|task| {
                if !changes.is_empty() {
                    changes.apply_to(task, Utc::now());
                }
                task.clone()
            }))
        }
        .boxed()
    }

    fn soft_delete(&self, id: TaskId) -> RepositoryFuture<'_, bool> {
        async move {
            let mut table = self.table.write().await;
            Ok(table.active_mut(id).is_some_and(|task| {
                task.is_active = false;
                true
            }))
        }
        .boxed()
    }

    fn list(
        &self,
        filter: TaskFilter,
        pagination: Pagination,
    ) -> RepositoryFuture<'_, PaginatedResult<Task>> {
        async move {
            let matching = self.table.read().await.matching(&filter);
            let total = matching.len() as u64;
            let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
            let items = matching
                .into_iter()
                .skip(offset)
                .take(pagination.limit() as usize)
                .collect();
            Ok(PaginatedResult::new(items, total, pagination))
        }
        .boxed()
    }

    fn export(&self, filter: TaskFilter) -> RepositoryFuture<'_, Vec<Task>> {
        async move { Ok(self.table.read().await.matching(&filter)) }.boxed()
    }

    fn ping(&self) -> RepositoryFuture<'_, DateTime<Utc>> {
        async move { Ok::<_, RepositoryError>(Utc::now()) }.boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskName, TaskStatus};
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    fn new_task(name: &str) -> NewTask {
        NewTask::new(TaskName::parse(name).unwrap())
    }

    #[fixture]
    fn repository() -> InMemoryTaskRepository {
        InMemoryTaskRepository::new()
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_assigns_monotonic_ids(repository: InMemoryTaskRepository) {
        let first = repository.insert(new_task("First")).await.unwrap();
        let second = repository.insert(new_task("Second")).await.unwrap();

        assert!(second.id > first.id);
        assert!(first.is_active);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(first.status, TaskStatus::Pending);
        assert_eq!(first.priority, Priority::Blue);
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_active_not_found(repository: InMemoryTaskRepository) {
        let found = repository.find_active(TaskId::new(99)).await.unwrap();
        assert!(found.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_soft_delete_hides_but_keeps_row(repository: InMemoryTaskRepository) {
        let task = repository.insert(new_task("Disposable")).await.unwrap();

        assert!(repository.soft_delete(task.id).await.unwrap());
        assert!(!repository.soft_delete(task.id).await.unwrap());
        assert!(repository.find_active(task.id).await.unwrap().is_none());

        let stored = repository.find_including_inactive(task.id).await.unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.updated_at, task.updated_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_of_deleted_task_returns_none(repository: InMemoryTaskRepository) {
        let task = repository.insert(new_task("Gone")).await.unwrap();
        repository.soft_delete(task.id).await.unwrap();

        let changes = TaskChanges {
            status: Some(TaskStatus::Done),
            ..TaskChanges::default()
        };
        assert!(repository.update(task.id, changes).await.unwrap().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_changes_only_supplied_fields(repository: InMemoryTaskRepository) {
        let due = NaiveDate::from_ymd_opt(2025, 7, 25);
        let task = repository
            .insert(new_task("Report").with_due_date(due).with_priority(Priority::Red))
            .await
            .unwrap();

        let changes = TaskChanges {
            status: Some(TaskStatus::InProgress),
            ..TaskChanges::default()
        };
        let updated = repository.update(task.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.name, "Report");
        assert_eq!(updated.due_date, due);
        assert_eq!(updated.priority, Priority::Red);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_pages_most_recent_first(repository: InMemoryTaskRepository) {
        for index in 1..=12 {
            repository
                .insert(new_task(&format!("Task {index}")))
                .await
                .unwrap();
        }

        let result = repository
            .list(TaskFilter::new(), Pagination::new(Some(2), Some(5)))
            .await
            .unwrap();

        assert_eq!(result.total, 12);
        assert_eq!(result.total_pages(), 3);
        let names: Vec<&str> = result.items.iter().map(|task| task.name.as_str()).collect();
        assert_eq!(names, ["Task 7", "Task 6", "Task 5", "Task 4", "Task 3"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_filters_and_searches(repository: InMemoryTaskRepository) {
        repository
            .insert(new_task("Buy Milk").with_status(TaskStatus::Done))
            .await
            .unwrap();
        repository.insert(new_task("buy bread")).await.unwrap();
        repository
            .insert(new_task("Call mom").with_status(TaskStatus::Done))
            .await
            .unwrap();

        let filter = TaskFilter::new()
            .with_status(Some(TaskStatus::Done))
            .with_search(Some("MILK"));
        let result = repository
            .list(filter, Pagination::default())
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].name, "Buy Milk");
    }

    #[rstest]
    #[tokio::test]
    async fn test_export_excludes_inactive(repository: InMemoryTaskRepository) {
        let kept = repository.insert(new_task("Kept")).await.unwrap();
        let removed = repository.insert(new_task("Removed")).await.unwrap();
        repository.soft_delete(removed.id).await.unwrap();

        let exported = repository.export(TaskFilter::new()).await.unwrap();

        assert_eq!(exported, vec![kept]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_page_past_the_end_is_empty(repository: InMemoryTaskRepository) {
        repository.insert(new_task("Only")).await.unwrap();

        let result = repository
            .list(TaskFilter::new(), Pagination::new(Some(5), Some(10)))
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.total, 1);
        assert!(!result.has_next());
    }
}
