//! `PostgreSQL` repository implementation.
//!
//! Statements come from [`super::query_builder`]; this module only binds
//! their values, executes them on the pool and maps rows back to [`Task`].
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id BIGSERIAL PRIMARY KEY,
//!     name VARCHAR(255) NOT NULL,
//!     due_date DATE,
//!     status VARCHAR(20) NOT NULL DEFAULT 'PENDING'
//!         CHECK (status IN ('PENDING', 'DONE', 'IN_PROGRESS', 'PAUSED')),
//!     priority VARCHAR(10) NOT NULL DEFAULT 'BLUE'
//!         CHECK (priority IN ('RED', 'YELLOW', 'BLUE')),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE
//! );
//! CREATE INDEX idx_tasks_active_created_at ON tasks (is_active, created_at DESC);
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use futures::FutureExt;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool};

use super::query_builder::{self, Pagination, SqlQuery, SqlValue, TaskFilter};
use super::repository::{PaginatedResult, RepositoryError, RepositoryFuture, TaskRepository};
use crate::domain::{NewTask, Task, TaskChanges, TaskId};

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw row as returned by `SELECT {TASK_COLUMNS}`.
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    name: String,
    due_date: Option<NaiveDate>,
    status: String,
    priority: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

impl TryFrom<TaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|error| RepositoryError::DecodeError(format!("task {}: {error}", row.id)))?;
        let priority = row
            .priority
            .parse()
            .map_err(|error| RepositoryError::DecodeError(format!("task {}: {error}", row.id)))?;

        Ok(Self {
            id: TaskId::new(row.id),
            name: row.name,
            due_date: row.due_date,
            status,
            priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_active: row.is_active,
        })
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, RepositoryError> {
    rows.into_iter().map(Task::try_from).collect()
}

/// Converts builder values into positional `PgArguments`.
fn bind_arguments(values: Vec<SqlValue>) -> Result<PgArguments, RepositoryError> {
    let mut arguments = PgArguments::default();
    for value in values {
        let added = match value {
            SqlValue::Text(text) => arguments.add(text),
            SqlValue::BigInt(number) => arguments.add(number),
            SqlValue::Date(date) => arguments.add(date),
        };
        added.map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;
    }
    Ok(arguments)
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of [`TaskRepository`].
///
/// Each call borrows one connection from the pool for the duration of a
/// single statement (two for `list`: count, then page).
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_tasks(&self, query: SqlQuery) -> Result<Vec<Task>, RepositoryError> {
        let (sql, values) = query.into_parts();
        let rows: Vec<TaskRow> = sqlx::query_as_with(&sql, bind_arguments(values)?)
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn fetch_optional_task(&self, query: SqlQuery) -> Result<Option<Task>, RepositoryError> {
        let (sql, values) = query.into_parts();
        let row: Option<TaskRow> = sqlx::query_as_with(&sql, bind_arguments(values)?)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Task::try_from).transpose()
    }

    async fn count(&self, filter: &TaskFilter) -> Result<u64, RepositoryError> {
        let (sql, values) = query_builder::count_tasks(filter).into_parts();
        let (count,): (i64,) = sqlx::query_as_with(&sql, bind_arguments(values)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn insert(&self, task: NewTask) -> RepositoryFuture<'_, Task> {
        async move {
            let (sql, values) = query_builder::insert_task(&task).into_parts();
            let row: TaskRow = sqlx::query_as_with(&sql, bind_arguments(values)?)
                .fetch_one(&self.pool)
                .await?;
            Task::try_from(row)
        }
        .boxed()
    }

    fn find_active(&self, id: TaskId) -> RepositoryFuture<'_, Option<Task>> {
        async move { self.fetch_optional_task(query_builder::select_task(id)).await }.boxed()
    }

    fn update(&self, id: TaskId, changes: TaskChanges) -> RepositoryFuture<'_, Option<Task>> {
        async move {
            match query_builder::update_task(id, &changes) {
                Some(query) => self.fetch_optional_task(query).await,
                // Nothing to assign: behave as a plain read so existence is still reported.
                None => self.fetch_optional_task(query_builder::select_task(id)).await,
            }
        }
        .boxed()
    }

    fn soft_delete(&self, id: TaskId) -> RepositoryFuture<'_, bool> {
        async move {
            let (sql, values) = query_builder::soft_delete_task(id).into_parts();
            let result = sqlx::query_with(&sql, bind_arguments(values)?)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }

    fn list(
        &self,
        filter: TaskFilter,
        pagination: Pagination,
    ) -> RepositoryFuture<'_, PaginatedResult<Task>> {
        async move {
            let total = self.count(&filter).await?;

            if total == 0 {
                return Ok(PaginatedResult::new(vec![], 0, pagination));
            }

            let tasks = self
                .fetch_tasks(query_builder::select_tasks(&filter, Some(pagination)))
                .await?;

            Ok(PaginatedResult::new(tasks, total, pagination))
        }
        .boxed()
    }

    fn export(&self, filter: TaskFilter) -> RepositoryFuture<'_, Vec<Task>> {
        async move {
            self.fetch_tasks(query_builder::select_tasks(&filter, None))
                .await
        }
        .boxed()
    }

    fn ping(&self) -> RepositoryFuture<'_, DateTime<Utc>> {
        async move {
            let (now,): (DateTime<Utc>,) = sqlx::query_as("SELECT NOW()")
                .fetch_one(&self.pool)
                .await?;
            Ok(now)
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
