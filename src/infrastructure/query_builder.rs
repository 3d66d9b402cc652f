//! Parameterized SQL construction for the `tasks` table.
//!
//! Handlers never touch SQL text. They describe what they want with a
//! [`TaskFilter`], a [`Pagination`] or a [`TaskChanges`], and this module
//! renders the statement together with its positional arguments. Every
//! dynamic value is bound as `$n`; placeholder numbering stays inside this
//! module so callers cannot get it wrong.
//!
//! Conditions are always emitted in the same order (active flag, status,
//! priority, search) so the generated text is reproducible.

use chrono::NaiveDate;

use crate::domain::{NewTask, Priority, Task, TaskChanges, TaskId, TaskStatus};

/// Columns returned by every statement that yields task rows.
pub const TASK_COLUMNS: &str =
    "id, name, due_date, status, priority, created_at, updated_at, is_active";

// =============================================================================
// Bound Values
// =============================================================================

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    BigInt(i64),
    Date(Option<NaiveDate>),
}

/// Rendered statement plus the values for `$1..$n`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    sql: String,
    values: Vec<SqlValue>,
}

impl SqlQuery {
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.values)
    }
}

/// Accumulates bound values and hands out the matching placeholders.
#[derive(Debug, Default)]
struct Parameters {
    values: Vec<SqlValue>,
}

impl Parameters {
    /// Stores `value` and returns its placeholder (`$1`, `$2`, ...).
    fn bind(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    fn finish(self, sql: String) -> SqlQuery {
        SqlQuery {
            sql,
            values: self.values,
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Optional narrowing applied to every read path.
///
/// The active-flag condition is implicit and cannot be switched off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring matched against `name`.
    pub search: Option<String>,
}

impl TaskFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_status(mut self, status: Option<TaskStatus>) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the search term, kept exactly as given. Blank terms are treated
    /// as absent.
    #[must_use]
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .filter(|term| !term.trim().is_empty())
            .map(str::to_string);
        self
    }

    /// Evaluates the filter in memory with the same semantics as the SQL clause.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        task.is_active
            && self.status.is_none_or(|status| task.status == status)
            && self.priority.is_none_or(|priority| task.priority == priority)
            && self.search.as_deref().is_none_or(|term| {
                task.name.to_lowercase().contains(&term.to_lowercase())
            })
    }

    /// Renders the `WHERE` clause, binding values into `parameters`.
    fn render(&self, parameters: &mut Parameters) -> String {
        let mut conditions = vec!["is_active = true".to_string()];

        if let Some(status) = self.status {
            let placeholder = parameters.bind(SqlValue::Text(status.as_str().to_string()));
            conditions.push(format!("status = {placeholder}"));
        }
        if let Some(priority) = self.priority {
            let placeholder = parameters.bind(SqlValue::Text(priority.as_str().to_string()));
            conditions.push(format!("priority = {placeholder}"));
        }
        if let Some(term) = &self.search {
            let placeholder = parameters.bind(SqlValue::Text(like_pattern(term)));
            conditions.push(format!("name ILIKE {placeholder}"));
        }

        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Wraps `term` in `%` after escaping the `LIKE` metacharacters, so the
/// search is a literal substring match.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for character in term.chars() {
        if matches!(character, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(character);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Pagination
// =============================================================================

/// Page number used when the caller does not supply one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIMIT: u32 = 10;

/// One-indexed page request.
///
/// `limit` has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// Builds pagination from optional inputs. Missing or zero values fall
    /// back to [`DEFAULT_PAGE`] / [`DEFAULT_LIMIT`].
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.filter(|value| *value > 0).unwrap_or(DEFAULT_PAGE),
            limit: limit.filter(|value| *value > 0).unwrap_or(DEFAULT_LIMIT),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows skipped: `(page - 1) * limit`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// =============================================================================
// Statements
// =============================================================================

/// `SELECT COUNT(*)` over the rows matching `filter`.
#[must_use]
pub fn count_tasks(filter: &TaskFilter) -> SqlQuery {
    let mut parameters = Parameters::default();
    let where_clause = filter.render(&mut parameters);
    parameters.finish(format!("SELECT COUNT(*) FROM tasks {where_clause}"))
}

/// Selects matching rows, most recent first, optionally paginated.
#[must_use]
pub fn select_tasks(filter: &TaskFilter, pagination: Option<Pagination>) -> SqlQuery {
    let mut parameters = Parameters::default();
    let where_clause = filter.render(&mut parameters);
    let mut sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks {where_clause} ORDER BY created_at DESC, id DESC"
    );

    if let Some(pagination) = pagination {
        let limit = parameters.bind(SqlValue::BigInt(i64::from(pagination.limit())));
        let offset = parameters.bind(SqlValue::BigInt(
            i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
        ));
        sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
    }

    parameters.finish(sql)
}

/// Selects one active row by id.
#[must_use]
pub fn select_task(id: TaskId) -> SqlQuery {
    let mut parameters = Parameters::default();
    let placeholder = parameters.bind(SqlValue::BigInt(id.get()));
    parameters.finish(format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = {placeholder} AND is_active = true"
    ))
}

/// Inserts a task and returns the stored row.
#[must_use]
pub fn insert_task(task: &NewTask) -> SqlQuery {
    let mut parameters = Parameters::default();
    let name = parameters.bind(SqlValue::Text(task.name.as_str().to_string()));
    let due_date = parameters.bind(SqlValue::Date(task.due_date));
    let status = parameters.bind(SqlValue::Text(task.status.as_str().to_string()));
    let priority = parameters.bind(SqlValue::Text(task.priority.as_str().to_string()));
    parameters.finish(format!(
        "INSERT INTO tasks (name, due_date, status, priority) \
         VALUES ({name}, {due_date}, {status}, {priority}) \
         RETURNING {TASK_COLUMNS}"
    ))
}

/// Builds an `UPDATE` touching exactly the supplied columns.
///
/// Returns `None` when `changes` is empty; there is nothing to send.
#[must_use]
pub fn update_task(id: TaskId, changes: &TaskChanges) -> Option<SqlQuery> {
    if changes.is_empty() {
        return None;
    }

    let mut parameters = Parameters::default();
    let mut assignments = Vec::with_capacity(5);

    if let Some(name) = &changes.name {
        let placeholder = parameters.bind(SqlValue::Text(name.as_str().to_string()));
        assignments.push(format!("name = {placeholder}"));
    }
    if let Some(due_date) = changes.due_date {
        let placeholder = parameters.bind(SqlValue::Date(due_date));
        assignments.push(format!("due_date = {placeholder}"));
    }
    if let Some(status) = changes.status {
        let placeholder = parameters.bind(SqlValue::Text(status.as_str().to_string()));
        assignments.push(format!("status = {placeholder}"));
    }
    if let Some(priority) = changes.priority {
        let placeholder = parameters.bind(SqlValue::Text(priority.as_str().to_string()));
        assignments.push(format!("priority = {placeholder}"));
    }
    assignments.push("updated_at = NOW()".to_string());

    let id_placeholder = parameters.bind(SqlValue::BigInt(id.get()));

    Some(parameters.finish(format!(
        "UPDATE tasks SET {} WHERE id = {id_placeholder} AND is_active = true \
         RETURNING {TASK_COLUMNS}",
        assignments.join(", ")
    )))
}

/// Flips `is_active` off for an active row. No other column changes.
#[must_use]
pub fn soft_delete_task(id: TaskId) -> SqlQuery {
    let mut parameters = Parameters::default();
    let placeholder = parameters.bind(SqlValue::BigInt(id.get()));
    parameters.finish(format!(
        "UPDATE tasks SET is_active = false WHERE id = {placeholder} AND is_active = true"
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskName;
    use chrono::Utc;
    use proptest::prelude::*;
    use rstest::rstest;

    fn task(name: &str, status: TaskStatus, priority: Priority, is_active: bool) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::new(1),
            name: name.to_string(),
            due_date: None,
            status,
            priority,
            created_at: now,
            updated_at: now,
            is_active,
        }
    }

    // -------------------------------------------------------------------------
    // Filter Clause Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_count_without_filters_only_checks_active_flag() {
        let query = count_tasks(&TaskFilter::new());
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM tasks WHERE is_active = true"
        );
        assert!(query.values().is_empty());
    }

    #[rstest]
    fn test_count_with_all_filters_in_fixed_order() {
        let filter = TaskFilter::new()
            .with_search(Some("milk"))
            .with_priority(Some(Priority::Red))
            .with_status(Some(TaskStatus::Done));

        let query = count_tasks(&filter);

        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM tasks WHERE is_active = true AND status = $1 \
             AND priority = $2 AND name ILIKE $3"
        );
        assert_eq!(
            query.values(),
            &[
                SqlValue::Text("DONE".to_string()),
                SqlValue::Text("RED".to_string()),
                SqlValue::Text("%milk%".to_string()),
            ]
        );
    }

    #[rstest]
    fn test_placeholders_shift_when_filters_are_skipped() {
        let filter = TaskFilter::new().with_priority(Some(Priority::Yellow));
        let query = count_tasks(&filter);
        assert!(query.sql().ends_with("AND priority = $1"));
        assert_eq!(query.values().len(), 1);
    }

    #[rstest]
    fn test_select_with_pagination_binds_limit_and_offset_last() {
        let filter = TaskFilter::new().with_status(Some(TaskStatus::Pending));
        let query = select_tasks(&filter, Some(Pagination::new(Some(2), Some(5))));

        assert!(query.sql().contains("WHERE is_active = true AND status = $1"));
        assert!(
            query
                .sql()
                .ends_with("ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3")
        );
        assert_eq!(
            query.values(),
            &[
                SqlValue::Text("PENDING".to_string()),
                SqlValue::BigInt(5),
                SqlValue::BigInt(5),
            ]
        );
    }

    #[rstest]
    fn test_select_without_pagination_has_no_limit() {
        let query = select_tasks(&TaskFilter::new(), None);
        assert!(!query.sql().contains("LIMIT"));
        assert!(query.sql().ends_with("ORDER BY created_at DESC, id DESC"));
    }

    #[rstest]
    #[case(Some("  "), None)]
    #[case(None, None)]
    #[case(Some(" milk "), Some(" milk "))]
    fn test_blank_search_is_ignored(#[case] input: Option<&str>, #[case] expected: Option<&str>) {
        let filter = TaskFilter::new().with_search(input);
        assert_eq!(filter.search.as_deref(), expected);
    }

    #[rstest]
    #[case("milk", "%milk%")]
    #[case("100%", "%100\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case("c:\\", "%c:\\\\%")]
    fn test_like_pattern_escapes_metacharacters(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(like_pattern(term), expected);
    }

    #[rstest]
    fn test_search_value_is_never_interpolated() {
        let filter = TaskFilter::new().with_search(Some("'; DROP TABLE tasks; --"));
        let query = count_tasks(&filter);
        assert!(!query.sql().contains("DROP"));
        assert_eq!(query.values().len(), 1);
    }

    // -------------------------------------------------------------------------
    // In-memory Predicate Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_matches_excludes_inactive_rows() {
        let filter = TaskFilter::new();
        assert!(filter.matches(&task("a", TaskStatus::Pending, Priority::Blue, true)));
        assert!(!filter.matches(&task("a", TaskStatus::Pending, Priority::Blue, false)));
    }

    #[rstest]
    fn test_matches_search_is_case_insensitive() {
        let filter = TaskFilter::new().with_search(Some("MILK"));
        assert!(filter.matches(&task("Buy milk", TaskStatus::Pending, Priority::Blue, true)));
        assert!(!filter.matches(&task("Buy eggs", TaskStatus::Pending, Priority::Blue, true)));
    }

    #[rstest]
    fn test_matches_status_and_priority() {
        let filter = TaskFilter::new()
            .with_status(Some(TaskStatus::Done))
            .with_priority(Some(Priority::Red));
        assert!(filter.matches(&task("x", TaskStatus::Done, Priority::Red, true)));
        assert!(!filter.matches(&task("x", TaskStatus::Done, Priority::Blue, true)));
        assert!(!filter.matches(&task("x", TaskStatus::Paused, Priority::Red, true)));
    }

    // -------------------------------------------------------------------------
    // Pagination Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[case(None, None, 1, 10, 0)]
    #[case(Some(2), Some(5), 2, 5, 5)]
    #[case(Some(0), Some(0), 1, 10, 0)]
    #[case(Some(3), Some(1000), 3, 1000, 2000)]
    fn test_pagination_defaults_and_offset(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] expected_page: u32,
        #[case] expected_limit: u32,
        #[case] expected_offset: u64,
    ) {
        let pagination = Pagination::new(page, limit);
        assert_eq!(pagination.page(), expected_page);
        assert_eq!(pagination.limit(), expected_limit);
        assert_eq!(pagination.offset(), expected_offset);
    }

    proptest! {
        #[test]
        fn prop_offset_never_overflows(page in 1u32.., limit in 1u32..) {
            let pagination = Pagination::new(Some(page), Some(limit));
            prop_assert_eq!(pagination.offset(), u64::from(page - 1) * u64::from(limit));
        }

        #[test]
        fn prop_placeholder_count_matches_values(
            status in proptest::option::of(0usize..4),
            priority in proptest::option::of(0usize..3),
            search in proptest::option::of("[a-z]{1,8}"),
        ) {
            let filter = TaskFilter::new()
                .with_status(status.map(|index| TaskStatus::ALL[index]))
                .with_priority(priority.map(|index| Priority::ALL[index]))
                .with_search(search.as_deref());
            let query = select_tasks(&filter, Some(Pagination::default()));
            let placeholders = query.sql().matches('$').count();
            prop_assert_eq!(placeholders, query.values().len());
            prop_assert_eq!(select_tasks(&filter, Some(Pagination::default())), query);
        }
    }

    // -------------------------------------------------------------------------
    // Mutation Statement Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_insert_binds_all_columns() {
        let new_task = NewTask::new(TaskName::parse("Buy milk").unwrap());
        let query = insert_task(&new_task);
        assert!(query.sql().starts_with(
            "INSERT INTO tasks (name, due_date, status, priority) VALUES ($1, $2, $3, $4)"
        ));
        assert_eq!(
            query.values(),
            &[
                SqlValue::Text("Buy milk".to_string()),
                SqlValue::Date(None),
                SqlValue::Text("PENDING".to_string()),
                SqlValue::Text("BLUE".to_string()),
            ]
        );
    }

    #[rstest]
    fn test_update_with_no_changes_is_none() {
        assert!(update_task(TaskId::new(1), &TaskChanges::default()).is_none());
    }

    #[rstest]
    fn test_update_only_assigns_supplied_fields() {
        let changes = TaskChanges {
            status: Some(TaskStatus::Done),
            ..TaskChanges::default()
        };

        let query = update_task(TaskId::new(9), &changes).unwrap();

        assert_eq!(
            query.sql(),
            format!(
                "UPDATE tasks SET status = $1, updated_at = NOW() \
                 WHERE id = $2 AND is_active = true RETURNING {TASK_COLUMNS}"
            )
        );
        assert_eq!(
            query.values(),
            &[SqlValue::Text("DONE".to_string()), SqlValue::BigInt(9)]
        );
    }

    #[rstest]
    fn test_update_all_fields_in_column_order() {
        let changes = TaskChanges {
            name: TaskName::parse(" Renamed "),
            due_date: Some(NaiveDate::from_ymd_opt(2025, 7, 25)),
            status: Some(TaskStatus::Paused),
            priority: Some(Priority::Yellow),
        };

        let query = update_task(TaskId::new(4), &changes).unwrap();

        assert!(query.sql().starts_with(
            "UPDATE tasks SET name = $1, due_date = $2, status = $3, priority = $4, \
             updated_at = NOW() WHERE id = $5"
        ));
        assert_eq!(query.values()[0], SqlValue::Text("Renamed".to_string()));
        assert_eq!(query.values()[4], SqlValue::BigInt(4));
    }

    #[rstest]
    fn test_soft_delete_only_flips_active_flag() {
        let query = soft_delete_task(TaskId::new(3));
        assert_eq!(
            query.sql(),
            "UPDATE tasks SET is_active = false WHERE id = $1 AND is_active = true"
        );
        assert_eq!(query.values(), &[SqlValue::BigInt(3)]);
    }
}
