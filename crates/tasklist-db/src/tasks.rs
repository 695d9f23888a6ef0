//! Task repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;

use tasklist_core::{
    Error, ListTasksRequest, ListTasksResponse, NewTask, Result, Task, TaskRepository,
    TaskSortField, TaskUpdate,
};

use crate::escape_like;
use crate::pool::log_pool_metrics;

/// Columns selected for every task read. Tags are aggregated per row, sorted.
const TASK_COLUMNS: &str = r#"
    t.id, t.title, t.completed, t.due_date, t.created_at, t.updated_at,
    COALESCE(
        (SELECT array_agg(tt.tag ORDER BY tt.tag) FROM task_tag tt WHERE tt.task_id = t.id),
        ARRAY[]::TEXT[]
    ) AS tags
"#;

/// PostgreSQL implementation of TaskRepository.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: Pool<Postgres>,
}

impl PgTaskRepository {
    /// Create a new PgTaskRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

// =============================================================================
// HELPER FUNCTIONS FOR LIST QUERY BUILDING
// =============================================================================

fn sort_direction(ascending: bool) -> &'static str {
    if ascending {
        "ASC"
    } else {
        "DESC"
    }
}

/// Build the ORDER BY clause.
///
/// NULL keys sort last in both directions; `id` in the same direction breaks ties.
fn build_order_clause(order_by: TaskSortField, ascending: bool) -> String {
    let direction = sort_direction(ascending);
    let column = match order_by {
        TaskSortField::Title => "t.title",
        TaskSortField::DueDate => "t.due_date",
        TaskSortField::UpdatedAt => "t.updated_at",
        TaskSortField::CreatedAt => "t.created_at",
    };
    format!(
        "{column} {direction} NULLS LAST, t.id {direction}",
        column = column,
        direction = direction
    )
}

/// Add the search filter (title or any tag, case-insensitive) to the query string.
fn add_search_filter(query: &mut String, param_idx: &mut usize, has_search: bool) {
    if has_search {
        query.push_str(&format!(
            "AND (t.title ILIKE ${idx} ESCAPE '\\' OR EXISTS (SELECT 1 FROM task_tag tt WHERE tt.task_id = t.id AND tt.tag ILIKE ${idx} ESCAPE '\\')) ",
            idx = param_idx
        ));
        *param_idx += 1;
    }
}

/// Add the completed/overdue filters to the query string.
fn add_status_filters(
    query: &mut String,
    param_idx: &mut usize,
    completed: Option<bool>,
    overdue: Option<bool>,
) {
    if completed.is_some() {
        query.push_str(&format!("AND t.completed = ${} ", param_idx));
        *param_idx += 1;
    }
    match overdue {
        Some(true) => {
            query.push_str(&format!(
                "AND t.completed = false AND t.due_date < ${} ",
                param_idx
            ));
            *param_idx += 1;
        }
        Some(false) => {
            query.push_str(&format!(
                "AND NOT (t.completed = false AND t.due_date IS NOT NULL AND t.due_date < ${}) ",
                param_idx
            ));
            *param_idx += 1;
        }
        None => {}
    }
}

/// Build the LIKE pattern for a search term.
fn search_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Bind search and status parameters in the order the clauses were added.
macro_rules! bind_list_filters {
    ($query:expr, $pattern:expr, $req:expr, $with_status:expr) => {{
        let mut q = $query;
        if let Some(pattern) = &$pattern {
            q = q.bind(pattern.clone());
        }
        if $with_status {
            if let Some(completed) = $req.completed {
                q = q.bind(completed);
            }
            if $req.overdue.is_some() {
                q = q.bind($req.now);
            }
        }
        q
    }};
}

/// Map a database row to a Task.
fn map_row_to_task(row: PgRow) -> Result<Task> {
    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        completed: row.try_get("completed")?,
        due_date: row.try_get("due_date")?,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.insert_tx(&mut tx, task).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(result)
    }

    async fn fetch(&self, id: &str) -> Result<Task> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.fetch_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(result)
    }

    async fn list(&self, req: ListTasksRequest) -> Result<ListTasksResponse> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.list_tx(&mut tx, req).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(result)
    }

    async fn update(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.update_tx(&mut tx, id, update).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(result)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.delete_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let tags: Vec<String> = sqlx::query_scalar("SELECT DISTINCT tag FROM task_tag ORDER BY tag")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(tags)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        log_pool_metrics(&self.pool);
        Ok(())
    }
}

// =============================================================================
// TRANSACTION-AWARE METHODS
// =============================================================================

impl PgTaskRepository {
    /// Insert a task and its tags within an existing transaction.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        task: NewTask,
    ) -> Result<Task> {
        sqlx::query(
            "INSERT INTO task (id, title, completed, due_date, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(task.completed)
        .bind(task.due_date)
        .bind(task.created_at)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        self.insert_tags_tx(tx, &task.id, &task.tags).await?;

        debug!(
            subsystem = "database",
            component = "tasks",
            op = "insert",
            task_id = %task.id,
            tag_count = task.tags.len(),
            "Task inserted"
        );

        self.fetch_tx(tx, &task.id).await
    }

    /// Fetch a task within an existing transaction.
    pub async fn fetch_tx(&self, tx: &mut Transaction<'_, Postgres>, id: &str) -> Result<Task> {
        let query = format!("SELECT {} FROM task t WHERE t.id = $1", TASK_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::task_not_found(id))?;
        map_row_to_task(row)
    }

    /// List tasks within an existing transaction.
    ///
    /// Counts are taken over the search scope only, before the completed and
    /// overdue filters narrow the page.
    pub async fn list_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: ListTasksRequest,
    ) -> Result<ListTasksResponse> {
        let start = Instant::now();
        let pattern = req.effective_search().map(search_pattern);
        let order_clause = build_order_clause(req.order_by, req.ascending);

        // Count query over the search scope
        let mut count_query = String::from(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE t.completed) AS completed
             FROM task t WHERE TRUE ",
        );
        let mut param_idx = 1;
        add_search_filter(&mut count_query, &mut param_idx, pattern.is_some());

        let count_row = {
            let q = sqlx::query(&count_query);
            let q = bind_list_filters!(q, pattern, req, false);
            q.fetch_one(&mut **tx).await.map_err(Error::Database)?
        };
        let total_count: i64 = count_row.try_get("total")?;
        let completed_count: i64 = count_row.try_get("completed")?;

        // Page query with every filter applied
        let mut tasks_query = format!("SELECT {} FROM task t WHERE TRUE ", TASK_COLUMNS);
        param_idx = 1;
        add_search_filter(&mut tasks_query, &mut param_idx, pattern.is_some());
        add_status_filters(&mut tasks_query, &mut param_idx, req.completed, req.overdue);
        tasks_query.push_str(&format!(
            "ORDER BY {} LIMIT ${} OFFSET ${}",
            order_clause,
            param_idx,
            param_idx + 1
        ));

        let rows = {
            let mut q = sqlx::query(&tasks_query);
            q = bind_list_filters!(q, pattern, req, true);
            q = q.bind(req.take).bind(req.skip);
            q.fetch_all(&mut **tx).await.map_err(Error::Database)?
        };

        let tasks = rows
            .into_iter()
            .map(map_row_to_task)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "database",
            component = "tasks",
            op = "list",
            result_count = tasks.len(),
            total_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tasks listed"
        );

        Ok(ListTasksResponse::new(tasks, total_count, completed_count))
    }

    /// Replace a task's fields and tag set within an existing transaction.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
        update: TaskUpdate,
    ) -> Result<Task> {
        let result = sqlx::query(
            "UPDATE task
             SET title = $1,
                 completed = $2,
                 due_date = $3,
                 updated_at = GREATEST($4, COALESCE(updated_at, created_at) + INTERVAL '1 microsecond')
             WHERE id = $5",
        )
        .bind(&update.title)
        .bind(update.completed)
        .bind(update.due_date)
        .bind(update.updated_at)
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::task_not_found(id));
        }

        sqlx::query("DELETE FROM task_tag WHERE task_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        self.insert_tags_tx(tx, id, &update.tags).await?;

        debug!(
            subsystem = "database",
            component = "tasks",
            op = "update",
            task_id = %id,
            tag_count = update.tags.len(),
            "Task updated"
        );

        self.fetch_tx(tx, id).await
    }

    /// Delete a task within an existing transaction. Tags go with it via cascade.
    pub async fn delete_tx(&self, tx: &mut Transaction<'_, Postgres>, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM task WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::task_not_found(id));
        }

        debug!(
            subsystem = "database",
            component = "tasks",
            op = "delete",
            task_id = %id,
            "Task deleted"
        );
        Ok(())
    }

    async fn insert_tags_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        task_id: &str,
        tags: &[String],
    ) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO task_tag (tag, task_id)
             SELECT tag, $2 FROM UNNEST($1::TEXT[]) AS tag
             ON CONFLICT (tag, task_id) DO NOTHING",
        )
        .bind(tags)
        .bind(task_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
