//! Task query and command service.
//!
//! Sits between the HTTP handlers and the [`TaskRepository`]: assigns ids and
//! timestamps, validates input before the store is touched, and turns raw
//! list queries into repository requests.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use tasklist_core::{
    new_task_id, ListTasksResponse, Result, Task, TaskInput, TaskRepository,
};

use crate::query_types::ListTasksQuery;

/// Task operations over an injected repository.
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    /// Search, filter, sort, and paginate tasks.
    pub async fn list_tasks(&self, query: ListTasksQuery) -> Result<ListTasksResponse> {
        let start = Instant::now();
        let req = query.into_request(Utc::now())?;
        let order_by = req.order_by.as_param();
        let response = self.repo.list(req).await?;

        debug!(
            subsystem = "service",
            component = "tasks",
            op = "list",
            order_by,
            result_count = response.returned_count,
            total_count = response.total_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed tasks"
        );
        Ok(response)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        self.repo.fetch(id).await
    }

    /// Validate and store a new task with a fresh id and creation time.
    pub async fn create_task(&self, input: TaskInput) -> Result<Task> {
        let new_task = input.into_new_task(new_task_id(), Utc::now())?;
        let task = self.repo.insert(new_task).await?;

        info!(
            subsystem = "service",
            component = "tasks",
            op = "create",
            task_id = %task.id,
            tag_count = task.tags.len(),
            "Task created"
        );
        Ok(task)
    }

    /// Replace every field of an existing task.
    pub async fn update_task(&self, id: &str, input: TaskInput) -> Result<Task> {
        let update = input.into_update(Utc::now())?;
        let task = self.repo.update(id, update).await?;

        info!(
            subsystem = "service",
            component = "tasks",
            op = "update",
            task_id = %task.id,
            completed = task.completed,
            "Task updated"
        );
        Ok(task)
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        self.repo.delete(id).await?;
        info!(
            subsystem = "service",
            component = "tasks",
            op = "delete",
            task_id = %id,
            "Task deleted"
        );
        Ok(())
    }

    /// Distinct tags across all tasks, sorted.
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        self.repo.list_tags().await
    }

    /// Store connectivity probe.
    pub async fn ping(&self) -> Result<()> {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tasklist_core::{Error, InMemoryTaskRepository, TITLE_LENGTH_MESSAGE};

    fn service() -> TaskService {
        TaskService::new(Arc::new(InMemoryTaskRepository::new()))
    }

    fn list_query() -> ListTasksQuery {
        ListTasksQuery::default()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_created_at() {
        let svc = service();
        let before = Utc::now();
        let a = svc.create_task(TaskInput::titled("a")).await.unwrap();
        let b = svc.create_task(TaskInput::titled("b")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.created_at >= before);
        assert!(a.created_at - before < Duration::seconds(5));
        assert!(!a.completed);
        assert!(a.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_create_title_boundaries() {
        let svc = service();
        assert!(svc.create_task(TaskInput::titled("x")).await.is_ok());
        assert!(svc
            .create_task(TaskInput::titled("x".repeat(140)))
            .await
            .is_ok());

        for bad in [String::new(), "x".repeat(141)] {
            let err = svc.create_task(TaskInput::titled(bad)).await.unwrap_err();
            match err {
                Error::InvalidInput(msg) => assert_eq!(msg, TITLE_LENGTH_MESSAGE),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_create_dedupes_tags() {
        let svc = service();
        let task = svc
            .create_task(TaskInput::titled("t").with_tags(["a", "a", "b"]))
            .await
            .unwrap();
        assert_eq!(task.tags, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_update_is_full_replacement() {
        let svc = service();
        let task = svc
            .create_task(
                TaskInput::titled("t")
                    .with_tags(["keep"])
                    .with_completed(true),
            )
            .await
            .unwrap();

        let updated = svc
            .update_task(&task.id, TaskInput::titled("renamed"))
            .await
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert!(!updated.completed);
        assert!(updated.tags.is_empty());
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, task.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let svc = service();
        let err = svc
            .update_task("missing", TaskInput::titled("t"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_validates_before_store() {
        let svc = service();
        let task = svc.create_task(TaskInput::titled("t")).await.unwrap();
        let err = svc
            .update_task(&task.id, TaskInput::titled(""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(svc.get_task(&task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let svc = service();
        assert!(svc.delete_task("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_filters_completed_and_overdue() {
        let svc = service();
        let now = Utc::now();
        svc.create_task(TaskInput::titled("Write README"))
            .await
            .unwrap();
        let bills = svc
            .create_task(
                TaskInput::titled("Pay bills")
                    .with_tags(["finance"])
                    .with_due_date(now - Duration::days(1)),
            )
            .await
            .unwrap();
        svc.create_task(TaskInput::titled("Done").with_completed(true))
            .await
            .unwrap();

        let mut q = list_query();
        q.overdue = Some("true".into());
        let resp = svc.list_tasks(q).await.unwrap();
        assert_eq!(resp.tasks.len(), 1);
        assert_eq!(resp.tasks[0].id, bills.id);

        let mut q = list_query();
        q.completed = Some("true".into());
        let resp = svc.list_tasks(q).await.unwrap();
        assert!(resp.tasks.iter().all(|t| t.completed));
        assert_eq!(resp.returned_count, 1);
        assert_eq!(resp.total_count, 3);
        assert_eq!(resp.completed_count, 1);
    }

    #[tokio::test]
    async fn test_list_search_matches_tag_text() {
        let svc = service();
        svc.create_task(TaskInput::titled("Pay bills").with_tags(["Finance"]))
            .await
            .unwrap();
        svc.create_task(TaskInput::titled("Walk dog")).await.unwrap();

        let mut q = list_query();
        q.search_term = Some("FIN".into());
        let resp = svc.list_tasks(q).await.unwrap();
        assert_eq!(resp.total_count, 1);
        assert_eq!(resp.tasks[0].title, "Pay bills");
    }

    #[tokio::test]
    async fn test_list_rejects_bad_paging() {
        let svc = service();
        let mut q = list_query();
        q.take = Some("0".into());
        assert!(matches!(
            svc.list_tasks(q).await.unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_list_tags_and_ping() {
        let svc = service();
        svc.create_task(TaskInput::titled("a").with_tags(["work", "home"]))
            .await
            .unwrap();
        assert_eq!(svc.list_tags().await.unwrap(), vec!["home", "work"]);
        svc.ping().await.unwrap();
    }
}
