//! In-memory [`TaskRepository`] for tests and local development.
//!
//! Mirrors the PostgreSQL repository's query semantics: case-insensitive
//! search over title and tags, counts over the search scope only, NULL sort
//! keys last, and `id` as the tiebreaker in the sort direction.
//!
//! Each instance owns its own map; construct one per test and inject it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::{NewTask, Task, TaskSortField, TaskUpdate};
use crate::traits::{ListTasksRequest, ListTasksResponse, TaskRepository};

/// Task store backed by a `BTreeMap` keyed by task id.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<BTreeMap<String, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

fn sorted_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Compare two optional keys with `None` last regardless of direction.
fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            if ascending {
                x.cmp(y)
            } else {
                y.cmp(x)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_tasks(a: &Task, b: &Task, field: TaskSortField, ascending: bool) -> Ordering {
    let primary = match field {
        TaskSortField::Title => cmp_nulls_last(&Some(&a.title), &Some(&b.title), ascending),
        TaskSortField::DueDate => cmp_nulls_last(&a.due_date, &b.due_date, ascending),
        TaskSortField::UpdatedAt => cmp_nulls_last(&a.updated_at, &b.updated_at, ascending),
        TaskSortField::CreatedAt => {
            cmp_nulls_last(&Some(a.created_at), &Some(b.created_at), ascending)
        }
    };
    primary.then_with(|| {
        if ascending {
            a.id.cmp(&b.id)
        } else {
            b.id.cmp(&a.id)
        }
    })
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: NewTask) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(Error::Internal(format!("Duplicate task id {}", task.id)));
        }
        let stored = Task {
            id: task.id.clone(),
            title: task.title,
            completed: task.completed,
            due_date: task.due_date,
            tags: sorted_tags(task.tags),
            created_at: task.created_at,
            updated_at: None,
        };
        tasks.insert(task.id, stored.clone());
        Ok(stored)
    }

    async fn fetch(&self, id: &str) -> Result<Task> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::task_not_found(id))
    }

    async fn list(&self, req: ListTasksRequest) -> Result<ListTasksResponse> {
        let tasks = self.tasks.read().await;

        let scope: Vec<&Task> = match req.effective_search() {
            Some(term) => tasks.values().filter(|t| t.matches_search(term)).collect(),
            None => tasks.values().collect(),
        };

        let total_count = scope.len() as i64;
        let completed_count = scope.iter().filter(|t| t.completed).count() as i64;

        let mut page: Vec<Task> = scope
            .into_iter()
            .filter(|t| req.completed.map_or(true, |c| t.completed == c))
            .filter(|t| req.overdue.map_or(true, |o| t.is_overdue(req.now) == o))
            .cloned()
            .collect();

        page.sort_by(|a, b| compare_tasks(a, b, req.order_by, req.ascending));

        let page: Vec<Task> = page
            .into_iter()
            .skip(req.skip.max(0) as usize)
            .take(req.take.max(0) as usize)
            .collect();

        Ok(ListTasksResponse::new(page, total_count, completed_count))
    }

    async fn update(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| Error::task_not_found(id))?;

        let previous = task.updated_at.unwrap_or(task.created_at);
        let updated_at = update
            .updated_at
            .max(previous + Duration::microseconds(1));

        task.title = update.title;
        task.completed = update.completed;
        task.due_date = update.due_date;
        task.tags = sorted_tags(update.tags);
        task.updated_at = Some(updated_at);

        Ok(task.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.tasks
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::task_not_found(id))
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let tasks = self.tasks.read().await;
        let tags: BTreeSet<String> = tasks
            .values()
            .flat_map(|t| t.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
