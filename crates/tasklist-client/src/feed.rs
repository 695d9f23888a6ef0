//! Paged task feed with optimistic mutations.
//!
//! Every mutation follows the same sequence: snapshot the cache, apply the
//! expected result locally, send the request, then either reconcile with the
//! server's answer and refetch the loaded pages, or restore the snapshot and
//! return the error.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, warn};

use tasklist_core::{ListTasksResponse, Result, Task, TaskInput};

use crate::cache::TaskCache;
use crate::client::TaskClient;
use crate::query::TaskQuery;

/// Local approximation of the server's tag handling.
fn local_tags(tags: Option<&Vec<String>>) -> Vec<String> {
    tags.map(|tags| {
        tags.iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    })
    .unwrap_or_default()
}

/// A [`TaskClient`] plus the cached pages of one query.
#[derive(Debug)]
pub struct TaskFeed {
    client: TaskClient,
    cache: TaskCache,
    /// Sequence for placeholder ids of unconfirmed creates.
    next_pending: u64,
}

impl TaskFeed {
    pub fn new(client: TaskClient, query: TaskQuery) -> Self {
        Self {
            client,
            cache: TaskCache::new(query),
            next_pending: 1,
        }
    }

    /// Placeholder id for a task the server has not assigned yet.
    fn pending_id(&mut self) -> String {
        let id = format!("pending-{}", self.next_pending);
        self.next_pending += 1;
        id
    }

    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    pub fn client(&self) -> &TaskClient {
        &self.client
    }

    /// Loaded tasks, de-duplicated across pages.
    pub fn tasks(&self) -> Vec<Task> {
        self.cache.tasks()
    }

    pub fn has_next_page(&self) -> bool {
        self.cache.has_next_page()
    }

    /// Discard loaded pages and fetch page 0.
    pub async fn load_first_page(&mut self) -> Result<()> {
        let page = self.client.list_tasks(self.cache.query(), 0).await?;
        self.cache.replace_pages(vec![page]);
        Ok(())
    }

    /// Append the next page. Returns false when there is nothing more to load.
    pub async fn fetch_next_page(&mut self) -> Result<bool> {
        let Some(index) = self.cache.next_page_index() else {
            return Ok(false);
        };
        let page = self.client.list_tasks(self.cache.query(), index).await?;
        self.cache.push_page(page);
        Ok(true)
    }

    /// Re-fetch as many pages as are loaded (at least one).
    ///
    /// The cache is only replaced once every page has arrived.
    pub async fn refetch(&mut self) -> Result<()> {
        let wanted = self.cache.pages().len().max(1);
        let page_size = self.cache.query().take();
        let mut pages: Vec<ListTasksResponse> = Vec::with_capacity(wanted);
        for index in 0..wanted {
            let page = self.client.list_tasks(self.cache.query(), index).await?;
            let full = page.returned_count >= page_size;
            pages.push(page);
            if !full {
                break;
            }
        }
        debug!(subsystem = "client", op = "refetch", pages = pages.len(), "Feed refreshed");
        self.cache.replace_pages(pages);
        Ok(())
    }

    /// Refetch after a successful mutation. The mutation already succeeded,
    /// so a failed refetch only leaves the reconciled cache in place.
    async fn refresh_after_mutation(&mut self, op: &str) {
        if let Err(e) = self.refetch().await {
            warn!(subsystem = "client", op, error = %e, "Refetch after mutation failed");
        }
    }

    /// Create a task, showing it immediately under a placeholder id.
    pub async fn create(&mut self, input: TaskInput) -> Result<Task> {
        let snapshot = self.cache.snapshot();
        let placeholder_id = self.pending_id();
        self.cache.insert_front(Task {
            id: placeholder_id.clone(),
            title: input.title.trim().to_string(),
            completed: input.completed.unwrap_or(false),
            due_date: input.due_date,
            tags: local_tags(input.tags.as_ref()),
            created_at: Utc::now(),
            updated_at: None,
        });

        match self.client.create_task(&input).await {
            Ok(task) => {
                self.cache.replace(&placeholder_id, task.clone());
                self.refresh_after_mutation("create").await;
                Ok(task)
            }
            Err(e) => {
                self.cache.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Replace a task, applying the new fields locally first.
    pub async fn update(&mut self, id: &str, input: TaskInput) -> Result<Task> {
        let snapshot = self.cache.snapshot();
        if let Some(current) = self.cache.find(id).cloned() {
            self.cache.replace(
                id,
                Task {
                    title: input.title.trim().to_string(),
                    completed: input.completed.unwrap_or(false),
                    due_date: input.due_date,
                    tags: local_tags(input.tags.as_ref()),
                    updated_at: Some(Utc::now()),
                    ..current
                },
            );
        }

        match self.client.update_task(id, &input).await {
            Ok(task) => {
                self.cache.replace(id, task.clone());
                self.refresh_after_mutation("update").await;
                Ok(task)
            }
            Err(e) => {
                self.cache.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Flip the completion flag of a loaded task.
    pub async fn toggle_completed(&mut self, id: &str) -> Result<Task> {
        let input = match self.cache.find(id) {
            Some(task) => TaskInput::from(task).with_completed(!task.completed),
            None => {
                let task = self.client.get_task(id).await?;
                TaskInput::from(&task).with_completed(!task.completed)
            }
        };
        self.update(id, input).await
    }

    /// Delete a task, removing it locally first.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let snapshot = self.cache.snapshot();
        self.cache.remove(id);

        match self.client.delete_task(id).await {
            Ok(()) => {
                self.refresh_after_mutation("delete").await;
                Ok(())
            }
            Err(e) => {
                self.cache.restore(snapshot);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_ids_are_per_feed() {
        let client = TaskClient::new("http://localhost:3000").unwrap();
        let mut first = TaskFeed::new(client.clone(), TaskQuery::new());
        let mut second = TaskFeed::new(client, TaskQuery::new());

        assert_eq!(first.pending_id(), "pending-1");
        assert_eq!(first.pending_id(), "pending-2");
        assert_eq!(second.pending_id(), "pending-1");
    }

    #[test]
    fn test_local_tags_match_server_normalization() {
        let tags = vec![" b ".to_string(), "a".to_string(), "b".to_string(), "".to_string()];
        assert_eq!(local_tags(Some(&tags)), vec!["a", "b"]);
        assert!(local_tags(None).is_empty());
    }
}
