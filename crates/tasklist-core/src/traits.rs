//! Core traits for tasklist abstractions.
//!
//! The store is reached only through [`TaskRepository`], so the service and
//! HTTP layers can run against PostgreSQL in production and an in-memory
//! implementation in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{PAGE_OFFSET, PAGE_SIZE};
use crate::error::Result;
use crate::models::*;

// =============================================================================
// TASK REPOSITORY
// =============================================================================

/// Request for listing tasks.
///
/// Filters compose conjunctively. The counts in the response cover only the
/// search scope; `completed` and `overdue` narrow the returned page but not
/// the counts.
#[derive(Debug, Clone)]
pub struct ListTasksRequest {
    /// Matches title or any tag text, case-insensitive substring
    pub search_term: Option<String>,
    /// Exact match on the completion flag
    pub completed: Option<bool>,
    /// `Some(true)`: only overdue tasks. `Some(false)`: exclude overdue tasks.
    pub overdue: Option<bool>,
    /// Pagination offset
    pub skip: i64,
    /// Maximum results
    pub take: i64,
    pub order_by: TaskSortField,
    pub ascending: bool,
    /// Reference time for the overdue filter
    pub now: DateTime<Utc>,
}

impl ListTasksRequest {
    /// Defaults: first page of 20, newest first.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            search_term: None,
            completed: None,
            overdue: None,
            skip: PAGE_OFFSET,
            take: PAGE_SIZE,
            order_by: TaskSortField::CreatedAt,
            ascending: false,
            now,
        }
    }

    /// The trimmed search term, or `None` when absent or blank.
    pub fn effective_search(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Response for listing tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksResponse {
    pub tasks: Vec<Task>,
    /// Tasks matching the search term, before completed/overdue filters
    pub total_count: i64,
    /// Completed tasks matching the search term, before completed/overdue filters
    pub completed_count: i64,
    /// Length of `tasks`
    pub returned_count: i64,
}

impl ListTasksResponse {
    pub fn new(tasks: Vec<Task>, total_count: i64, completed_count: i64) -> Self {
        let returned_count = tasks.len() as i64;
        Self {
            tasks,
            total_count,
            completed_count,
            returned_count,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0)
    }
}

/// Repository for task CRUD operations.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a validated task with its tags.
    async fn insert(&self, task: NewTask) -> Result<Task>;

    /// Fetch a task by ID. Fails with `NotFound` if absent.
    async fn fetch(&self, id: &str) -> Result<Task>;

    /// List tasks with filtering, sorting, and pagination.
    async fn list(&self, req: ListTasksRequest) -> Result<ListTasksResponse>;

    /// Replace every mutable field and the tag set. Fails with `NotFound` if absent.
    async fn update(&self, id: &str, update: TaskUpdate) -> Result<Task>;

    /// Delete a task and its tags. Fails with `NotFound` if absent.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Distinct tag texts across all tasks, sorted ascending.
    async fn list_tags(&self) -> Result<Vec<String>>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request_defaults() {
        let now = Utc::now();
        let req = ListTasksRequest::new(now);
        assert_eq!(req.skip, 0);
        assert_eq!(req.take, 20);
        assert_eq!(req.order_by, TaskSortField::CreatedAt);
        assert!(!req.ascending);
        assert_eq!(req.now, now);
    }

    #[test]
    fn test_effective_search_ignores_blank() {
        let mut req = ListTasksRequest::new(Utc::now());
        assert_eq!(req.effective_search(), None);

        req.search_term = Some("   ".to_string());
        assert_eq!(req.effective_search(), None);

        req.search_term = Some("  bills ".to_string());
        assert_eq!(req.effective_search(), Some("bills"));
    }

    #[test]
    fn test_list_response_counts_returned() {
        let resp = ListTasksResponse::empty();
        assert_eq!(resp.returned_count, 0);

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("totalCount").is_some());
        assert!(json.get("completedCount").is_some());
        assert!(json.get("returnedCount").is_some());
    }
}
