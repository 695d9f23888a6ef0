//! Paged task cache with snapshot/restore.
//!
//! Holds the pages loaded so far for one [`TaskQuery`]. Pages are kept as
//! the server returned them; [`TaskCache::tasks`] flattens them, dropping
//! later duplicates of an id (a task can shift across a page boundary
//! between fetches).
//!
//! Whether another page exists is decided from the length the server sent,
//! not from the current page contents, so optimistic removals never end
//! incremental loading.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use tasklist_core::{ListTasksResponse, Task};

use crate::query::TaskQuery;

/// Saved cache pages, restored when an optimistic mutation fails.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    pages: Vec<ListTasksResponse>,
    last_page_full: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCache {
    query: TaskQuery,
    pages: Vec<ListTasksResponse>,
    /// The most recent page arrived with `take` rows.
    last_page_full: bool,
}

impl TaskCache {
    pub fn new(query: TaskQuery) -> Self {
        Self {
            query,
            pages: Vec::new(),
            last_page_full: false,
        }
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn pages(&self) -> &[ListTasksResponse] {
        &self.pages
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn is_full(&self, page: &ListTasksResponse) -> bool {
        page.returned_count >= self.query.take()
    }

    /// Append a page as received from the server.
    pub fn push_page(&mut self, page: ListTasksResponse) {
        self.last_page_full = self.is_full(&page);
        self.pages.push(page);
    }

    /// Replace every page at once.
    pub fn replace_pages(&mut self, pages: Vec<ListTasksResponse>) {
        self.last_page_full = pages.last().map(|p| self.is_full(p)).unwrap_or(false);
        self.pages = pages;
    }

    /// Drop all loaded pages.
    pub fn invalidate(&mut self) {
        self.pages.clear();
        self.last_page_full = false;
    }

    /// Loaded tasks in page order, first occurrence of each id wins.
    pub fn tasks(&self) -> Vec<Task> {
        let mut seen = HashSet::new();
        self.pages
            .iter()
            .flat_map(|page| page.tasks.iter())
            .filter(|task| seen.insert(task.id.clone()))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.pages
            .iter()
            .flat_map(|page| page.tasks.iter())
            .find(|task| task.id == id)
    }

    /// True when the most recent page came back full.
    pub fn has_next_page(&self) -> bool {
        !self.pages.is_empty() && self.last_page_full
    }

    /// Index of the page to fetch next, if any.
    pub fn next_page_index(&self) -> Option<usize> {
        self.has_next_page().then_some(self.pages.len())
    }

    /// `(total_count, completed_count)` from the most recent page.
    pub fn counts(&self) -> Option<(i64, i64)> {
        self.pages
            .last()
            .map(|page| (page.total_count, page.completed_count))
    }

    /// Loaded tasks that are incomplete and past due at `now`.
    pub fn overdue_count(&self, now: DateTime<Utc>) -> usize {
        self.tasks().iter().filter(|t| t.is_overdue(now)).count()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            pages: self.pages.clone(),
            last_page_full: self.last_page_full,
        }
    }

    pub fn restore(&mut self, snapshot: CacheSnapshot) {
        self.pages = snapshot.pages;
        self.last_page_full = snapshot.last_page_full;
    }

    // -------------------------------------------------------------------------
    // Optimistic edits
    // -------------------------------------------------------------------------

    /// Put `task` at the head of the first page.
    pub fn insert_front(&mut self, task: Task) {
        let completed = task.completed;
        if self.pages.is_empty() {
            self.pages.push(ListTasksResponse::empty());
        }
        if let Some(first) = self.pages.first_mut() {
            first.tasks.insert(0, task);
            first.returned_count = first.tasks.len() as i64;
        }
        self.adjust_counts(1, i64::from(completed));
    }

    /// Replace the task with `id` wherever it appears. Returns false if absent.
    pub fn replace(&mut self, id: &str, task: Task) -> bool {
        let mut previous_completed = None;
        for page in &mut self.pages {
            for slot in page.tasks.iter_mut().filter(|t| t.id == id) {
                previous_completed.get_or_insert(slot.completed);
                *slot = task.clone();
            }
        }
        match previous_completed {
            Some(was) => {
                self.adjust_counts(0, i64::from(task.completed) - i64::from(was));
                true
            }
            None => false,
        }
    }

    /// Remove the task with `id` from every page. Returns the removed task.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let mut removed = None;
        for page in &mut self.pages {
            if let Some(pos) = page.tasks.iter().position(|t| t.id == id) {
                let task = page.tasks.remove(pos);
                page.returned_count = page.tasks.len() as i64;
                removed.get_or_insert(task);
            }
        }
        if let Some(task) = &removed {
            self.adjust_counts(-1, -i64::from(task.completed));
        }
        removed
    }

    fn adjust_counts(&mut self, total_delta: i64, completed_delta: i64) {
        for page in &mut self.pages {
            page.total_count = (page.total_count + total_delta).max(0);
            page.completed_count = (page.completed_count + completed_delta).max(0);
        }
    }
}
