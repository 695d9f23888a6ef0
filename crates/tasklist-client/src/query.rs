//! List query parameters for the client.

use tasklist_core::defaults::{PAGE_SIZE, PAGE_SIZE_MAX};
use tasklist_core::TaskSortField;

/// Filters, ordering, and page size for a task listing.
///
/// Two queries that compare equal address the same cached feed. The page
/// size is kept within what the server will return for one request, so a
/// short page always means the end of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub search_term: Option<String>,
    pub completed: Option<bool>,
    pub overdue: Option<bool>,
    pub order_by: TaskSortField,
    pub ascending: bool,
    page_size: i64,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            search_term: None,
            completed: None,
            overdue: None,
            order_by: TaskSortField::CreatedAt,
            ascending: false,
            page_size: PAGE_SIZE,
        }
    }
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn overdue(mut self, overdue: bool) -> Self {
        self.overdue = Some(overdue);
        self
    }

    pub fn order_by(mut self, field: TaskSortField, ascending: bool) -> Self {
        self.order_by = field;
        self.ascending = ascending;
        self
    }

    /// Rows per page, clamped to `1..=PAGE_SIZE_MAX`.
    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.clamp(1, PAGE_SIZE_MAX);
        self
    }

    /// Rows requested per page.
    pub fn take(&self) -> i64 {
        self.page_size
    }

    /// Offset of page `page` (zero-based).
    pub fn skip_for(&self, page: usize) -> i64 {
        page as i64 * self.page_size
    }

    /// Query-string pairs for page `page`.
    pub fn to_params(&self, page: usize) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(7);
        if let Some(term) = self.search_term.as_deref().filter(|t| !t.trim().is_empty()) {
            params.push(("searchTerm", term.to_string()));
        }
        if let Some(completed) = self.completed {
            params.push(("completed", completed.to_string()));
        }
        if let Some(overdue) = self.overdue {
            params.push(("overdue", overdue.to_string()));
        }
        params.push(("orderBy", self.order_by.as_param().to_string()));
        params.push(("ascending", self.ascending.to_string()));
        params.push(("skip", self.skip_for(page).to_string()));
        params.push(("take", self.page_size.to_string()));
        params
    }
}
