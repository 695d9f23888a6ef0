//! Query string parsing for `GET /tasks`.
//!
//! Every field arrives as a raw string so that empty values (`?completed=`)
//! can be treated as absent and malformed values produce a readable 400
//! instead of a generic deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tasklist_core::defaults::{PAGE_OFFSET, PAGE_SIZE, PAGE_SIZE_MAX};
use tasklist_core::{Error, ListTasksRequest, Result, TaskSortField};

/// Raw `GET /tasks` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Case-insensitive substring match on title or any tag
    pub search_term: Option<String>,
    /// `true` or `false`
    pub completed: Option<String>,
    /// `true`: only overdue tasks. `false`: exclude overdue tasks.
    pub overdue: Option<String>,
    /// Offset, at least 0 (default 0)
    pub skip: Option<String>,
    /// Page size, at least 1 (default 20, capped at 100)
    pub take: Option<String>,
    /// `title`, `dueDate`, `updatedAt` or `createdAt` (default)
    pub order_by: Option<String>,
    /// `true` for ascending (default descending)
    pub ascending: Option<String>,
}

/// Treat missing and blank values the same.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &Option<String>) -> Result<Option<bool>> {
    match present(value) {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(Some(false)),
        Some(v) => Err(Error::InvalidInput(format!(
            "{} must be true or false, got '{}'",
            name, v
        ))),
    }
}

fn parse_int(name: &str, value: &Option<String>) -> Result<Option<i64>> {
    match present(value) {
        None => Ok(None),
        Some(v) => v.parse::<i64>().map(Some).map_err(|_| {
            Error::InvalidInput(format!("{} must be an integer, got '{}'", name, v))
        }),
    }
}

impl ListTasksQuery {
    /// Validate and convert into a repository request evaluated at `now`.
    pub fn into_request(self, now: DateTime<Utc>) -> Result<ListTasksRequest> {
        let completed = parse_bool("completed", &self.completed)?;
        let overdue = parse_bool("overdue", &self.overdue)?;
        let ascending = parse_bool("ascending", &self.ascending)?.unwrap_or(false);

        let skip = parse_int("skip", &self.skip)?.unwrap_or(PAGE_OFFSET);
        if skip < 0 {
            return Err(Error::InvalidInput("skip must be >= 0".into()));
        }
        let take = parse_int("take", &self.take)?.unwrap_or(PAGE_SIZE);
        if take < 1 {
            return Err(Error::InvalidInput("take must be >= 1".into()));
        }

        let order_by = present(&self.order_by)
            .map(TaskSortField::parse)
            .unwrap_or_default();
        let search_term = present(&self.search_term).map(str::to_string);

        Ok(ListTasksRequest {
            search_term,
            completed,
            overdue,
            skip,
            take: take.min(PAGE_SIZE_MAX),
            order_by,
            ascending,
            now,
        })
    }
}
