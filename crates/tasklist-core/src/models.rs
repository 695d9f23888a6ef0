//! Core data models for tasklist.
//!
//! These types are shared across all tasklist crates: the store maps rows
//! into them, the API serializes them, and the client deserializes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::deserialize_optional_flexible;

// =============================================================================
// TASK TYPES
// =============================================================================

/// A to-do item with its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    /// Tag texts, unique per task, sorted ascending.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Null until the first update.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Incomplete with a due date strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.map(|due| due < now).unwrap_or(false)
    }

    /// True if the title or any tag contains `term`, ignoring case.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Write body for `POST /tasks` and `PUT /tasks/{id}`.
///
/// On update every field is replaced: an absent `completed` means `false`
/// and absent `tags` means no tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// RFC 3339, naive ISO-8601 (UTC assumed) or a plain date.
    #[serde(default, deserialize_with = "deserialize_optional_flexible")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TaskInput {
    /// Input with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }
}

impl From<&Task> for TaskInput {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            completed: Some(task.completed),
            due_date: task.due_date,
            tags: Some(task.tags.clone()),
        }
    }
}

/// Validated task ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    /// De-duplicated tag texts.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated full replacement for an existing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    /// De-duplicated tag texts; replaces the stored set.
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Generate a new task identifier.
///
/// UUIDv7 text, so identifiers sort by creation time.
pub fn new_task_id() -> String {
    Uuid::now_v7().to_string()
}

// =============================================================================
// SORTING
// =============================================================================

/// Sort key for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskSortField {
    Title,
    DueDate,
    UpdatedAt,
    #[default]
    CreatedAt,
}

impl TaskSortField {
    /// Parse a client-supplied sort key.
    ///
    /// Case, underscores, and hyphens are ignored (`DueDate`, `due_date`,
    /// `duedate` are equivalent). Unknown keys fall back to `CreatedAt`.
    pub fn parse(value: &str) -> Self {
        let normalized: String = value
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "title" => Self::Title,
            "duedate" => Self::DueDate,
            "updatedat" => Self::UpdatedAt,
            _ => Self::CreatedAt,
        }
    }

    /// Query-string spelling used by the HTTP API.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::DueDate => "dueDate",
            Self::UpdatedAt => "updatedAt",
            Self::CreatedAt => "createdAt",
        }
    }
}
