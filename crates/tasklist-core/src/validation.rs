//! Input validation for task writes.
//!
//! Both create and update run through here before anything reaches the
//! store, so the store only ever sees titles within bounds and tag sets
//! without duplicates.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::defaults::{TAG_MAX_CHARS, TITLE_MAX_CHARS, TITLE_MIN_CHARS};
use crate::error::{Error, Result};
use crate::models::{NewTask, TaskInput, TaskUpdate};

/// Message returned for any title outside the allowed range.
pub const TITLE_LENGTH_MESSAGE: &str = "Title must be 1-140 characters long.";

/// Validate a task title.
///
/// Length is counted in characters, not bytes. A title consisting only of
/// whitespace is rejected.
pub fn validate_title(title: &str) -> Result<()> {
    let len = title.chars().count();
    if title.trim().is_empty() || !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        return Err(Error::InvalidInput(TITLE_LENGTH_MESSAGE.to_string()));
    }
    Ok(())
}

/// Trim, validate, and de-duplicate tag texts.
///
/// The first occurrence of each tag wins; comparison is exact after trimming.
pub fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>> {
    let mut seen = HashSet::with_capacity(tags.len());
    let mut result = Vec::with_capacity(tags.len());

    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::InvalidInput("Tags cannot be empty.".to_string()));
        }
        if tag.chars().count() > TAG_MAX_CHARS {
            return Err(Error::InvalidInput(format!(
                "Tags must be {} characters or less.",
                TAG_MAX_CHARS
            )));
        }
        if seen.insert(tag.to_string()) {
            result.push(tag.to_string());
        }
    }

    Ok(result)
}

impl TaskInput {
    /// Validate and build the record for a new task.
    pub fn into_new_task(self, id: String, created_at: DateTime<Utc>) -> Result<NewTask> {
        validate_title(&self.title)?;
        let tags = normalize_tags(self.tags.unwrap_or_default())?;
        Ok(NewTask {
            id,
            title: self.title,
            completed: self.completed.unwrap_or(false),
            due_date: self.due_date,
            tags,
            created_at,
        })
    }

    /// Validate and build a full replacement for an existing task.
    pub fn into_update(self, updated_at: DateTime<Utc>) -> Result<TaskUpdate> {
        validate_title(&self.title)?;
        let tags = normalize_tags(self.tags.unwrap_or_default())?;
        Ok(TaskUpdate {
            title: self.title,
            completed: self.completed.unwrap_or(false),
            due_date: self.due_date,
            tags,
            updated_at,
        })
    }
}
