//! HTTP handlers for tasklist-api.

pub mod health;
pub mod tags;
pub mod tasks;
