//! # tasklist-core
//!
//! Core types, validation, and repository traits for the tasklist service.
//!
//! This crate provides the data model shared by the store, the HTTP API, and
//! the client, plus the [`TaskRepository`] trait that decouples the service
//! from PostgreSQL.

pub mod datetime;
pub mod defaults;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use datetime::parse_flexible_datetime;
pub use error::{Error, Result};
#[cfg(any(test, feature = "mock"))]
pub use mock::InMemoryTaskRepository;
pub use models::*;
pub use traits::*;
pub use validation::{normalize_tags, validate_title, TITLE_LENGTH_MESSAGE};
