//! # tasklist-client
//!
//! Client side of tasklist: a typed HTTP client plus a paged, optimistic
//! cache for browser-style task feeds.
//!
//! - [`TaskClient`]: one method per API endpoint
//! - [`TaskQuery`]: list filters and page size; page `p` maps to
//!   `skip = p * page_size`
//! - [`TaskCache`]: loaded pages for one query with snapshot/restore
//! - [`TaskFeed`]: ties the two together with incremental paging and
//!   optimistic mutations that roll back on failure

pub mod cache;
pub mod client;
pub mod feed;
pub mod query;

pub use cache::{CacheSnapshot, TaskCache};
pub use client::{TaskClient, DEFAULT_API_URL};
pub use feed::TaskFeed;
pub use query::TaskQuery;

pub use tasklist_core::{Error, ListTasksResponse, Result, Task, TaskInput, TaskSortField};
