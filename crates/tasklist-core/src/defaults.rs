//! Centralized default constants for tasklist.
//!
//! All crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// TASK
// =============================================================================

/// Minimum title length in characters.
pub const TITLE_MIN_CHARS: usize = 1;

/// Maximum title length in characters (matches the `task.title` column).
pub const TITLE_MAX_CHARS: usize = 140;

/// Maximum tag length in characters.
pub const TAG_MAX_CHARS: usize = 100;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for `GET /tasks`.
pub const PAGE_SIZE: i64 = 20;

/// Upper bound on `take`; larger values are clamped.
pub const PAGE_SIZE_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default request body limit in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

// =============================================================================
// DATABASE
// =============================================================================

/// Default size cap of the PostgreSQL pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default wait for a free pool connection, in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_within_cap() {
        assert!(PAGE_SIZE <= PAGE_SIZE_MAX);
        assert!(PAGE_SIZE > 0);
    }

    #[test]
    fn test_title_bounds() {
        assert_eq!(TITLE_MIN_CHARS, 1);
        assert_eq!(TITLE_MAX_CHARS, 140);
    }
}
