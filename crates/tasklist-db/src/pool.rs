//! PostgreSQL pool setup.
//!
//! Only two knobs are exposed: how many connections the pool may open and how
//! long a request waits for one. Both come from the server configuration.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use tasklist_core::defaults::{DB_CONNECT_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use tasklist_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// Wait for a free connection before the request fails.
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(DB_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::Config(
                "database pool needs at least one connection".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::Config(
                "database connect timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Open a pool with [`PoolConfig::default`].
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Open a pool and wait for the first connection.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    config.validate()?;
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        connect_timeout_secs = config.connect_timeout.as_secs(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Task store connected"
    );
    Ok(pool)
}

/// Open and idle connection counts at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

impl PoolStats {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
        }
    }

    /// Every open connection is checked out.
    pub fn is_saturated(&self) -> bool {
        self.size > 0 && self.idle == 0
    }
}

/// Log pool usage; warns when the pool is saturated.
pub fn log_pool_metrics(pool: &PgPool) {
    let stats = PoolStats::of(pool);
    if stats.is_saturated() {
        warn!(
            subsystem = "database",
            component = "pool",
            pool_size = stats.size,
            "All task store connections are busy"
        );
    } else {
        debug!(
            subsystem = "database",
            component = "pool",
            pool_size = stats.size,
            pool_idle = stats.idle,
            "Task store pool usage"
        );
    }
}
