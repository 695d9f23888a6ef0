//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/tasklist` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `DB_CONNECT_TIMEOUT_SECS` | `5` |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` |
//! | `RATE_LIMIT_ENABLED` | `false` |
//! | `RATE_LIMIT_REQUESTS` | `100` |
//! | `RATE_LIMIT_PERIOD_SECS` | `60` |
//! | `MAX_BODY_BYTES` | `65536` |
//!
//! Unparseable numeric values fall back to the default with a warning.

use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use tracing::warn;

use tasklist_core::defaults;
use tasklist_db::PoolConfig;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/tasklist";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_connect_timeout_secs: u64,
    /// Comma-separated CORS origin whitelist.
    pub allowed_origins: String,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u64,
    pub rate_limit_period_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: defaults::SERVER_PORT,
            db_max_connections: defaults::DB_MAX_CONNECTIONS,
            db_connect_timeout_secs: defaults::DB_CONNECT_TIMEOUT_SECS,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            rate_limit_enabled: false,
            rate_limit_requests: defaults::RATE_LIMIT_REQUESTS,
            rate_limit_period_secs: defaults::RATE_LIMIT_PERIOD_SECS,
            max_body_bytes: defaults::MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(base.database_url),
            host: lookup("HOST").unwrap_or(base.host),
            port: parse_or(&lookup, "PORT", base.port),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", base.db_max_connections),
            db_connect_timeout_secs: parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECS",
                base.db_connect_timeout_secs,
            ),
            allowed_origins: lookup("ALLOWED_ORIGINS").unwrap_or(base.allowed_origins),
            rate_limit_enabled: lookup("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(base.rate_limit_enabled),
            rate_limit_requests: parse_or(&lookup, "RATE_LIMIT_REQUESTS", base.rate_limit_requests),
            rate_limit_period_secs: parse_or(
                &lookup,
                "RATE_LIMIT_PERIOD_SECS",
                base.rate_limit_period_secs,
            ),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", base.max_body_bytes),
        }
    }

    /// Pool settings for the task store.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_connections(self.db_max_connections)
            .connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    subsystem = "config",
                    key,
                    value = %raw,
                    default = %default,
                    "Invalid value, using default"
                );
                default
            }
        },
        None => default,
    }
}

/// Parse a comma-separated CORS origin list.
///
/// Invalid entries are skipped with a warning. An empty list falls back to
/// [`DEFAULT_ALLOWED_ORIGINS`].
pub fn parse_allowed_origins(origins_str: &str) -> Vec<HeaderValue> {
    if origins_str.trim().is_empty() {
        return vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGINS)];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}
