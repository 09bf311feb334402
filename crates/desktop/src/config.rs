//! Store configuration, read from the environment with defaults.

use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "STOCKROOM_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "STOCKROOM_DB_MAX_CONNECTIONS";
pub const ENV_DB_CONNECT_ATTEMPTS: &str = "STOCKROOM_DB_CONNECT_ATTEMPTS";
pub const ENV_DB_RETRY_DELAY_MS: &str = "STOCKROOM_DB_RETRY_DELAY_MS";

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// Private in-memory database; lost when the pool closes.
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: DatabaseLocation,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl StoreConfig {
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Single-connection in-memory database (every pooled connection would
    /// otherwise see its own empty database).
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            retry_delay: Duration::ZERO,
            ..Self::new(DatabaseLocation::InMemory)
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(DatabaseLocation::File(path.into()))
    }

    /// Build the configuration from `STOCKROOM_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let location = match lookup(ENV_DB_PATH) {
            Some(path) if path == ":memory:" => DatabaseLocation::InMemory,
            Some(path) if !path.trim().is_empty() => DatabaseLocation::File(PathBuf::from(path)),
            _ => DatabaseLocation::File(default_db_path()),
        };

        let max_connections = match location {
            DatabaseLocation::InMemory => 1,
            DatabaseLocation::File(_) => parse_or(&lookup, ENV_DB_MAX_CONNECTIONS, DEFAULT_MAX_CONNECTIONS).max(1),
        };
        let connect_attempts = parse_or(&lookup, ENV_DB_CONNECT_ATTEMPTS, DEFAULT_CONNECT_ATTEMPTS).max(1);
        let retry_delay = parse_or(&lookup, ENV_DB_RETRY_DELAY_MS, DEFAULT_RETRY_DELAY.as_millis() as u64);

        Self {
            location,
            max_connections,
            connect_attempts,
            retry_delay: Duration::from_millis(retry_delay),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::file(default_db_path())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: core::str::FromStr + Copy + core::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("{key}={raw:?} is not valid; using default {default}");
                default
            }
        },
        None => default,
    }
}

/// Resolve the default database location:
/// `{app_data_dir}/stockroom/inventory.db`.
///
/// Falls back to `~/.local/share`, then the working directory.
pub fn default_db_path() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("stockroom").join("inventory.db")
}
