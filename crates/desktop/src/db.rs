//! Database connection and schema setup.
//!
//! Every store operation assumes [`connect`] has run: it opens the SQLite
//! pool (retrying transient failures) and creates the tables and indexes
//! if they do not exist yet.

use std::str::FromStr;

use anyhow::Context;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::{DatabaseLocation, StoreConfig};
use crate::error::{StoreError, StoreResult, map_sqlx_error};

const SCHEMA: &[(&str, &str)] = &[
    (
        "create_inventory_table",
        r#"
        CREATE TABLE IF NOT EXISTS inventory (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            item_name           TEXT NOT NULL CHECK(length(item_name) BETWEEN 1 AND 100),
            quantity            INTEGER NOT NULL CHECK(quantity >= 0),
            price               TEXT NOT NULL CHECK(CAST(price AS REAL) >= 0),
            updated_by          TEXT NOT NULL CHECK(length(updated_by) BETWEEN 1 AND 50),
            low_stock_threshold INTEGER NOT NULL DEFAULT 10 CHECK(low_stock_threshold >= 0)
        )
        "#,
    ),
    (
        "create_audit_log_table",
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            action    TEXT NOT NULL CHECK(action IN ('Added', 'Updated', 'Deleted')),
            item_id   INTEGER NOT NULL,
            item_name TEXT NOT NULL,
            user      TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )
        "#,
    ),
    // Case-insensitive uniqueness of live item names.
    (
        "create_idx_item_name",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_item_name ON inventory(item_name COLLATE NOCASE)",
    ),
    (
        "create_idx_quantity",
        "CREATE INDEX IF NOT EXISTS idx_quantity ON inventory(quantity)",
    ),
    (
        "create_idx_price",
        "CREATE INDEX IF NOT EXISTS idx_price ON inventory(price)",
    ),
    (
        "create_idx_audit_timestamp",
        "CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp)",
    ),
];

/// Open the database described by `config` and make sure the schema exists.
///
/// Connection failures are retried up to `config.connect_attempts` times with
/// `config.retry_delay` between attempts; after that the error is returned as
/// [`StoreError::Connection`] and the caller must not continue.
pub async fn connect(config: &StoreConfig) -> StoreResult<SqlitePool> {
    let attempts = config.connect_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match open_pool(config).await {
            Ok(pool) => {
                init_schema(&pool).await?;
                tracing::info!(attempt, location = ?config.location, "database ready");
                return Ok(pool);
            }
            Err(err) => {
                tracing::warn!(attempt, attempts, "failed to open database: {err:#}");
                last_error = format!("{err:#}");
                if attempt < attempts {
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    tracing::error!(attempts, location = ?config.location, "giving up on database connection");
    Err(StoreError::Connection {
        attempts,
        message: last_error,
    })
}

async fn open_pool(config: &StoreConfig) -> anyhow::Result<SqlitePool> {
    let options = match &config.location {
        DatabaseLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create database directory at {:?}", parent))?;
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        }
        DatabaseLocation::InMemory => SqliteConnectOptions::from_str("sqlite::memory:")
            .context("failed to build in-memory SQLite options")?,
    };

    // No idle reaping: an in-memory database disappears with its last connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to create SQLite pool at {:?}", config.location))?;

    Ok(pool)
}

/// Create tables and indexes; idempotent.
pub async fn init_schema(pool: &SqlitePool) -> StoreResult<()> {
    for (operation, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
    }
    Ok(())
}
