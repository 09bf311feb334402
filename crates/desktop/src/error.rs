//! Store error model.
//!
//! SQLx errors are funnelled through [`map_sqlx_error`] so every failure
//! carries the operation that produced it:
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database, unique violation on `idx_item_name` | `Domain(Validation)` (duplicate name) |
//! | Database, check constraint violation | `Domain(Validation)` |
//! | Database (other), PoolClosed, Io, ... | `Storage` |
//!
//! Rejected input logs at `debug`; only `Storage` failures log at `error`.

use stockroom_core::{DomainError, ItemId};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before (or by) the schema; nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("inventory item not found: {0}")]
    NotFound(ItemId),

    /// Underlying persistence failure; the surrounding transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(String),

    /// The database could not be opened within the configured attempts.
    #[error("failed to connect to database after {attempts} attempt(s): {message}")]
    Connection { attempts: u32, message: String },
}

impl StoreError {
    pub fn duplicate_name(name: &str) -> Self {
        Self::Domain(DomainError::validation(format!(
            "item name '{name}' already exists"
        )))
    }
}

/// Check violations are rejected input and log at `debug`; everything else is
/// a storage failure and logs at `error`.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    let mapped = match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_check_violation() {
                tracing::debug!(operation, "schema rejected input: {msg}");
                return StoreError::Domain(DomainError::validation(msg));
            }
            StoreError::Storage(msg)
        }
        sqlx::Error::RowNotFound => {
            StoreError::Storage(format!("unexpected missing row in {}", operation))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed during {}", operation))
        }
        other => StoreError::Storage(format!("{} failed: {}", operation, other)),
    };
    tracing::error!(operation, "{mapped}");
    mapped
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_unique_violation();
    }
    false
}
