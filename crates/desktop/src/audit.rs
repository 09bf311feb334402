//! Append-only audit log persisted in SQLite.
//!
//! Entries are only ever inserted. The inventory store calls [`append`] on
//! its own transaction so a mutation and its audit entry commit together;
//! [`AuditRecorder::record`] wraps the same append in a standalone
//! transaction.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

use stockroom_core::{AuditEntryId, ItemId};
use stockroom_inventory::{AuditAction, AuditEntry};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

/// Read/append handle over the `audit_log` table.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    pool: SqlitePool,
}

impl AuditRecorder {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one entry in its own transaction.
    #[instrument(skip(self, item_name, user), err(level = "debug"))]
    pub async fn record(
        &self,
        action: AuditAction,
        item_id: ItemId,
        item_name: &str,
        user: &str,
    ) -> StoreResult<AuditEntry> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let entry = append(&mut *tx, action, item_id, item_name, user).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(entry)
    }

    /// All entries, newest first.
    pub async fn list_all(&self) -> StoreResult<Vec<AuditEntry>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire_connection", e))?;
        fetch_all(&mut *conn).await
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_audit_entries", e))?;
        Ok(count as u64)
    }
}

/// Insert one entry on `conn`, which is normally an open transaction.
///
/// The timestamp is the current UTC time at microsecond precision, clamped so
/// it never precedes the previous entry's.
pub(crate) async fn append(
    conn: &mut SqliteConnection,
    action: AuditAction,
    item_id: ItemId,
    item_name: &str,
    user: &str,
) -> StoreResult<AuditEntry> {
    let previous: Option<String> =
        sqlx::query_scalar("SELECT timestamp FROM audit_log ORDER BY id DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("fetch_last_audit_timestamp", e))?;

    let now = Utc::now().trunc_subsecs(6);
    let timestamp = match previous.as_deref().map(parse_timestamp).transpose()? {
        Some(prev) if prev > now => prev,
        _ => now,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO audit_log (action, item_id, item_name, user, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(action.as_str())
    .bind(item_id.get())
    .bind(item_name)
    .bind(user)
    .bind(format_timestamp(&timestamp))
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_audit_entry", e))?;

    Ok(AuditEntry {
        id: AuditEntryId::new(result.last_insert_rowid()),
        action,
        item_id,
        item_name: item_name.to_string(),
        user: user.to_string(),
        timestamp,
    })
}

/// All entries on `conn`, newest first.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> StoreResult<Vec<AuditEntry>> {
    let rows = sqlx::query_as::<_, AuditRow>(
        r#"
        SELECT id, action, item_id, item_name, user, timestamp
        FROM audit_log
        ORDER BY timestamp DESC, id DESC
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_audit_entries", e))?;

    rows.into_iter().map(AuditEntry::try_from).collect()
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Storage(format!("invalid audit timestamp {raw:?}: {e}")))
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: i64,
    action: String,
    item_id: i64,
    item_name: String,
    user: String,
    timestamp: String,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = StoreError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let action = row
            .action
            .parse::<AuditAction>()
            .map_err(|e| StoreError::Storage(format!("corrupt audit row {}: {e}", row.id)))?;

        Ok(AuditEntry {
            id: AuditEntryId::new(row.id),
            action,
            item_id: ItemId::new(row.item_id),
            item_name: row.item_name,
            user: row.user,
            timestamp: parse_timestamp(&row.timestamp)?,
        })
    }
}
