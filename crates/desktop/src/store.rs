//! SQLite-backed inventory store.
//!
//! Every mutation runs in one transaction that also appends the matching
//! audit entry:
//!
//! 1. Validate input into an [`ItemDraft`] (no IO)
//! 2. Begin a transaction
//! 3. Check name uniqueness against the live records
//! 4. Insert / update / delete the row
//! 5. Append the audit entry
//! 6. Commit
//!
//! Any failure after step 2 returns early; the transaction is rolled back
//! explicitly on the validation paths and by `Drop` on error paths, so a
//! mutation is never visible without its audit entry (and vice versa).

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

use stockroom_core::ItemId;
use stockroom_inventory::{AuditAction, InventoryRecord, ItemDraft};

use crate::audit::{self, AuditRecorder};
use crate::config::StoreConfig;
use crate::db;
use crate::error::{StoreError, StoreResult, is_unique_violation, map_sqlx_error};
use crate::types::{ItemQuery, SaveOutcome};

const RECORD_COLUMNS: &str = "id, item_name, quantity, price, updated_by, low_stock_threshold";

/// Owner of the inventory table; pairs every mutation with an audit entry.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
    audit: AuditRecorder,
}

impl InventoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        let audit = AuditRecorder::new(pool.clone());
        Self { pool, audit }
    }

    /// Connect (with retries), create the schema, and wrap the pool.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let pool = db::connect(config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read access to the audit trail written alongside this store.
    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }

    /// Validate raw form text and add (no `existing_id`) or update a record.
    #[instrument(skip(self, quantity_text, price_text), err(level = "debug"))]
    pub async fn add_or_update(
        &self,
        name: &str,
        quantity_text: &str,
        price_text: &str,
        user: &str,
        existing_id: Option<ItemId>,
    ) -> StoreResult<SaveOutcome> {
        let draft = ItemDraft::parse(name, quantity_text, price_text, user)?;
        self.save(&draft, existing_id).await
    }

    /// Persist an already validated draft.
    pub async fn save(&self, draft: &ItemDraft, existing_id: Option<ItemId>) -> StoreResult<SaveOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if duplicate_name_exists(&mut *tx, &draft.name, existing_id).await? {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            tracing::debug!(name = %draft.name, "rejected duplicate item name");
            return Err(StoreError::duplicate_name(&draft.name));
        }

        let (id, action) = match existing_id {
            None => (insert_item(&mut *tx, draft).await?, AuditAction::Added),
            Some(id) => {
                if !update_item(&mut *tx, id, draft).await? {
                    tx.rollback()
                        .await
                        .map_err(|e| map_sqlx_error("rollback", e))?;
                    return Err(StoreError::NotFound(id));
                }
                (id, AuditAction::Updated)
            }
        };

        let entry = audit::append(&mut *tx, action, id, &draft.name, &draft.updated_by).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(item_id = %id, action = %action, audit_id = %entry.id, "inventory item saved");
        Ok(SaveOutcome { id, action })
    }

    /// Hard-delete a record and log it.
    ///
    /// A missing id is reported as [`StoreError::NotFound`] and writes nothing.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: ItemId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let Some(existing) = fetch_record(&mut *tx, id).await? else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            tracing::debug!(item_id = %id, "delete of missing inventory item");
            return Err(StoreError::NotFound(id));
        };

        sqlx::query("DELETE FROM inventory WHERE id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        let entry = audit::append(
            &mut *tx,
            AuditAction::Deleted,
            id,
            &existing.item_name,
            &existing.updated_by,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(item_id = %id, audit_id = %entry.id, "inventory item deleted");
        Ok(())
    }

    pub async fn get(&self, id: ItemId) -> StoreResult<Option<InventoryRecord>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire_connection", e))?;
        fetch_record(&mut *conn, id).await
    }

    /// One page of records whose name contains `filter`, ordered by id.
    pub async fn list(
        &self,
        filter: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> StoreResult<Vec<InventoryRecord>> {
        let mut query = ItemQuery::new().page(page).page_size(page_size);
        if let Some(filter) = filter {
            query = query.filter(filter);
        }
        self.query(&query).await
    }

    /// Filtered, sorted, paginated listing. Read-only.
    #[instrument(skip(self), err(level = "debug"))]
    pub async fn query(&self, query: &ItemQuery) -> StoreResult<Vec<InventoryRecord>> {
        let pattern = query
            .filter
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| format!("%{}%", escape_like(f)));

        // ORDER BY fragments come from a closed enum, never from user input.
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM inventory
            WHERE (?1 IS NULL OR item_name LIKE ?1 ESCAPE '\')
              AND (?2 = 0 OR quantity <= low_stock_threshold)
            ORDER BY {} {}, id ASC
            LIMIT ?3 OFFSET ?4
            "#,
            query.sort.sql(),
            query.direction.sql(),
        );

        let rows = sqlx::query_as::<_, InventoryRow>(&sql)
            .bind(pattern)
            .bind(query.low_stock_only)
            .bind(i64::from(query.page_size))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.into_iter().map(InventoryRecord::try_from).collect()
    }

    /// `true` if a live record other than `exclude_id` has this name,
    /// ignoring ASCII case.
    pub async fn is_duplicate_name(&self, name: &str, exclude_id: Option<ItemId>) -> StoreResult<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire_connection", e))?;
        duplicate_name_exists(&mut *conn, name, exclude_id).await
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_items", e))?;
        Ok(count as u64)
    }
}

async fn duplicate_name_exists(
    conn: &mut SqliteConnection,
    name: &str,
    exclude_id: Option<ItemId>,
) -> StoreResult<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM inventory
        WHERE item_name = ?1 COLLATE NOCASE
          AND (?2 IS NULL OR id != ?2)
        "#,
    )
    .bind(name)
    .bind(exclude_id.map(|id| id.get()))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("check_duplicate_name", e))?;

    Ok(count > 0)
}

async fn insert_item(conn: &mut SqliteConnection, draft: &ItemDraft) -> StoreResult<ItemId> {
    let result = sqlx::query(
        r#"
        INSERT INTO inventory (item_name, quantity, price, updated_by)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&draft.name)
    .bind(draft.quantity)
    .bind(draft.price.to_string())
    .bind(&draft.updated_by)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::duplicate_name(&draft.name)
        } else {
            map_sqlx_error("insert_item", e)
        }
    })?;

    Ok(ItemId::new(result.last_insert_rowid()))
}

/// Returns `false` when no row has this id.
async fn update_item(conn: &mut SqliteConnection, id: ItemId, draft: &ItemDraft) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE inventory
        SET item_name = ?1, quantity = ?2, price = ?3, updated_by = ?4
        WHERE id = ?5
        "#,
    )
    .bind(&draft.name)
    .bind(draft.quantity)
    .bind(draft.price.to_string())
    .bind(&draft.updated_by)
    .bind(id.get())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::duplicate_name(&draft.name)
        } else {
            map_sqlx_error("update_item", e)
        }
    })?;

    Ok(result.rows_affected() > 0)
}

async fn fetch_record(conn: &mut SqliteConnection, id: ItemId) -> StoreResult<Option<InventoryRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM inventory WHERE id = ?1");
    let row = sqlx::query_as::<_, InventoryRow>(&sql)
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("fetch_item", e))?;

    row.map(InventoryRecord::try_from).transpose()
}

/// Every live record on `conn`, ordered by id.
pub(crate) async fn fetch_all(conn: &mut SqliteConnection) -> StoreResult<Vec<InventoryRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM inventory ORDER BY id ASC");
    let rows = sqlx::query_as::<_, InventoryRow>(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_all_items", e))?;

    rows.into_iter().map(InventoryRecord::try_from).collect()
}

/// Make `%`, `_` and `\` match literally under `LIKE ... ESCAPE '\'`.
fn escape_like(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len());
    for c in filter.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: i64,
    item_name: String,
    quantity: i64,
    price: String,
    updated_by: String,
    low_stock_threshold: i64,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = StoreError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price)
            .map_err(|e| StoreError::Storage(format!("corrupt price in item {}: {e}", row.id)))?;

        Ok(InventoryRecord {
            id: ItemId::new(row.id),
            item_name: row.item_name,
            quantity: row.quantity,
            price,
            updated_by: row.updated_by,
            low_stock_threshold: row.low_stock_threshold,
        })
    }
}
