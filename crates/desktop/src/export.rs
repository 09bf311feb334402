//! Spreadsheet report export.
//!
//! A report is a point-in-time [`ReportSnapshot`] of the inventory and the
//! audit log, written as a two-sheet `.xlsx` workbook. The snapshot is read
//! inside one transaction; the workbook is written on a blocking worker so
//! the caller's runtime is never stalled by file IO. Export never writes to
//! the store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use stockroom_inventory::{AuditEntry, InventoryRecord};

use crate::error::{StoreError, map_sqlx_error};
use crate::store::InventoryStore;
use crate::{audit, store};

pub const INVENTORY_SHEET: &str = "Inventory";
pub const AUDIT_SHEET: &str = "Audit Log";

const INVENTORY_HEADERS: [&str; 5] = ["ID", "Item Name", "Quantity", "Price", "Updated By"];
const INVENTORY_WIDTHS: [f64; 5] = [5.0, 30.0, 10.0, 12.0, 20.0];
const AUDIT_HEADERS: [&str; 6] = ["ID", "Action", "Item ID", "Item Name", "User", "Timestamp"];
const AUDIT_WIDTHS: [f64; 6] = [5.0, 12.0, 8.0, 30.0, 20.0, 22.0];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write spreadsheet: {0}")]
    Spreadsheet(#[from] XlsxError),

    #[error("export worker failed: {0}")]
    Worker(String),
}

/// Consistent copy of both tables at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    /// Ordered by id.
    pub items: Vec<InventoryRecord>,
    /// Newest first.
    pub audit_entries: Vec<AuditEntry>,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub inventory_rows: usize,
    pub audit_rows: usize,
}

/// `inventory_audit_report_YYYY_MM_DD.xlsx`
pub fn default_report_file_name(date: NaiveDate) -> String {
    format!("inventory_audit_report_{}.xlsx", date.format("%Y_%m_%d"))
}

#[derive(Debug, Clone)]
pub struct ReportExporter {
    store: InventoryStore,
}

impl ReportExporter {
    pub fn new(store: InventoryStore) -> Self {
        Self { store }
    }

    /// Read both tables inside a single transaction.
    pub async fn snapshot(&self) -> Result<ReportSnapshot, StoreError> {
        let mut tx = self
            .store
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let items = store::fetch_all(&mut *tx).await?;
        let audit_entries = audit::fetch_all(&mut *tx).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(ReportSnapshot {
            items,
            audit_entries,
            taken_at: Utc::now(),
        })
    }

    /// Snapshot the store and write the workbook to `path`.
    pub async fn export(&self, path: impl Into<PathBuf>) -> Result<ExportSummary, ExportError> {
        let path = path.into();
        let snapshot = self.snapshot().await?;

        let summary = tokio::task::spawn_blocking(move || {
            write_workbook(&snapshot, &path)?;
            Ok::<_, ExportError>(ExportSummary {
                path,
                inventory_rows: snapshot.items.len(),
                audit_rows: snapshot.audit_entries.len(),
            })
        })
        .await
        .map_err(|e| ExportError::Worker(e.to_string()))??;

        tracing::info!(
            path = ?summary.path,
            inventory_rows = summary.inventory_rows,
            audit_rows = summary.audit_rows,
            "report exported"
        );
        Ok(summary)
    }

    /// Run [`ReportExporter::export`] as a background task.
    pub fn spawn(&self, path: impl Into<PathBuf>) -> JoinHandle<Result<ExportSummary, ExportError>> {
        let exporter = self.clone();
        let path = path.into();
        tokio::spawn(async move {
            let result = exporter.export(path).await;
            if let Err(err) = &result {
                tracing::error!("report export failed: {err}");
            }
            result
        })
    }
}

/// Write `snapshot` as a two-sheet workbook at `path`.
pub fn write_workbook(snapshot: &ReportSnapshot, path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(INVENTORY_SHEET)?;
    write_header(sheet, &INVENTORY_HEADERS, &INVENTORY_WIDTHS, &bold)?;
    for (idx, item) in snapshot.items.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, item.id.get() as f64)?;
        sheet.write_string(row, 1, &item.item_name)?;
        sheet.write_number(row, 2, item.quantity as f64)?;
        sheet.write_number(row, 3, item.price.to_f64().unwrap_or_default())?;
        sheet.write_string(row, 4, &item.updated_by)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(AUDIT_SHEET)?;
    write_header(sheet, &AUDIT_HEADERS, &AUDIT_WIDTHS, &bold)?;
    for (idx, entry) in snapshot.audit_entries.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, entry.id.get() as f64)?;
        sheet.write_string(row, 1, entry.action.as_str())?;
        sheet.write_number(row, 2, entry.item_id.get() as f64)?;
        sheet.write_string(row, 3, &entry.item_name)?;
        sheet.write_string(row, 4, &entry.user)?;
        sheet.write_string(row, 5, entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_header(
    sheet: &mut Worksheet,
    headers: &[&str],
    widths: &[f64],
    bold: &Format,
) -> Result<(), XlsxError> {
    for (col, (header, width)) in headers.iter().zip(widths).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, bold)?;
        sheet.set_column_width(col, *width)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use calamine::{Reader, Xlsx, open_workbook};

    async fn seeded_store() -> InventoryStore {
        let store = InventoryStore::open(&StoreConfig::in_memory()).await.unwrap();
        let gloves = store.add_or_update("Gloves", "50", "2.50", "alice", None).await.unwrap();
        store.add_or_update("Tape", "3", "1.25", "bob", None).await.unwrap();
        store.add_or_update("Gloves", "60", "2.75", "bob", Some(gloves.id)).await.unwrap();
        store.add_or_update("Scissors", "7", "8", "carol", None).await.unwrap();
        store
    }

    #[test]
    fn default_file_name_uses_underscored_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(default_report_file_name(date), "inventory_audit_report_2024_03_09.xlsx");
    }

    #[tokio::test]
    async fn snapshot_matches_store_contents() {
        let store = seeded_store().await;
        let snapshot = ReportExporter::new(store.clone()).snapshot().await.unwrap();

        assert_eq!(snapshot.items.len() as u64, store.count().await.unwrap());
        assert_eq!(snapshot.audit_entries.len() as u64, store.audit().count().await.unwrap());
        assert!(snapshot.items.windows(2).all(|w| w[0].id < w[1].id));
        assert!(
            snapshot
                .audit_entries
                .windows(2)
                .all(|w| (w[0].timestamp, w[0].id) > (w[1].timestamp, w[1].id))
        );
    }

    #[tokio::test]
    async fn exported_workbook_has_one_row_per_record_and_entry() {
        let store = seeded_store().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(default_report_file_name(Utc::now().date_naive()));

        let summary = ReportExporter::new(store.clone())
            .spawn(path.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.path, path);
        assert_eq!(summary.inventory_rows, 3);
        assert_eq!(summary.audit_rows, 4);

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec![INVENTORY_SHEET.to_string(), AUDIT_SHEET.to_string()]
        );

        let inventory = workbook.worksheet_range(INVENTORY_SHEET).unwrap();
        assert_eq!(inventory.height(), store.count().await.unwrap() as usize + 1);
        assert_eq!(inventory.width(), INVENTORY_HEADERS.len());

        let audit = workbook.worksheet_range(AUDIT_SHEET).unwrap();
        assert_eq!(audit.height(), store.audit().count().await.unwrap() as usize + 1);
        assert_eq!(audit.width(), AUDIT_HEADERS.len());
    }

    #[tokio::test]
    async fn export_does_not_mutate_store() {
        let store = seeded_store().await;
        let before = (store.count().await.unwrap(), store.audit().count().await.unwrap());
        let dir = tempfile::tempdir().unwrap();

        ReportExporter::new(store.clone())
            .export(dir.path().join("report.xlsx"))
            .await
            .unwrap();

        let after = (store.count().await.unwrap(), store.audit().count().await.unwrap());
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn export_to_unwritable_path_reports_spreadsheet_error() {
        let store = seeded_store().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.xlsx");

        let err = ReportExporter::new(store).export(path).await.unwrap_err();
        assert!(matches!(err, ExportError::Spreadsheet(_)), "got {err:?}");
    }
}
