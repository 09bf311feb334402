//! Presentation-facing facade.
//!
//! The UI is a thin client over [`Workbench`]: every button maps to exactly
//! one method here, and every method maps to one store, audit, or export
//! operation. The currently selected record is explicit state on the
//! workbench and is passed down to the store as `existing_id`.

use std::path::PathBuf;

use tokio::task::JoinHandle;

use stockroom_core::{DomainError, ItemId};
use stockroom_inventory::{AuditEntry, InventoryRecord, ItemForm};

use crate::error::{StoreError, StoreResult};
use crate::export::{ExportError, ExportSummary, ReportExporter};
use crate::store::InventoryStore;
use crate::types::{ItemQuery, SaveOutcome, SortColumn, SortDirection};

#[derive(Debug, Clone)]
pub struct Workbench {
    store: InventoryStore,
    selected: Option<ItemId>,
    page_size: u32,
    sort: SortColumn,
    direction: SortDirection,
}

impl Workbench {
    pub fn new(store: InventoryStore) -> Self {
        Self {
            store,
            selected: None,
            page_size: ItemQuery::DEFAULT_PAGE_SIZE,
            sort: SortColumn::default(),
            direction: SortDirection::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    /// Select a record for editing and return its form contents.
    pub async fn select(&mut self, id: ItemId) -> StoreResult<ItemForm> {
        let record = self.store.get(id).await?.ok_or(StoreError::NotFound(id))?;
        self.selected = Some(id);
        Ok(ItemForm::from_record(&record))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Column header click: a new column sorts ascending, the current column
    /// flips direction.
    pub fn sort_by_column(&mut self, column: SortColumn) -> SortDirection {
        self.direction = if self.sort == column {
            self.direction.reversed()
        } else {
            SortDirection::Asc
        };
        self.sort = column;
        self.direction
    }

    /// Add a new record, or update the selected one.
    ///
    /// The selection is cleared on success and kept on failure so the user
    /// can correct the form.
    pub async fn save(&mut self, form: &ItemForm) -> StoreResult<SaveOutcome> {
        let outcome = self
            .store
            .add_or_update(&form.name, &form.quantity, &form.price, &form.updated_by, self.selected)
            .await?;
        self.selected = None;
        Ok(outcome)
    }

    /// Delete the selected record.
    pub async fn delete_selected(&mut self) -> StoreResult<ItemId> {
        let id = self
            .selected
            .ok_or_else(|| DomainError::validation("select an item to delete"))?;
        self.store.delete(id).await?;
        self.selected = None;
        Ok(id)
    }

    /// Name search, one page at a time, in the current header sort order.
    pub async fn search(&self, text: &str, page: u32) -> StoreResult<Vec<InventoryRecord>> {
        let query = ItemQuery::new()
            .filter(text)
            .page(page)
            .page_size(self.page_size)
            .sort_by(self.sort, self.direction);
        self.store.query(&query).await
    }

    pub async fn browse(&self, query: &ItemQuery) -> StoreResult<Vec<InventoryRecord>> {
        self.store.query(query).await
    }

    pub async fn audit_log(&self) -> StoreResult<Vec<AuditEntry>> {
        self.store.audit().list_all().await
    }

    /// Start a background export; the UI stays responsive while it runs.
    pub fn export_report(&self, path: impl Into<PathBuf>) -> JoinHandle<Result<ExportSummary, ExportError>> {
        ReportExporter::new(self.store.clone()).spawn(path)
    }
}
