//! Shared request/response types for the store API.

use serde::{Deserialize, Serialize};
use stockroom_core::ItemId;
use stockroom_inventory::AuditAction;

/// Result of a successful add/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub id: ItemId,
    pub action: AuditAction,
}

/// Column an item listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Id,
    ItemName,
    Quantity,
    Price,
    UpdatedBy,
}

impl SortColumn {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::ItemName => "item_name COLLATE NOCASE",
            SortColumn::Quantity => "quantity",
            SortColumn::Price => "CAST(price AS REAL)",
            SortColumn::UpdatedBy => "updated_by COLLATE NOCASE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Filtered, sorted, paginated view over the live inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    /// Case-insensitive substring of the item name; empty means no filter.
    pub filter: Option<String>,
    /// 1-based; values below 1 are treated as 1.
    pub page: u32,
    pub page_size: u32,
    pub sort: SortColumn,
    pub direction: SortDirection,
    pub low_stock_only: bool,
}

impl ItemQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 50;

    pub fn new() -> Self {
        Self {
            filter: None,
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
            sort: SortColumn::default(),
            direction: SortDirection::default(),
            low_stock_only: false,
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn sort_by(mut self, sort: SortColumn, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn low_stock_only(mut self) -> Self {
        self.low_stock_only = true;
        self
    }

    /// Rows to skip; saturates so far-out pages are simply empty.
    pub(crate) fn offset(&self) -> i64 {
        let offset = u64::from(self.page.max(1) - 1).saturating_mul(u64::from(self.page_size));
        i64::try_from(offset).unwrap_or(i64::MAX)
    }
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_counts_whole_pages() {
        assert_eq!(ItemQuery::new().page(0).page_size(10).offset(), 0);
        assert_eq!(ItemQuery::new().page(1).page_size(10).offset(), 0);
        assert_eq!(ItemQuery::new().page(3).page_size(10).offset(), 20);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let query = ItemQuery::new().page(u32::MAX).page_size(u32::MAX);
        assert_eq!(query.offset(), i64::MAX);
    }
}
