//! Raw form state edited by the presentation layer.

use serde::{Deserialize, Serialize};

use stockroom_core::DomainResult;

use crate::draft::ItemDraft;
use crate::record::InventoryRecord;

/// The four text fields of the item editor, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemForm {
    pub name: String,
    pub quantity: String,
    pub price: String,
    pub updated_by: String,
}

impl ItemForm {
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<String>,
        price: impl Into<String>,
        updated_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            price: price.into(),
            updated_by: updated_by.into(),
        }
    }

    /// Pre-fill the editor from an existing record.
    pub fn from_record(record: &InventoryRecord) -> Self {
        Self::new(
            record.item_name.clone(),
            record.quantity.to_string(),
            record.price.to_string(),
            record.updated_by.clone(),
        )
    }

    /// Pre-fill the editor with a copy of `record` under a new name.
    ///
    /// Nothing is saved; the user still has to submit the form.
    pub fn duplicate_of(record: &InventoryRecord) -> Self {
        Self {
            name: format!("Copy of {}", record.item_name),
            ..Self::from_record(record)
        }
    }

    pub fn to_draft(&self) -> DomainResult<ItemDraft> {
        ItemDraft::parse(&self.name, &self.quantity, &self.price, &self.updated_by)
    }
}
