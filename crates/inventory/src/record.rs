use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::ItemId;

/// Threshold applied to records that never had one set explicitly.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// A live inventory record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: ItemId,
    pub item_name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub updated_by: String,
    pub low_stock_threshold: i64,
}

impl InventoryRecord {
    /// `true` once stock has dropped to (or below) the record's threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    /// Price as shown to users: dollar sign, two decimal places.
    pub fn display_price(&self) -> String {
        format!("${:.2}", self.price.round_dp(2))
    }

    /// Multi-line summary used by the "copy details" action.
    pub fn details_text(&self) -> String {
        format!(
            "ID: {}\nItem Name: {}\nQuantity: {}\nPrice: {}\nUpdated By: {}",
            self.id,
            self.item_name,
            self.quantity,
            self.display_price(),
            self.updated_by
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn gloves() -> InventoryRecord {
        InventoryRecord {
            id: ItemId::new(1),
            item_name: "Gloves".to_string(),
            quantity: 50,
            price: Decimal::from_str("2.5").unwrap(),
            updated_by: "alice".to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    #[test]
    fn details_text_lists_every_field() {
        assert_eq!(
            gloves().details_text(),
            "ID: 1\nItem Name: Gloves\nQuantity: 50\nPrice: $2.50\nUpdated By: alice"
        );
    }

    #[test]
    fn low_stock_is_inclusive_of_threshold() {
        let mut record = gloves();
        assert!(!record.is_low_stock());

        record.quantity = DEFAULT_LOW_STOCK_THRESHOLD;
        assert!(record.is_low_stock());

        record.quantity = 0;
        assert!(record.is_low_stock());
    }
}
