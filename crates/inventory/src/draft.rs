//! Input validation for inventory mutations.
//!
//! An [`ItemDraft`] is the only way into the store's add/update path: it is
//! built from raw form text and, once constructed, is guaranteed to satisfy
//! the field constraints of an inventory record. Name uniqueness is checked
//! later by the store because it needs the live record set.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

/// Maximum item name length, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum `updated_by` length, in characters.
pub const MAX_USER_LEN: usize = 50;

/// A validated add/update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub updated_by: String,
}

impl ItemDraft {
    /// Validate raw form input.
    ///
    /// Checks run in a fixed order so the first failure reported is stable:
    /// lengths, required fields, numeric parsing, then signs.
    pub fn parse(name: &str, quantity_text: &str, price_text: &str, user: &str) -> DomainResult<Self> {
        let name = sanitize(name);
        let user = sanitize(user);
        let quantity_text = quantity_text.trim();
        let price_text = price_text.trim();

        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "item name must be {MAX_NAME_LEN} characters or less"
            )));
        }
        if user.chars().count() > MAX_USER_LEN {
            return Err(DomainError::validation(format!(
                "updated by must be {MAX_USER_LEN} characters or less"
            )));
        }

        if name.is_empty() || quantity_text.is_empty() || price_text.is_empty() || user.is_empty() {
            return Err(DomainError::validation("all fields are required"));
        }

        let quantity = quantity_text
            .parse::<i64>()
            .map_err(|_| DomainError::validation("quantity must be an integer"))?;
        let price = parse_price(price_text)?;

        if quantity < 0 || price < Decimal::ZERO {
            return Err(DomainError::validation("quantity and price must be non-negative"));
        }

        Ok(Self {
            name,
            quantity,
            price,
            updated_by: user,
        })
    }
}

fn parse_price(text: &str) -> DomainResult<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| DomainError::validation("price must be a number"))
}

/// Trim and drop characters that would not render in a text field.
fn sanitize(text: &str) -> String {
    let printable: String = text.chars().filter(|c| is_printable(*c)).collect();
    printable.trim().to_string()
}

fn is_printable(c: char) -> bool {
    !(c.is_control()
        || matches!(
            c,
            '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
        ))
}
