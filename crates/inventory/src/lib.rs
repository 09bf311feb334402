//! Inventory domain module.
//!
//! This crate contains business rules for inventory records and their audit
//! trail, implemented purely as deterministic domain logic (no IO, no storage).

pub mod audit;
pub mod draft;
pub mod form;
pub mod record;

pub use audit::{AuditAction, AuditEntry};
pub use draft::{ItemDraft, MAX_NAME_LEN, MAX_USER_LEN};
pub use form::ItemForm;
pub use record::{DEFAULT_LOW_STOCK_THRESHOLD, InventoryRecord};
