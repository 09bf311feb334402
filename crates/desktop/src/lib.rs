//! `stockroom-desktop`
//!
//! **Responsibility:** local persistence and application services for the
//! single-user inventory tracker.
//!
//! This crate provides:
//! - SQLite connection setup with bounded retries and schema creation
//! - The inventory store, which pairs every mutation with an audit entry
//! - The append-only audit recorder
//! - Spreadsheet report export on a background worker
//! - A `Workbench` facade the presentation layer drives
//!
//! The UI is a **thin client** around `Workbench`.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod store;
pub mod types;
pub mod workbench;

pub use audit::AuditRecorder;
pub use config::{DatabaseLocation, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use export::{ExportError, ExportSummary, ReportExporter, ReportSnapshot};
pub use store::InventoryStore;
pub use types::{ItemQuery, SaveOutcome, SortColumn, SortDirection};
pub use workbench::Workbench;
