use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{AuditEntryId, DomainError, ItemId};

/// Kind of mutation an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    Added,
    Updated,
    Deleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Added => "Added",
            AuditAction::Updated => "Updated",
            AuditAction::Deleted => "Deleted",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Added" => Ok(AuditAction::Added),
            "Updated" => Ok(AuditAction::Updated),
            "Deleted" => Ok(AuditAction::Deleted),
            _ => Err(DomainError::validation(format!("invalid audit action: {s}"))),
        }
    }
}

/// Immutable record of one inventory mutation.
///
/// `item_id` is a historical reference: the record it names may have been
/// deleted since. `item_name` and `user` are snapshots taken when the
/// mutation happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub action: AuditAction,
    pub item_id: ItemId,
    pub item_name: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}
