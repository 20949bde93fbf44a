//! Shared identifier types.

use uuid::Uuid;

/// Identifier for an inventory asset record.
pub type AssetId = Uuid;
