//! Identity mapping record.

use serde::{Deserialize, Serialize};

/// One source row's materialization in the target.
///
/// # Format
///
/// ```json
/// {
///     "sourceId": 3,
///     "targetId": 9,
///     "entityName": "Customer",
///     "domain": "SalesDb"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityMapping {
    /// Primary key in the source store
    pub source_id: i32,
    /// Primary key in the target store
    pub target_id: i32,
    /// Entity type name (e.g., "Customer")
    pub entity_name: String,
    /// Synchronization boundary this mapping belongs to
    pub domain: String,
}

impl IdentityMapping {
    pub fn new(
        entity_name: impl Into<String>,
        source_id: i32,
        target_id: i32,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            source_id,
            target_id,
            entity_name: entity_name.into(),
            domain: domain.into(),
        }
    }
}
