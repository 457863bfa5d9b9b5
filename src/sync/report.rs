//! Result of one sync call, as returned to callers and rendered as JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Ok,
    NotFound,
    Error,
}

/// What the upsert engine did to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Existing target row updated, or re-created at its mapped key
    Updated,
    /// Source key was taken in the target; inserted under a fresh key
    InsertedIdentity,
    /// Inserted under the same key the row has in the source
    InsertedWithId,
}

/// One node written during a sync call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedEntity {
    pub entity: String,
    pub action: SyncAction,
    pub source_id: i32,
    pub target_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub status: SyncStatus,
    pub entity: String,
    pub source_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced: Option<Vec<SyncedEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncReport {
    pub fn ok(entity: impl Into<String>, source_id: i32, synced: Vec<SyncedEntity>) -> Self {
        Self {
            status: SyncStatus::Ok,
            entity: entity.into(),
            source_id,
            synced: Some(synced),
            message: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, source_id: i32) -> Self {
        Self {
            status: SyncStatus::NotFound,
            entity: entity.into(),
            source_id,
            synced: None,
            message: None,
        }
    }

    pub fn error(entity: impl Into<String>, source_id: i32, message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Error,
            entity: entity.into(),
            source_id,
            synced: None,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SyncStatus::Ok
    }

    /// Written nodes, empty unless the call succeeded.
    pub fn synced(&self) -> &[SyncedEntity] {
        self.synced.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_report_json_shape() {
        let report = SyncReport::ok(
            "Customer",
            1,
            vec![SyncedEntity {
                entity: "Customer".to_string(),
                action: SyncAction::InsertedWithId,
                source_id: 1,
                target_id: 1,
            }],
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "status": "ok",
                "entity": "Customer",
                "sourceId": 1,
                "synced": [
                    {"entity": "Customer", "action": "inserted_with_id", "sourceId": 1, "targetId": 1}
                ]
            })
        );
    }

    #[test]
    fn test_not_found_and_error_omit_synced() {
        let not_found = serde_json::to_value(SyncReport::not_found("Customer", 99999)).unwrap();
        assert_eq!(
            not_found,
            json!({"status": "not_found", "entity": "Customer", "sourceId": 99999})
        );

        let error = serde_json::to_value(SyncReport::error("Bogus", 1, "Entity 'Bogus' not found in source model.")).unwrap();
        assert_eq!(error["status"], "error");
        assert_eq!(error["message"], "Entity 'Bogus' not found in source model.");
        assert!(error.get("synced").is_none());
    }

    #[test]
    fn test_action_names() {
        assert_eq!(serde_json::to_value(SyncAction::Updated).unwrap(), "updated");
        assert_eq!(
            serde_json::to_value(SyncAction::InsertedIdentity).unwrap(),
            "inserted_identity"
        );
    }
}
