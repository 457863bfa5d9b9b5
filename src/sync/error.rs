//! Errors raised while synchronizing an entity graph.

use sync_core::SchemaError;

/// Failure of one sync call.
///
/// Every variant aborts the call. Only the top-level message reaches the
/// report; the source chain is logged.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Requested entity type name does not resolve against the catalog
    #[error("Entity '{0}' not found in source model.")]
    EntityNotFound(String),

    /// Entity type has a key shape the engine cannot map
    #[error("Entity '{entity}' declares {key_count} key fields; only single-column keys are supported")]
    UnsupportedSchema {
        entity: &'static str,
        key_count: usize,
    },

    /// Row or descriptor inconsistency other than the two above
    #[error(transparent)]
    Schema(SchemaError),

    /// Identity mapping store could not be read or written
    #[error("Identity mapping store failed while syncing {entity}")]
    MappingStore {
        entity: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Insert that keeps an explicit key failed and was rolled back
    #[error("Key-preserving insert of {entity} with id {id} failed")]
    KeyPreservingInsert {
        entity: &'static str,
        id: i32,
        #[source]
        source: anyhow::Error,
    },

    /// Read or write of a single row failed
    #[error("Storage operation failed for {entity} {source_id}")]
    Storage {
        entity: &'static str,
        source_id: i32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub(crate) fn mapping(entity: &'static str, source: anyhow::Error) -> Self {
        SyncError::MappingStore { entity, source }
    }

    pub(crate) fn storage(entity: &'static str, source_id: i32, source: anyhow::Error) -> Self {
        SyncError::Storage {
            entity,
            source_id,
            source,
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// Key-preserving inserts can lose a race against a concurrent call
    /// that claimed the same key; a retry then takes the mapped path.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::KeyPreservingInsert { .. })
    }

    /// Message followed by every underlying cause, separated by `: `.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            current = cause.source();
        }
        message
    }
}

impl From<SchemaError> for SyncError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::EntityNotFound(name) => SyncError::EntityNotFound(name),
            SchemaError::UnsupportedSchema { entity, key_count } => {
                SyncError::UnsupportedSchema { entity, key_count }
            }
            other => SyncError::Schema(other),
        }
    }
}
