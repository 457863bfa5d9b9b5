//! Identity mapping storage trait.
//!
//! This module defines the MappingStore trait for backend-agnostic identity
//! bookkeeping.

use anyhow::Result;
use async_trait::async_trait;

use crate::IdentityMapping;

/// Trait for identity mapping storage operations.
///
/// Every instance is bound to one domain; all operations are scoped to it.
/// This trait abstracts the storage backend, allowing the same sync logic
/// to work with:
/// - In-process storage (`MemoryMappingStore`)
/// - PostgreSQL (`PostgresMappingStore`)
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Domain tag this store is scoped to.
    fn domain(&self) -> &str;

    /// Target id recorded for a source row, if any. Read only.
    async fn lookup(&self, entity_name: &str, source_id: i32) -> Result<Option<i32>>;

    /// Record `source_id → target_id`, overwriting a previous target id.
    ///
    /// Idempotent, and durable once it returns: later lookups in the same
    /// sync call rely on it.
    async fn upsert(&self, entity_name: &str, source_id: i32, target_id: i32) -> Result<()>;

    /// All mappings of this domain, ordered by entity name and source id.
    async fn list(&self) -> Result<Vec<IdentityMapping>>;

    /// Remove every mapping of this domain.
    async fn reset(&self) -> Result<()>;
}
