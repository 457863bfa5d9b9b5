//! EntityStore trait definition.
//!
//! This trait is the storage boundary of the sync engine. The same engine
//! code runs against any relational store that can implement it, e.g.
//! PostgreSQL (`graph-sync-postgresql`) or the in-process [`MemoryStore`].
//!
//! [`MemoryStore`]: crate::MemoryStore

use anyhow::Result;

use crate::catalog::EntityKind;
use crate::row::EntityRow;

/// Trait for reading and writing entity rows.
///
/// # Usage Pattern
///
/// The engine uses generics for zero-cost dispatch:
///
/// ```ignore
/// pub struct SyncEngine<S: EntityStore, T: EntityStore, M: MappingStore> { ... }
/// ```
///
/// The CLI entry point picks the concrete stores once, and after that all
/// code is monomorphized for the specific implementation.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Load one row by primary key.
    async fn get(&self, kind: EntityKind, id: i32) -> Result<Option<EntityRow>>;

    /// Load every row of `kind` whose `foreign_key` field equals `principal_id`,
    /// ordered by primary key.
    async fn find_dependents(
        &self,
        kind: EntityKind,
        foreign_key: &str,
        principal_id: i32,
    ) -> Result<Vec<EntityRow>>;

    /// Insert a row and let the store assign its key.
    ///
    /// Any key present on `row` is ignored. Returns the assigned key.
    async fn insert(&self, row: &EntityRow) -> Result<i32>;

    /// Insert a row keeping the key it carries.
    ///
    /// This is the privileged path: the store temporarily permits explicit
    /// key assignment, inserts, and restores automatic assignment, all as
    /// one unit. A failure at any step leaves no row behind and automatic
    /// assignment restored. Inserting a key that already exists fails.
    async fn insert_with_key(&self, row: &EntityRow) -> Result<()>;

    /// Overwrite the non-key fields of an existing row.
    async fn update(&self, row: &EntityRow) -> Result<()>;

    /// Delete a row by primary key. Returns whether a row was removed.
    async fn delete(&self, kind: EntityKind, id: i32) -> Result<bool>;

    /// Number of rows of `kind`.
    async fn count(&self, kind: EntityKind) -> Result<u64>;

    /// Drop and recreate every table of the catalog.
    async fn reset(&self) -> Result<()>;
}
