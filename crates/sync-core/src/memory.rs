//! In-process `EntityStore` implementation.
//!
//! Behaves like a relational store with auto-assigned integer keys: plain
//! inserts draw from a per-table counter, explicit keys are only accepted
//! while a table's key override is held, and unique fields are enforced.
//! Used by tests and dry runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::catalog::EntityKind;
use crate::row::EntityRow;
use crate::store::EntityStore;

#[derive(Debug)]
struct MemoryTable {
    rows: BTreeMap<i32, EntityRow>,
    next_id: i32,
    key_override: bool,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
            key_override: false,
        }
    }
}

impl MemoryTable {
    fn check_unique(&self, row: &EntityRow, own_id: Option<i32>) -> Result<()> {
        let descriptor = row.descriptor();
        for field in descriptor.fields.iter().filter(|f| f.unique) {
            let value = row.get(field.name);
            if value.is_null() {
                continue;
            }
            let clash = self
                .rows
                .iter()
                .any(|(id, other)| Some(*id) != own_id && other.get(field.name) == value);
            if clash {
                bail!(
                    "unique constraint violated on {}.{}",
                    descriptor.table,
                    field.name
                );
            }
        }
        Ok(())
    }

    fn store(&mut self, mut row: EntityRow, id: i32) -> Result<()> {
        row.set_key(id)?;
        self.rows.insert(id, row);
        self.next_id = self.next_id.max(id.saturating_add(1));
        Ok(())
    }
}

/// Scoped permission to insert explicit keys into one table.
///
/// The override is released when the scope is dropped, whether the insert
/// succeeded or not.
struct KeyOverride<'a> {
    table: &'a mut MemoryTable,
}

impl<'a> KeyOverride<'a> {
    fn enable(table: &'a mut MemoryTable) -> Self {
        table.key_override = true;
        Self { table }
    }

    fn insert(&mut self, row: &EntityRow) -> Result<()> {
        let id = row.key()?;
        if self.table.rows.contains_key(&id) {
            bail!(
                "duplicate key value violates primary key of {}: id={id}",
                row.descriptor().table
            );
        }
        self.table.check_unique(row, None)?;
        self.table.store(row.clone(), id)
    }
}

impl Drop for KeyOverride<'_> {
    fn drop(&mut self) {
        self.table.key_override = false;
    }
}

/// Thread-safe in-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<EntityKind, MemoryTable>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row of `kind`, ordered by key.
    pub async fn rows(&self, kind: EntityKind) -> Vec<EntityRow> {
        let tables = self.tables.lock().await;
        tables
            .get(&kind)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether explicit key assignment is currently enabled for `kind`.
    pub async fn key_override_active(&self, kind: EntityKind) -> bool {
        let tables = self.tables.lock().await;
        tables.get(&kind).is_some_and(|t| t.key_override)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, kind: EntityKind, id: i32) -> Result<Option<EntityRow>> {
        let tables = self.tables.lock().await;
        Ok(tables.get(&kind).and_then(|t| t.rows.get(&id).cloned()))
    }

    async fn find_dependents(
        &self,
        kind: EntityKind,
        foreign_key: &str,
        principal_id: i32,
    ) -> Result<Vec<EntityRow>> {
        kind.descriptor().field(foreign_key)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .get(&kind)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|row| row.get(foreign_key).as_i32() == Some(principal_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, row: &EntityRow) -> Result<i32> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(row.kind()).or_default();
        table.check_unique(row, None)?;
        let id = table.next_id;
        if table.rows.contains_key(&id) {
            bail!("no free key left in {}", row.descriptor().table);
        }
        table.store(row.clone(), id)?;
        tracing::debug!("Inserted {} with assigned id {}", row.kind(), id);
        Ok(id)
    }

    async fn insert_with_key(&self, row: &EntityRow) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(row.kind()).or_default();
        let mut scope = KeyOverride::enable(table);
        scope.insert(row)?;
        tracing::debug!("Inserted {} with explicit id {}", row.kind(), row.key()?);
        Ok(())
    }

    async fn update(&self, row: &EntityRow) -> Result<()> {
        let id = row.key()?;
        let mut tables = self.tables.lock().await;
        let table = tables.entry(row.kind()).or_default();
        if !table.rows.contains_key(&id) {
            bail!("no {} row with id {id} to update", row.kind());
        }
        table.check_unique(row, Some(id))?;
        table.rows.insert(id, row.clone());
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: i32) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .get_mut(&kind)
            .is_some_and(|t| t.rows.remove(&id).is_some()))
    }

    async fn count(&self, kind: EntityKind) -> Result<u64> {
        let tables = self.tables.lock().await;
        Ok(tables.get(&kind).map_or(0, |t| t.rows.len() as u64))
    }

    async fn reset(&self) -> Result<()> {
        self.tables.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: &str, email: &str) -> EntityRow {
        EntityRow::new(EntityKind::Customer)
            .with("name", name)
            .with("email", email)
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_keys() {
        let store = MemoryStore::new();
        let a = store.insert(&customer("A", "a@example.com")).await.unwrap();
        let b = store.insert(&customer("B", "b@example.com")).await.unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.count(EntityKind::Customer).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_explicit_key_advances_counter() {
        let store = MemoryStore::new();
        let row = customer("A", "a@example.com").with("id", 10);
        store.insert_with_key(&row).await.unwrap();

        let next = store.insert(&customer("B", "b@example.com")).await.unwrap();
        assert_eq!(next, 11);
        assert!(!store.key_override_active(EntityKind::Customer).await);
    }

    #[tokio::test]
    async fn test_explicit_key_at_upper_bound() {
        let store = MemoryStore::new();
        let row = customer("A", "a@example.com").with("id", i32::MAX);
        store.insert_with_key(&row).await.unwrap();
        assert!(store.get(EntityKind::Customer, i32::MAX).await.unwrap().is_some());

        let err = store
            .insert(&customer("B", "b@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no free key left in customers");
        assert_eq!(store.count(EntityKind::Customer).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_explicit_key_fails_and_restores_override() {
        let store = MemoryStore::new();
        let row = customer("A", "a@example.com").with("id", 3);
        store.insert_with_key(&row).await.unwrap();

        let dup = customer("Other", "other@example.com").with("id", 3);
        let err = store.insert_with_key(&dup).await.unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
        assert!(!store.key_override_active(EntityKind::Customer).await);

        let stored = store.get(EntityKind::Customer, 3).await.unwrap().unwrap();
        assert_eq!(stored.get("name").as_str(), Some("A"));
    }

    #[tokio::test]
    async fn test_unique_fields_are_enforced() {
        let store = MemoryStore::new();
        store.insert(&customer("A", "same@example.com")).await.unwrap();
        let err = store
            .insert(&customer("B", "same@example.com"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("customers.email"));
    }

    #[tokio::test]
    async fn test_update_requires_existing_row() {
        let store = MemoryStore::new();
        let row = customer("A", "a@example.com").with("id", 5);
        assert!(store.update(&row).await.is_err());

        store.insert_with_key(&row).await.unwrap();
        let renamed = row.clone().with("name", "Renamed");
        store.update(&renamed).await.unwrap();
        let stored = store.get(EntityKind::Customer, 5).await.unwrap().unwrap();
        assert_eq!(stored.get("name").as_str(), Some("Renamed"));
    }

    #[tokio::test]
    async fn test_find_dependents_filters_by_foreign_key() {
        let store = MemoryStore::new();
        for (customer_id, street) in [(1, "1 Main St"), (2, "2 Main St"), (1, "1 Second Ave")] {
            let address = EntityRow::new(EntityKind::Address)
                .with("customer_id", customer_id)
                .with("street", street);
            store.insert(&address).await.unwrap();
        }

        let found = store
            .find_dependents(EntityKind::Address, "customer_id", 1)
            .await
            .unwrap();
        let streets: Vec<_> = found.iter().map(|r| r.get("street").as_str().unwrap()).collect();
        assert_eq!(streets, vec!["1 Main St", "1 Second Ave"]);

        assert!(store
            .find_dependents(EntityKind::Address, "no_such_column", 1)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_and_reset() {
        let store = MemoryStore::new();
        let id = store.insert(&customer("A", "a@example.com")).await.unwrap();
        assert!(store.delete(EntityKind::Customer, id).await.unwrap());
        assert!(!store.delete(EntityKind::Customer, id).await.unwrap());

        store.insert(&customer("B", "b@example.com")).await.unwrap();
        store.reset().await.unwrap();
        assert_eq!(store.count(EntityKind::Customer).await.unwrap(), 0);
    }
}
