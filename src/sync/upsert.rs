//! Per-node write decision: update, insert under a fresh key, or insert
//! keeping the source key.

use identity_map::MappingStore;
use sync_core::{EntityRow, EntityStore, Value};
use tracing::{debug, warn};

use super::error::SyncError;
use super::report::{SyncAction, SyncedEntity};

/// Key written into a foreign key whose principal has no mapping.
pub const UNRESOLVED_FOREIGN_KEY: i32 = 0;

/// Writes single source rows into the target store and keeps the identity
/// mapping current.
pub struct Upserter<'a, T, M> {
    target: &'a T,
    mappings: &'a M,
}

impl<'a, T: EntityStore, M: MappingStore> Upserter<'a, T, M> {
    pub fn new(target: &'a T, mappings: &'a M) -> Self {
        Self { target, mappings }
    }

    /// Materialize `source_row` in the target.
    ///
    /// The row's principals must already be synced for its foreign keys to
    /// resolve; unresolved ones are written as [`UNRESOLVED_FOREIGN_KEY`].
    pub async fn upsert(&self, source_row: &EntityRow) -> Result<SyncedEntity, SyncError> {
        let kind = source_row.kind();
        let entity = kind.name();
        let source_id = source_row.key()?;
        let mut shadow = self.build_shadow(source_row).await?;

        let mapped = self
            .mappings
            .lookup(entity, source_id)
            .await
            .map_err(|e| SyncError::mapping(entity, e))?;

        let (action, target_id) = match mapped {
            Some(target_id) => {
                let existing = self
                    .target
                    .get(kind, target_id)
                    .await
                    .map_err(|e| SyncError::storage(entity, source_id, e))?;
                match existing {
                    Some(mut row) => {
                        row.copy_scalars_from(&shadow);
                        self.target
                            .update(&row)
                            .await
                            .map_err(|e| SyncError::storage(entity, source_id, e))?;
                    }
                    None => {
                        warn!(
                            "Mapped {entity} {target_id} is missing from the target, re-creating it for source {source_id}"
                        );
                        shadow.set_key(target_id)?;
                        self.insert_with_key(&shadow, target_id).await?;
                    }
                }
                (SyncAction::Updated, target_id)
            }
            None => {
                let collides = self
                    .target
                    .get(kind, source_id)
                    .await
                    .map_err(|e| SyncError::storage(entity, source_id, e))?
                    .is_some();
                if collides {
                    let target_id = self
                        .target
                        .insert(&shadow)
                        .await
                        .map_err(|e| SyncError::storage(entity, source_id, e))?;
                    self.record(entity, source_id, target_id).await?;
                    (SyncAction::InsertedIdentity, target_id)
                } else {
                    shadow.set_key(source_id)?;
                    self.insert_with_key(&shadow, source_id).await?;
                    self.record(entity, source_id, source_id).await?;
                    (SyncAction::InsertedWithId, source_id)
                }
            }
        };

        debug!("{entity} {source_id} -> {target_id}: {action:?}");
        Ok(SyncedEntity {
            entity: entity.to_string(),
            action,
            source_id,
            target_id,
        })
    }

    /// Target-side copy of a source row: scalars copied, foreign keys
    /// translated through the mapping, key left unset.
    async fn build_shadow(&self, source_row: &EntityRow) -> Result<EntityRow, SyncError> {
        let descriptor = source_row.descriptor();
        let mut shadow = EntityRow::new(source_row.kind());

        for field in descriptor.scalars() {
            let value = source_row.get(field.name);
            let Some(fk) = descriptor.foreign_key(field.name) else {
                shadow.set(field.name, value.clone())?;
                continue;
            };

            let translated = match value {
                Value::Null => Value::Null,
                Value::Int(principal_source_id) => {
                    let principal = fk.principal.name();
                    let target_id = self
                        .mappings
                        .lookup(principal, *principal_source_id)
                        .await
                        .map_err(|e| SyncError::mapping(descriptor.name, e))?;
                    match target_id {
                        Some(id) => Value::Int(id),
                        None => {
                            warn!(
                                "{}.{} = {principal_source_id} has no {principal} mapping, writing {UNRESOLVED_FOREIGN_KEY}",
                                descriptor.name, field.name
                            );
                            Value::Int(UNRESOLVED_FOREIGN_KEY)
                        }
                    }
                }
                _ => {
                    return Err(SyncError::Schema(sync_core::SchemaError::InvalidKey {
                        entity: descriptor.name,
                        field: fk.field,
                    }))
                }
            };
            shadow.set(field.name, translated)?;
        }

        Ok(shadow)
    }

    async fn insert_with_key(&self, shadow: &EntityRow, id: i32) -> Result<(), SyncError> {
        self.target
            .insert_with_key(shadow)
            .await
            .map_err(|source| SyncError::KeyPreservingInsert {
                entity: shadow.kind().name(),
                id,
                source,
            })
    }

    async fn record(&self, entity: &'static str, source_id: i32, target_id: i32) -> Result<(), SyncError> {
        self.mappings
            .upsert(entity, source_id, target_id)
            .await
            .map_err(|e| SyncError::mapping(entity, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity_map::MemoryMappingStore;
    use rust_decimal::Decimal;
    use sync_core::{EntityKind, MemoryStore};

    fn customer(id: i32, name: &str) -> EntityRow {
        EntityRow::new(EntityKind::Customer)
            .with("id", id)
            .with("name", name)
            .with("email", format!("{}@example.com", name.to_lowercase()))
    }

    #[tokio::test]
    async fn test_first_sync_keeps_source_key() {
        let target = MemoryStore::new();
        let mappings = MemoryMappingStore::new("SalesDb");
        let upserter = Upserter::new(&target, &mappings);

        let synced = upserter.upsert(&customer(4, "Dana")).await.unwrap();

        assert_eq!(synced.action, SyncAction::InsertedWithId);
        assert_eq!(synced.target_id, 4);
        assert_eq!(mappings.lookup("Customer", 4).await.unwrap(), Some(4));
        assert!(!target.key_override_active(EntityKind::Customer).await);
    }

    #[tokio::test]
    async fn test_key_collision_inserts_fresh_key() {
        let target = MemoryStore::new();
        target.insert_with_key(&customer(4, "Occupant")).await.unwrap();
        let mappings = MemoryMappingStore::new("SalesDb");
        let upserter = Upserter::new(&target, &mappings);

        let synced = upserter.upsert(&customer(4, "Dana")).await.unwrap();

        assert_eq!(synced.action, SyncAction::InsertedIdentity);
        assert_eq!(synced.target_id, 5);
        assert_eq!(mappings.lookup("Customer", 4).await.unwrap(), Some(5));
        let occupant = target.get(EntityKind::Customer, 4).await.unwrap().unwrap();
        assert_eq!(occupant.get("name").as_str(), Some("Occupant"));
    }

    #[tokio::test]
    async fn test_mapped_row_is_updated_in_place() {
        let target = MemoryStore::new();
        target.insert_with_key(&customer(9, "Old")).await.unwrap();
        let mappings = MemoryMappingStore::new("SalesDb");
        mappings.upsert("Customer", 3, 9).await.unwrap();
        let upserter = Upserter::new(&target, &mappings);

        let synced = upserter.upsert(&customer(3, "New")).await.unwrap();

        assert_eq!(synced.action, SyncAction::Updated);
        assert_eq!(synced.target_id, 9);
        let row = target.get(EntityKind::Customer, 9).await.unwrap().unwrap();
        assert_eq!(row.get("name").as_str(), Some("New"));
        assert_eq!(target.count(EntityKind::Customer).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_are_translated() {
        let target = MemoryStore::new();
        let mappings = MemoryMappingStore::new("SalesDb");
        mappings.upsert("Order", 3, 9).await.unwrap();
        let upserter = Upserter::new(&target, &mappings);

        let item = EntityRow::new(EntityKind::OrderLineItem)
            .with("id", 1)
            .with("order_id", 3)
            .with("product_id", 7)
            .with("quantity", 2)
            .with("unit_price", Decimal::new(1100, 2));
        upserter.upsert(&item).await.unwrap();

        let written = target.get(EntityKind::OrderLineItem, 1).await.unwrap().unwrap();
        assert_eq!(written.get("order_id").as_i32(), Some(9));
        assert_eq!(written.get("product_id").as_i32(), Some(UNRESOLVED_FOREIGN_KEY));
        assert_eq!(written.get("quantity").as_i32(), Some(2));
    }
}
