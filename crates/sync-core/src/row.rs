//! Detached entity rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::EntityKind;
use crate::schema::{EntityDescriptor, SchemaError};
use crate::values::Value;

/// One row of an entity type, detached from the store it came from.
///
/// Rows are plain values: reading one from a store yields an owned copy,
/// and writing one hands the store a borrowed view. Nothing is shared
/// between the source and target side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRow {
    #[serde(skip)]
    kind: EntityKind,
    #[serde(flatten)]
    values: BTreeMap<&'static str, Value>,
}

impl EntityRow {
    /// Create an empty row of the given kind.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style `set` for known field names.
    ///
    /// Unknown names are ignored; use [`EntityRow::set`] to get an error.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        let _ = self.set(field, value);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.kind.descriptor()
    }

    /// Value of a field; absent fields read as `Null`.
    pub fn get(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&Value::Null)
    }

    /// Set a declared field.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), SchemaError> {
        let def = self.descriptor().field(field)?;
        self.values.insert(def.name, value.into());
        Ok(())
    }

    /// Value of the single primary-key field.
    pub fn key(&self) -> Result<i32, SchemaError> {
        let descriptor = self.descriptor();
        let key = descriptor.primary_key()?;
        self.get(key.name)
            .as_i32()
            .ok_or(SchemaError::InvalidKey {
                entity: descriptor.name,
                field: key.name,
            })
    }

    /// Overwrite the primary-key value.
    pub fn set_key(&mut self, id: i32) -> Result<(), SchemaError> {
        let key = self.descriptor().primary_key()?;
        self.values.insert(key.name, Value::Int(id));
        Ok(())
    }

    /// Remove the primary-key value so the store assigns one.
    pub fn clear_key(&mut self) -> Result<(), SchemaError> {
        let key = self.descriptor().primary_key()?;
        self.values.remove(key.name);
        Ok(())
    }

    /// Copy every non-key field from `other` onto this row.
    pub fn copy_scalars_from(&mut self, other: &EntityRow) {
        for field in self.descriptor().scalars() {
            self.values.insert(field.name, other.get(field.name).clone());
        }
    }

    /// Iterate over the populated fields.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.values.iter().map(|(name, value)| (*name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let mut row = EntityRow::new(EntityKind::Customer);
        assert!(matches!(row.key(), Err(SchemaError::InvalidKey { .. })));

        row.set_key(42).unwrap();
        assert_eq!(row.key().unwrap(), 42);

        row.clear_key().unwrap();
        assert!(row.get("id").is_null());
    }

    #[test]
    fn test_set_rejects_undeclared_field() {
        let mut row = EntityRow::new(EntityKind::Product);
        let err = row.set("colour", "red").unwrap_err();
        assert!(matches!(err, SchemaError::FieldNotFound { entity: "Product", .. }));
    }

    #[test]
    fn test_copy_scalars_keeps_key() {
        let source = EntityRow::new(EntityKind::Customer)
            .with("id", 1)
            .with("name", "New Name")
            .with("email", "new@example.com");
        let mut target = EntityRow::new(EntityKind::Customer)
            .with("id", 9)
            .with("name", "Old Name")
            .with("email", "old@example.com");

        target.copy_scalars_from(&source);

        assert_eq!(target.key().unwrap(), 9);
        assert_eq!(target.get("name").as_str(), Some("New Name"));
        assert_eq!(target.get("email").as_str(), Some("new@example.com"));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let row = EntityRow::new(EntityKind::Customer)
            .with("id", 3)
            .with("name", "Customer 3");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "name": "Customer 3"}));
    }
}
