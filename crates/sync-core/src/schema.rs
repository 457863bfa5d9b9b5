//! Schema descriptors for the graph-sync framework.
//!
//! Every entity type the engine can synchronize is described by a static
//! [`EntityDescriptor`]. The engine never inspects rows reflectively; all it
//! knows about an entity type comes from these capability lists:
//!
//! - **Fields** - ordered column metadata (`FieldDef`), key included
//! - **Primary key** - exactly one key field; composite keys are rejected
//! - **Foreign keys** - fields that point at a principal entity type
//! - **Relationships** - navigable edges, tagged with the side this entity
//!   sits on (`Dependent` holds the foreign key, `Principal` is referenced)

use crate::catalog::EntityKind;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// No entity type matches the requested name
    #[error("Entity '{0}' not found in source model.")]
    EntityNotFound(String),

    /// Entity type does not have exactly one key field
    #[error("Entity '{entity}' declares {key_count} key fields; only single-column keys are supported")]
    UnsupportedSchema {
        entity: &'static str,
        key_count: usize,
    },

    /// Key field is absent or not an integer on a row
    #[error("Row of '{entity}' has no integer value for key field '{field}'")]
    InvalidKey {
        entity: &'static str,
        field: &'static str,
    },

    /// Field not declared on the entity type
    #[error("Field '{field}' not found on entity '{entity}'")]
    FieldNotFound { entity: &'static str, field: String },
}

// ============================================================================
// Field Types
// ============================================================================

/// Column type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 32-bit signed integer (keys and foreign keys are always `Int`)
    Int,

    /// Bounded character data
    Text {
        /// Maximum length in characters
        max_length: u32,
    },

    /// Exact decimal
    Decimal {
        /// Total number of digits
        precision: u8,
        /// Number of digits after the decimal point
        scale: u8,
    },

    /// Point in time, stored in UTC
    Timestamp,
}

/// Single column of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Column name
    pub name: &'static str,

    /// Column type
    pub field_type: FieldType,

    /// Whether the column accepts NULL
    pub nullable: bool,

    /// Whether the column carries a unique constraint
    pub unique: bool,
}

impl FieldDef {
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Int,
            nullable: false,
            unique: false,
        }
    }

    pub const fn text(name: &'static str, max_length: u32) -> Self {
        Self {
            name,
            field_type: FieldType::Text { max_length },
            nullable: false,
            unique: false,
        }
    }

    pub const fn decimal(name: &'static str, precision: u8, scale: u8) -> Self {
        Self {
            name,
            field_type: FieldType::Decimal { precision, scale },
            nullable: false,
            unique: false,
        }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Timestamp,
            nullable: false,
            unique: false,
        }
    }

    /// Mark the field as nullable.
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the field as unique.
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

// ============================================================================
// Keys and Relationships
// ============================================================================

/// Referential action applied when the principal row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    Restrict,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

/// A field holding the key of a principal entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// Field on this entity holding the principal's key
    pub field: &'static str,

    /// Entity type the field points at
    pub principal: EntityKind,

    /// Delete rule enforced by the store
    pub on_delete: OnDelete,
}

/// Which end of a foreign-key relationship an entity sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    /// This entity holds the foreign key and references a principal
    Dependent,

    /// This entity is referenced by the foreign key of another entity
    Principal,
}

/// Navigable edge from one entity type to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipDef {
    /// Edge name (e.g., `orders`, `customer`)
    pub name: &'static str,

    /// Side of the relationship this entity is on
    pub side: EdgeSide,

    /// Whether the edge yields many related rows
    pub collection: bool,

    /// Entity type at the other end of the edge
    pub target: EntityKind,

    /// Foreign-key field implementing the edge.
    ///
    /// For `Dependent` edges the field lives on this entity; for `Principal`
    /// edges it lives on `target`.
    pub foreign_key: &'static str,
}

impl RelationshipDef {
    /// Reference from a dependent to its principal.
    pub const fn reference(
        name: &'static str,
        target: EntityKind,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            name,
            side: EdgeSide::Dependent,
            collection: false,
            target,
            foreign_key,
        }
    }

    /// Collection of dependents pointing back at this principal.
    pub const fn collection(
        name: &'static str,
        target: EntityKind,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            name,
            side: EdgeSide::Principal,
            collection: true,
            target,
            foreign_key,
        }
    }

    /// Optional single dependent pointing back at this principal.
    pub const fn optional_dependent(
        name: &'static str,
        target: EntityKind,
        foreign_key: &'static str,
    ) -> Self {
        Self {
            name,
            side: EdgeSide::Principal,
            collection: false,
            target,
            foreign_key,
        }
    }

    /// True for single-valued edges to a principal. These must be walked
    /// before the entity itself is written.
    pub fn is_principal_reference(&self) -> bool {
        self.side == EdgeSide::Dependent && !self.collection
    }
}

// ============================================================================
// Entity Descriptor
// ============================================================================

/// Static description of one entity type.
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Entity kind this descriptor belongs to
    pub kind: EntityKind,

    /// Short type name (e.g., `Customer`)
    pub name: &'static str,

    /// Fully-qualified type name (e.g., `sales::Customer`)
    pub qualified_name: &'static str,

    /// Backing table name
    pub table: &'static str,

    /// Key field names
    pub keys: &'static [&'static str],

    /// All fields in declaration order, key fields included
    pub fields: &'static [FieldDef],

    /// Foreign-key fields
    pub foreign_keys: &'static [ForeignKeyDef],

    /// Relationship edges in declaration order
    pub relationships: &'static [RelationshipDef],
}

impl EntityDescriptor {
    /// The single key field of this entity type.
    ///
    /// Fails with [`SchemaError::UnsupportedSchema`] for composite (or
    /// missing) keys; identity mapping works on one integer per row.
    pub fn primary_key(&self) -> Result<&FieldDef, SchemaError> {
        match self.keys {
            [key] => self.field(key),
            keys => Err(SchemaError::UnsupportedSchema {
                entity: self.name,
                key_count: keys.len(),
            }),
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<&FieldDef, SchemaError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SchemaError::FieldNotFound {
                entity: self.name,
                field: name.to_string(),
            })
    }

    /// Non-key fields in declaration order.
    pub fn scalars(&self) -> impl Iterator<Item = &FieldDef> + '_ {
        self.fields.iter().filter(|f| !self.keys.contains(&f.name))
    }

    pub fn foreign_keys(&self) -> &'static [ForeignKeyDef] {
        self.foreign_keys
    }

    /// Foreign-key definition for a field, if the field is one.
    pub fn foreign_key(&self, field: &str) -> Option<&ForeignKeyDef> {
        self.foreign_keys.iter().find(|fk| fk.field == field)
    }

    pub fn relationships(&self) -> &'static [RelationshipDef] {
        self.relationships
    }

    /// Case-insensitive match against the short or qualified name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.qualified_name.eq_ignore_ascii_case(name)
    }
}
