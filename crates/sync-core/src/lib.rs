//! Core types for the graph-sync framework.
//!
//! This crate provides the foundational pieces the sync engine is generic
//! over:
//!
//! - [`EntityDescriptor`] - static description of an entity type: fields,
//!   primary key, foreign keys and relationship edges
//! - [`EntityKind`] - the closed catalog of entity types, each carrying its
//!   own descriptor
//! - [`Value`] / [`EntityRow`] - detached row representation shared by every
//!   store implementation
//! - [`EntityStore`] - the storage boundary the engine reads from and writes to
//! - [`MemoryStore`] - an in-process `EntityStore`
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── identity-map           (source id → target id bookkeeping)
//!    ├─── graph-sync-postgresql  (implements EntityStore for PostgreSQL)
//!    └─── graph-sync             (walker, upsert engine, orchestrator)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{EntityKind, EntityRow, Value};
//!
//! let kind = EntityKind::resolve("customer").unwrap();
//! assert_eq!(kind, EntityKind::Customer);
//!
//! let row = EntityRow::new(kind)
//!     .with("id", Value::Int(7))
//!     .with("name", Value::from("Customer 7"));
//! assert_eq!(row.key().unwrap(), 7);
//! ```

pub mod catalog;
pub mod memory;
pub mod row;
pub mod schema;
pub mod store;
pub mod values;

pub use catalog::EntityKind;
pub use memory::MemoryStore;
pub use row::EntityRow;
pub use schema::{
    EdgeSide, EntityDescriptor, FieldDef, FieldType, ForeignKeyDef, OnDelete, RelationshipDef,
    SchemaError,
};
pub use store::EntityStore;
pub use values::Value;
