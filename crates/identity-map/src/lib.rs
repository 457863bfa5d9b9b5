//! Identity mapping management for graph-sync
//!
//! Source and target stores assign primary keys independently. This crate
//! keeps the durable record of which target row materializes which source
//! row, so that re-running a sync converges instead of duplicating data.
//!
//! # Architecture
//!
//! - [`IdentityMapping`] - one `(sourceId, entityName, domain) → targetId` row
//! - [`MappingStore`] - storage-agnostic lookup/upsert interface, scoped to
//!   one domain
//! - [`MappingConfig`] - domain tag and table name
//!
//! ## Storage Backends
//!
//! - `MemoryMappingStore` - Keeps mappings in process memory
//! - `PostgresMappingStore` - Stores mappings in a PostgreSQL table
//!
//! At most one mapping exists per `(sourceId, entityName, domain)`. Lookups
//! always go from a known source id to the target id.

mod config;
mod mapping;
mod memory;
mod postgres;
pub mod store;


// Re-export config types
pub use config::{MappingConfig, DEFAULT_DOMAIN, DEFAULT_TABLE};

// Re-export mapping types
pub use mapping::IdentityMapping;

// Re-export store trait
pub use store::MappingStore;

// Re-export storage implementations
pub use memory::MemoryMappingStore;
pub use postgres::PostgresMappingStore;
