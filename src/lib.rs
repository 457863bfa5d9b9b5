//! graph-sync library
//!
//! On-demand synchronization of one record and everything it transitively
//! references or is referenced by, from a source relational store into an
//! independently keyed target store.
//!
//! # Features
//!
//! - Graph walk: principals are written before their dependents, each node once
//! - Identity mapping: source keys are mapped to target keys in a durable
//!   table, so re-running a sync updates instead of duplicating
//! - Key preservation: rows keep their source key in the target when it is free
//! - Self-healing: a mapped target row that went missing is re-created at its
//!   mapped key
//!
//! # Crates
//!
//! - `sync_core` - schema descriptors, entity catalog, rows, `EntityStore`
//! - `identity_map` - `MappingStore` and its implementations
//! - `graph_sync_postgresql` - PostgreSQL `EntityStore`
//!
//! # CLI Usage
//!
//! ```bash
//! # Sync a customer and its addresses, orders and line items
//! graph-sync sync Customer 1 --source-uri postgres://... --target-uri postgres://...
//!
//! # Reset both stores and load demo data
//! graph-sync seed --source-uri postgres://... --target-uri postgres://...
//!
//! # HTTP surface
//! graph-sync serve --listen 0.0.0.0:8080 --source-uri postgres://... --target-uri postgres://...
//! ```

pub mod config;
pub mod seed;
pub mod server;
pub mod sync;

pub use seed::{seed_demo_data, SeedSummary};
pub use sync::{SyncAction, SyncEngine, SyncError, SyncReport, SyncStatus, SyncedEntity};
