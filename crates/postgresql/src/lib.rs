//! PostgreSQL support for graph-sync
//!
//! This library implements the `EntityStore` boundary on top of
//! `tokio-postgres`: connection setup, schema bootstrap derived from the
//! entity descriptors, row conversion, and the key-preserving insert path.

mod client;
mod ddl;
mod store;
mod value;

pub use client::new_postgresql_client;
pub use ddl::{create_table_sql, create_tables, drop_tables, ToDdl};
pub use store::PostgresStore;
pub use value::{read_value, to_sql_param, SqlParam};
