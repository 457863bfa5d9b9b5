//! PostgreSQL mapping storage implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_postgres::Client;

use crate::store::MappingStore;
use crate::{IdentityMapping, MappingConfig};

/// PostgreSQL implementation of MappingStore trait.
///
/// Table layout: `(source_id int, target_id int, entity_name varchar,
/// domain varchar)` with a primary key over all four columns, plus a unique
/// index on `(source_id, entity_name, domain)` that enforces one mapping per
/// source row and backs the upsert.
pub struct PostgresMappingStore {
    client: Arc<Mutex<Client>>,
    config: MappingConfig,
    table: String,
}

impl PostgresMappingStore {
    /// Create a new PostgresMappingStore with the given client and config.
    pub fn new(client: Arc<Mutex<Client>>, config: MappingConfig) -> Self {
        let table = quote_ident(&config.table_name);
        Self {
            client,
            config,
            table,
        }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Create the mapping table and its unique index if missing.
    pub async fn ensure_table(&self) -> Result<()> {
        let index = quote_ident(&format!("{}_source_key", self.config.table_name));
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                source_id INTEGER NOT NULL,
                target_id INTEGER NOT NULL,
                entity_name VARCHAR(200) NOT NULL,
                domain VARCHAR(200) NOT NULL,
                PRIMARY KEY (source_id, target_id, entity_name, domain)
            );
            CREATE UNIQUE INDEX IF NOT EXISTS {index}
                ON {table} (source_id, entity_name, domain);",
            table = self.table,
        );

        let client = self.client.lock().await;
        client
            .batch_execute(&ddl)
            .await
            .with_context(|| format!("Failed to create mapping table {}", self.table))?;
        tracing::info!("Mapping table {} is ready", self.table);
        Ok(())
    }
}

#[async_trait]
impl MappingStore for PostgresMappingStore {
    fn domain(&self) -> &str {
        &self.config.domain
    }

    async fn lookup(&self, entity_name: &str, source_id: i32) -> Result<Option<i32>> {
        let query = format!(
            "SELECT target_id FROM {} WHERE source_id = $1 AND entity_name = $2 AND domain = $3",
            self.table
        );
        let client = self.client.lock().await;
        let row = client
            .query_opt(&query, &[&source_id, &entity_name, &self.config.domain])
            .await?;
        Ok(row.map(|r| r.get::<_, i32>(0)))
    }

    async fn upsert(&self, entity_name: &str, source_id: i32, target_id: i32) -> Result<()> {
        let query = format!(
            "INSERT INTO {} (source_id, target_id, entity_name, domain)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (source_id, entity_name, domain)
             DO UPDATE SET target_id = EXCLUDED.target_id",
            self.table
        );
        let client = self.client.lock().await;
        client
            .execute(
                &query,
                &[&source_id, &target_id, &entity_name, &self.config.domain],
            )
            .await?;
        tracing::debug!(
            "Recorded mapping {}:{} -> {} in domain {}",
            entity_name,
            source_id,
            target_id,
            self.config.domain
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<IdentityMapping>> {
        let query = format!(
            "SELECT source_id, target_id, entity_name, domain FROM {}
             WHERE domain = $1 ORDER BY entity_name, source_id",
            self.table
        );
        let client = self.client.lock().await;
        let rows = client.query(&query, &[&self.config.domain]).await?;
        Ok(rows
            .iter()
            .map(|row| IdentityMapping {
                source_id: row.get("source_id"),
                target_id: row.get("target_id"),
                entity_name: row.get("entity_name"),
                domain: row.get("domain"),
            })
            .collect())
    }

    async fn reset(&self) -> Result<()> {
        let query = format!("DELETE FROM {} WHERE domain = $1", self.table);
        let client = self.client.lock().await;
        let removed = client.execute(&query, &[&self.config.domain]).await?;
        tracing::info!(
            "Removed {} mappings of domain {}",
            removed,
            self.config.domain
        );
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
