//! `EntityStore` implementation backed by PostgreSQL.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sync_core::{EntityDescriptor, EntityKind, EntityRow, EntityStore};
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Row, Transaction};
use tracing::debug;

use crate::client::new_postgresql_client;
use crate::ddl::{create_tables, drop_tables};
use crate::value::{read_value, to_sql_param, SqlParam};

/// Entity store over a single PostgreSQL connection.
#[derive(Clone)]
pub struct PostgresStore {
    client: Arc<Mutex<Client>>,
}

impl PostgresStore {
    pub fn new(client: Arc<Mutex<Client>>) -> Self {
        Self { client }
    }

    /// Connect the store playing `role` (`source` or `target`).
    pub async fn connect(role: &str, connection_string: &str) -> Result<Self> {
        Ok(Self::new(new_postgresql_client(role, connection_string).await?))
    }

    pub fn client(&self) -> Arc<Mutex<Client>> {
        self.client.clone()
    }

    /// Create the catalog tables if they do not exist.
    pub async fn create_schema(&self) -> Result<()> {
        let client = self.client.lock().await;
        create_tables(&client).await
    }

    pub async fn drop_schema(&self) -> Result<()> {
        let client = self.client.lock().await;
        drop_tables(&client).await
    }
}

fn column_list(descriptor: &EntityDescriptor) -> String {
    descriptor
        .fields
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_to_entity(kind: EntityKind, row: &Row) -> Result<EntityRow> {
    let mut entity = EntityRow::new(kind);
    for field in kind.descriptor().fields {
        entity.set(field.name, read_value(row, field)?)?;
    }
    Ok(entity)
}

/// Non-key columns of `row` with their parameters, in descriptor order.
fn scalar_params(row: &EntityRow) -> Result<(Vec<&'static str>, Vec<SqlParam>)> {
    let descriptor = row.descriptor();
    let key = descriptor.primary_key()?.name;
    let mut columns = Vec::new();
    let mut params = Vec::new();
    for field in descriptor.fields.iter().filter(|f| f.name != key) {
        columns.push(field.name);
        params.push(to_sql_param(field, row.get(field.name))?);
    }
    Ok((columns, params))
}

fn param_refs(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Explicit key assignment for one table, held for the life of a transaction.
///
/// `enable` switches the identity column to BY DEFAULT inside the
/// transaction. `release` restores GENERATED ALWAYS, moves the sequence past
/// the highest key and commits. Dropping the scope without `release` rolls
/// the whole transaction back, including the column change.
struct KeyOverride<'a> {
    tx: Transaction<'a>,
    descriptor: &'static EntityDescriptor,
}

impl<'a> KeyOverride<'a> {
    async fn enable(tx: Transaction<'a>, descriptor: &'static EntityDescriptor) -> Result<Self> {
        let key = descriptor.primary_key()?.name;
        tx.batch_execute(&format!(
            "ALTER TABLE {} ALTER COLUMN {key} SET GENERATED BY DEFAULT",
            descriptor.table
        ))
        .await
        .with_context(|| format!("Failed to enable explicit keys on {}", descriptor.table))?;
        Ok(Self { tx, descriptor })
    }

    async fn insert(&self, row: &EntityRow) -> Result<()> {
        let key = self.descriptor.primary_key()?;
        let (mut columns, mut params) = scalar_params(row)?;
        columns.insert(0, key.name);
        params.insert(0, Box::new(row.key()?));

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.descriptor.table,
            columns.join(", "),
            placeholders(params.len())
        );
        self.tx.execute(&sql, &param_refs(&params)).await?;
        Ok(())
    }

    async fn release(self) -> Result<()> {
        let table = self.descriptor.table;
        let key = self.descriptor.primary_key()?.name;
        self.tx
            .batch_execute(&format!(
                "ALTER TABLE {table} ALTER COLUMN {key} SET GENERATED ALWAYS; \
                 SELECT setval(pg_get_serial_sequence('{table}', '{key}'), \
                 GREATEST((SELECT MAX({key}) FROM {table}), 1))"
            ))
            .await
            .with_context(|| format!("Failed to restore generated keys on {table}"))?;
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PostgresStore {
    async fn get(&self, kind: EntityKind, id: i32) -> Result<Option<EntityRow>> {
        let descriptor = kind.descriptor();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            column_list(descriptor),
            descriptor.table,
            descriptor.primary_key()?.name
        );
        let client = self.client.lock().await;
        let row = client.query_opt(&sql, &[&id]).await?;
        row.map(|r| row_to_entity(kind, &r)).transpose()
    }

    async fn find_dependents(
        &self,
        kind: EntityKind,
        foreign_key: &str,
        principal_id: i32,
    ) -> Result<Vec<EntityRow>> {
        let descriptor = kind.descriptor();
        let fk = descriptor.field(foreign_key)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY {}",
            column_list(descriptor),
            descriptor.table,
            fk.name,
            descriptor.primary_key()?.name
        );
        let client = self.client.lock().await;
        let rows = client.query(&sql, &[&principal_id]).await?;
        rows.iter().map(|r| row_to_entity(kind, r)).collect()
    }

    async fn insert(&self, row: &EntityRow) -> Result<i32> {
        let descriptor = row.descriptor();
        let (columns, params) = scalar_params(row)?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            descriptor.table,
            columns.join(", "),
            placeholders(params.len()),
            descriptor.primary_key()?.name
        );
        let client = self.client.lock().await;
        let inserted = client.query_one(&sql, &param_refs(&params)).await?;
        let id: i32 = inserted.try_get(0)?;
        debug!("Inserted {} with assigned id {}", row.kind(), id);
        Ok(id)
    }

    async fn insert_with_key(&self, row: &EntityRow) -> Result<()> {
        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;
        let scope = KeyOverride::enable(tx, row.descriptor()).await?;
        scope.insert(row).await?;
        scope.release().await?;
        debug!("Inserted {} with explicit id {}", row.kind(), row.key()?);
        Ok(())
    }

    async fn update(&self, row: &EntityRow) -> Result<()> {
        let descriptor = row.descriptor();
        let (columns, mut params) = scalar_params(row)?;
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c} = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        params.push(Box::new(row.key()?));
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ${}",
            descriptor.table,
            descriptor.primary_key()?.name,
            params.len()
        );
        let client = self.client.lock().await;
        let updated = client.execute(&sql, &param_refs(&params)).await?;
        if updated == 0 {
            bail!("no {} row with id {} to update", row.kind(), row.key()?);
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: i32) -> Result<bool> {
        let descriptor = kind.descriptor();
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            descriptor.table,
            descriptor.primary_key()?.name
        );
        let client = self.client.lock().await;
        Ok(client.execute(&sql, &[&id]).await? > 0)
    }

    async fn count(&self, kind: EntityKind) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.descriptor().table);
        let client = self.client.lock().await;
        let count: i64 = client.query_one(&sql, &[]).await?.try_get(0)?;
        Ok(count as u64)
    }

    async fn reset(&self) -> Result<()> {
        let client = self.client.lock().await;
        drop_tables(&client).await?;
        create_tables(&client).await
    }
}
