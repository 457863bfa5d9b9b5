//! Schema bootstrap derived from entity descriptors.

use anyhow::{Context, Result};
use sync_core::{EntityDescriptor, EntityKind, FieldType};
use tokio_postgres::Client;
use tracing::info;

/// Render a type as a PostgreSQL column type.
pub trait ToDdl {
    fn to_postgres_ddl(&self) -> String;
}

impl ToDdl for FieldType {
    fn to_postgres_ddl(&self) -> String {
        match self {
            FieldType::Int => "INTEGER".to_string(),
            FieldType::Text { max_length } => format!("VARCHAR({max_length})"),
            FieldType::Decimal { precision, scale } => format!("NUMERIC({precision}, {scale})"),
            FieldType::Timestamp => "TIMESTAMPTZ".to_string(),
        }
    }
}

/// `CREATE TABLE` statement for one entity type.
///
/// The key column is an identity column generated ALWAYS, so explicit keys
/// are rejected unless the key-override path is taken.
pub fn create_table_sql(descriptor: &EntityDescriptor) -> Result<String> {
    let key = descriptor.primary_key()?;
    let mut columns = Vec::with_capacity(descriptor.fields.len());

    for field in descriptor.fields {
        if field.name == key.name {
            columns.push(format!(
                "{} {} GENERATED ALWAYS AS IDENTITY PRIMARY KEY",
                field.name,
                field.field_type.to_postgres_ddl()
            ));
            continue;
        }

        let mut column = format!("{} {}", field.name, field.field_type.to_postgres_ddl());
        if !field.nullable {
            column.push_str(" NOT NULL");
        }
        if field.unique {
            column.push_str(" UNIQUE");
        }
        if let Some(fk) = descriptor.foreign_key(field.name) {
            let principal = fk.principal.descriptor();
            column.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE {}",
                principal.table,
                principal.primary_key()?.name,
                fk.on_delete.as_sql()
            ));
        }
        columns.push(column);
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        descriptor.table,
        columns.join(",\n    ")
    ))
}

/// Create every catalog table, principals first.
pub async fn create_tables(client: &Client) -> Result<()> {
    for kind in EntityKind::ALL {
        let descriptor = kind.descriptor();
        let sql = create_table_sql(descriptor)?;
        client
            .batch_execute(&sql)
            .await
            .with_context(|| format!("Failed to create table {}", descriptor.table))?;
    }
    info!("Created {} tables", EntityKind::ALL.len());
    Ok(())
}

/// Drop every catalog table, dependents first.
pub async fn drop_tables(client: &Client) -> Result<()> {
    for kind in EntityKind::ALL.into_iter().rev() {
        let table = kind.descriptor().table;
        client
            .batch_execute(&format!("DROP TABLE IF EXISTS {table} CASCADE"))
            .await
            .with_context(|| format!("Failed to drop table {table}"))?;
    }
    info!("Dropped {} tables", EntityKind::ALL.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_ddl() {
        assert_eq!(FieldType::Int.to_postgres_ddl(), "INTEGER");
        assert_eq!(FieldType::Text { max_length: 50 }.to_postgres_ddl(), "VARCHAR(50)");
        assert_eq!(
            FieldType::Decimal { precision: 18, scale: 2 }.to_postgres_ddl(),
            "NUMERIC(18, 2)"
        );
        assert_eq!(FieldType::Timestamp.to_postgres_ddl(), "TIMESTAMPTZ");
    }

    #[test]
    fn test_create_table_sql_for_line_items() {
        let sql = create_table_sql(EntityKind::OrderLineItem.descriptor()).unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS order_line_items ("));
        assert!(sql.contains("id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY"));
        assert!(sql.contains("order_id INTEGER NOT NULL REFERENCES orders (id) ON DELETE CASCADE"));
        assert!(sql.contains("product_id INTEGER NOT NULL REFERENCES products (id) ON DELETE RESTRICT"));
        assert!(sql.contains("unit_price NUMERIC(18, 2) NOT NULL"));
    }

    #[test]
    fn test_create_table_sql_marks_unique_columns() {
        let sql = create_table_sql(EntityKind::Customer.descriptor()).unwrap();
        assert!(sql.contains("email VARCHAR(200) NOT NULL UNIQUE"));
        assert!(sql.contains("name VARCHAR(200) NOT NULL,"));
    }
}
