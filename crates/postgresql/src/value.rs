//! Conversion between `sync_core::Value` and PostgreSQL column values.
//!
//! | FieldType | PostgreSQL      | Rust             |
//! |-----------|-----------------|------------------|
//! | Int       | INTEGER         | `i32`            |
//! | Text      | VARCHAR(n)      | `String`         |
//! | Decimal   | NUMERIC(p, s)   | `Decimal`        |
//! | Timestamp | TIMESTAMPTZ     | `DateTime<Utc>`  |

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sync_core::{FieldDef, FieldType, Value};
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

/// Owned query parameter. `Send` so parameter lists can be held across
/// awaits inside store futures.
pub type SqlParam = Box<dyn ToSql + Sync + Send>;

/// Read one column of a PostgreSQL row as a `Value`.
pub fn read_value(row: &Row, field: &FieldDef) -> Result<Value> {
    let name = field.name;
    let value = match field.field_type {
        FieldType::Int => Value::from(
            row.try_get::<_, Option<i32>>(name)
                .with_context(|| format!("Failed to read integer column {name}"))?,
        ),
        FieldType::Text { .. } => Value::from(
            row.try_get::<_, Option<String>>(name)
                .with_context(|| format!("Failed to read text column {name}"))?,
        ),
        FieldType::Decimal { .. } => Value::from(
            row.try_get::<_, Option<Decimal>>(name)
                .with_context(|| format!("Failed to read numeric column {name}"))?,
        ),
        FieldType::Timestamp => Value::from(
            row.try_get::<_, Option<DateTime<Utc>>>(name)
                .with_context(|| format!("Failed to read timestamp column {name}"))?,
        ),
    };
    Ok(value)
}

/// Convert a `Value` into a query parameter typed after the field.
///
/// NULL is sent as a typed `None` so PostgreSQL can infer the parameter type.
pub fn to_sql_param(field: &FieldDef, value: &Value) -> Result<SqlParam> {
    let param: SqlParam = match (field.field_type, value) {
        (FieldType::Int, Value::Null) => Box::new(None::<i32>),
        (FieldType::Text { .. }, Value::Null) => Box::new(None::<String>),
        (FieldType::Decimal { .. }, Value::Null) => Box::new(None::<Decimal>),
        (FieldType::Timestamp, Value::Null) => Box::new(None::<DateTime<Utc>>),
        (FieldType::Int, Value::Int(i)) => Box::new(*i),
        (FieldType::Text { .. }, Value::Text(s)) => Box::new(s.clone()),
        (FieldType::Decimal { .. }, Value::Decimal(d)) => Box::new(*d),
        (FieldType::Timestamp, Value::Timestamp(ts)) => Box::new(*ts),
        (field_type, value) => bail!(
            "Value {value:?} does not fit column {} of type {field_type:?}",
            field.name
        ),
    };
    Ok(param)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sql_param_accepts_matching_types() {
        assert!(to_sql_param(&FieldDef::int("id"), &Value::Int(1)).is_ok());
        assert!(to_sql_param(&FieldDef::text("name", 10), &Value::from("x")).is_ok());
        assert!(to_sql_param(&FieldDef::decimal("price", 18, 2), &Value::Decimal(Decimal::new(1050, 2))).is_ok());
        assert!(to_sql_param(&FieldDef::timestamp("at"), &Value::Timestamp(Utc::now())).is_ok());
    }

    #[test]
    fn test_to_sql_param_accepts_null() {
        assert!(to_sql_param(&FieldDef::int("parent_id").nullable(), &Value::Null).is_ok());
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_params_can_cross_await_points() {
        let params = vec![
            to_sql_param(&FieldDef::int("id"), &Value::Int(1)).unwrap(),
            to_sql_param(&FieldDef::text("name", 10), &Value::Null).unwrap(),
        ];
        assert_send(&params);
    }

    #[test]
    fn test_to_sql_param_rejects_mismatch() {
        let err = to_sql_param(&FieldDef::int("quantity"), &Value::from("three"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("quantity"));
    }
}
