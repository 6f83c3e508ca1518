//! SQLite row decoding and parameter binding.
//!
//! SQLite columns are dynamically typed, so decoding follows the value's
//! runtime storage class (INTEGER, REAL, TEXT, BLOB) rather than the
//! declared column type. Temporal values surface as the text the engine
//! stores them as.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Row as _, TypeInfo as _, ValueRef as _};

use crate::core::schema::Column;
use crate::core::value::{Row, Value};

/// Decode a SQLite row into [`Value`]s, positionally, in column order.
pub(crate) fn decode_row(row: &SqliteRow, columns: &[Column]) -> Row {
    columns
        .iter()
        .enumerate()
        .map(|(i, _col)| {
            let raw = match row.try_get_raw(i) {
                Ok(raw) => raw,
                Err(_) => return Value::Null,
            };
            if raw.is_null() {
                return Value::Null;
            }

            match raw.type_info().name() {
                "INTEGER" => row.try_get::<i64, _>(i).map(Value::Int).unwrap_or(Value::Null),
                "REAL" => row.try_get::<f64, _>(i).map(Value::Real).unwrap_or(Value::Null),
                "BLOB" => row
                    .try_get::<Vec<u8>, _>(i)
                    .map(Value::Bytes)
                    .unwrap_or(Value::Null),
                _ => row
                    .try_get::<String, _>(i)
                    .map(Value::Text)
                    .unwrap_or(Value::Null),
            }
        })
        .collect()
}

/// Bind one [`Value`] to a SQLite query as the next positional parameter.
///
/// Decimals are bound as their text rendering; SQLite's NUMERIC affinity
/// converts clean numeric text on storage.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Real(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(v.to_string()),
        Value::Text(v) => query.bind(v.clone()),
        Value::Bytes(v) => query.bind(v.clone()),
        Value::Date(v) => query.bind(v.to_string()),
        Value::Time(v) => query.bind(v.to_string()),
        Value::DateTime(v) => query.bind(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
    }
}
