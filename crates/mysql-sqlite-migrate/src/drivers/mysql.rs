//! MySQL row decoding and parameter binding.
//!
//! Decoding is driven by the column's reported data type; a value that
//! fails to decode as its expected Rust type degrades to NULL rather
//! than aborting the stream.

use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Row as _, ValueRef as _};

use crate::core::schema::Column;
use crate::core::value::{Row, Value};

/// Decode a MySQL row into [`Value`]s, positionally, in column order.
pub(crate) fn decode_row(row: &MySqlRow, columns: &[Column]) -> Row {
    columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let is_null = row.try_get_raw(i).map(|v| v.is_null()).unwrap_or(true);
            if is_null {
                return Value::Null;
            }

            match col.data_type.to_lowercase().as_str() {
                "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "year" => {
                    row.try_get::<i64, _>(i).map(Value::Int).unwrap_or(Value::Null)
                }

                "bit" | "bool" | "boolean" => row
                    .try_get::<bool, _>(i)
                    .map(Value::Bool)
                    .unwrap_or(Value::Null),

                "float" => row
                    .try_get::<f32, _>(i)
                    .map(|v| Value::Real(v as f64))
                    .unwrap_or(Value::Null),
                "double" | "real" => row
                    .try_get::<f64, _>(i)
                    .map(Value::Real)
                    .unwrap_or(Value::Null),

                "decimal" | "numeric" => row
                    .try_get::<rust_decimal::Decimal, _>(i)
                    .map(Value::Decimal)
                    .unwrap_or(Value::Null),

                "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum"
                | "set" | "json" => row
                    .try_get::<String, _>(i)
                    .map(Value::Text)
                    .unwrap_or(Value::Null),

                "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => row
                    .try_get::<Vec<u8>, _>(i)
                    .map(Value::Bytes)
                    .unwrap_or(Value::Null),

                "date" => row
                    .try_get::<chrono::NaiveDate, _>(i)
                    .map(Value::Date)
                    .unwrap_or(Value::Null),
                "time" => row
                    .try_get::<chrono::NaiveTime, _>(i)
                    .map(Value::Time)
                    .unwrap_or(Value::Null),
                "datetime" | "timestamp" => row
                    .try_get::<chrono::NaiveDateTime, _>(i)
                    .map(Value::DateTime)
                    .unwrap_or(Value::Null),

                // Extension types fall back to their string rendering.
                _ => row
                    .try_get::<String, _>(i)
                    .map(Value::Text)
                    .unwrap_or(Value::Null),
            }
        })
        .collect()
}

/// Bind one [`Value`] to a MySQL query as the next positional parameter.
pub(crate) fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Real(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
        Value::Bytes(v) => query.bind(v.clone()),
        Value::Date(v) => query.bind(*v),
        Value::Time(v) => query.bind(*v),
        Value::DateTime(v) => query.bind(*v),
    }
}
