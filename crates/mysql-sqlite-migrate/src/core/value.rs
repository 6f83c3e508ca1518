//! Row values moved between dialects, plus per-target normalization.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::dialect::DbType;

/// A single column value read from a source row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Normalize a value for insertion into the target dialect.
    ///
    /// Booleans become 0/1 integers for both targets. Temporal and
    /// decimal values are stringified for the dialect that stores them
    /// as text; everything else passes through.
    pub fn normalize_for(self, target: DbType) -> Value {
        match self {
            Value::Bool(b) => Value::Int(i64::from(b)),
            Value::Date(d) if target.stores_temporal_as_text() => Value::Text(d.to_string()),
            Value::Time(t) if target.stores_temporal_as_text() => Value::Text(t.to_string()),
            Value::DateTime(dt) if target.stores_temporal_as_text() => {
                Value::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            Value::Decimal(d) if target == DbType::Sqlite => Value::Text(d.to_string()),
            other => other,
        }
    }
}

/// One decoded source row, in table-column order.
pub type Row = Vec<Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_bool_normalizes_to_integer_for_both_targets() {
        assert_eq!(Value::Bool(true).normalize_for(DbType::Mysql), Value::Int(1));
        assert_eq!(Value::Bool(false).normalize_for(DbType::Sqlite), Value::Int(0));
    }

    #[test]
    fn test_temporal_values_stringified_for_sqlite_only() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let dt = date.and_hms_opt(3, 4, 5).unwrap();

        assert_eq!(
            Value::Date(date).normalize_for(DbType::Sqlite),
            Value::Text("2024-01-02".to_string())
        );
        assert_eq!(
            Value::DateTime(dt).normalize_for(DbType::Sqlite),
            Value::Text("2024-01-02 03:04:05".to_string())
        );
        assert_eq!(
            Value::DateTime(dt).normalize_for(DbType::Mysql),
            Value::DateTime(dt)
        );
    }

    #[test]
    fn test_decimal_stringified_for_sqlite() {
        let d = Decimal::from_str("12.50").unwrap();
        assert_eq!(
            Value::Decimal(d).normalize_for(DbType::Sqlite),
            Value::Text("12.50".to_string())
        );
        assert_eq!(Value::Decimal(d).normalize_for(DbType::Mysql), Value::Decimal(d));
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(Value::Null.normalize_for(DbType::Sqlite), Value::Null);
        assert_eq!(
            Value::Text("x".to_string()).normalize_for(DbType::Mysql),
            Value::Text("x".to_string())
        );
        assert_eq!(
            Value::Bytes(vec![1, 2]).normalize_for(DbType::Sqlite),
            Value::Bytes(vec![1, 2])
        );
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }
}
