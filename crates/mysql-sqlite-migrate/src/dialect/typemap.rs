//! Data type mapping between MySQL and SQLite.
//!
//! Two fixed lookup tables cover the common integer/real/text/blob/
//! date-time/decimal families. Lookup is case-insensitive and strips any
//! parenthesized size suffix before matching. Unmapped types pass through
//! unchanged; mapping is total and never fails.

use std::collections::HashMap;

use crate::dialect::DbType;

/// Immutable type-mapping tables, constructed once and shared by
/// reference for the duration of a run.
#[derive(Debug, Clone)]
pub struct TypeMaps {
    sqlite_to_mysql: HashMap<&'static str, &'static str>,
    mysql_to_sqlite: HashMap<&'static str, &'static str>,
}

impl TypeMaps {
    pub fn new() -> Self {
        let sqlite_to_mysql = HashMap::from([
            ("INTEGER", "INT"),
            ("INT", "INT"),
            ("TINYINT", "TINYINT"),
            ("SMALLINT", "SMALLINT"),
            ("MEDIUMINT", "MEDIUMINT"),
            ("BIGINT", "BIGINT"),
            ("UNSIGNED BIG INT", "BIGINT UNSIGNED"),
            ("INT2", "SMALLINT"),
            ("INT8", "BIGINT"),
            ("TEXT", "TEXT"),
            ("CLOB", "LONGTEXT"),
            ("REAL", "DOUBLE"),
            ("DOUBLE", "DOUBLE"),
            ("DOUBLE PRECISION", "DOUBLE"),
            ("FLOAT", "FLOAT"),
            ("BLOB", "LONGBLOB"),
            ("NUMERIC", "DECIMAL"),
            ("DECIMAL", "DECIMAL"),
            ("BOOLEAN", "BOOLEAN"),
            ("VARCHAR", "VARCHAR"),
            ("VARYING CHARACTER", "VARCHAR"),
            ("NCHAR", "CHAR"),
            ("NATIVE CHARACTER", "CHAR"),
            ("NVARCHAR", "VARCHAR"),
            ("CHAR", "CHAR"),
            ("CHARACTER", "CHAR"),
            ("DATETIME", "DATETIME"),
            ("DATE", "DATE"),
            ("TIME", "TIME"),
            ("TIMESTAMP", "TIMESTAMP"),
        ]);

        let mysql_to_sqlite = HashMap::from([
            ("TINYINT", "INTEGER"),
            ("SMALLINT", "INTEGER"),
            ("MEDIUMINT", "INTEGER"),
            ("INT", "INTEGER"),
            ("INTEGER", "INTEGER"),
            ("BIGINT", "INTEGER"),
            ("BIT", "INTEGER"),
            ("BOOL", "INTEGER"),
            ("BOOLEAN", "INTEGER"),
            ("YEAR", "INTEGER"),
            ("FLOAT", "REAL"),
            ("DOUBLE", "REAL"),
            ("REAL", "REAL"),
            ("DECIMAL", "NUMERIC"),
            ("NUMERIC", "NUMERIC"),
            ("CHAR", "TEXT"),
            ("VARCHAR", "TEXT"),
            ("TINYTEXT", "TEXT"),
            ("TEXT", "TEXT"),
            ("MEDIUMTEXT", "TEXT"),
            ("LONGTEXT", "TEXT"),
            ("ENUM", "TEXT"),
            ("SET", "TEXT"),
            ("JSON", "TEXT"),
            ("BINARY", "BLOB"),
            ("VARBINARY", "BLOB"),
            ("TINYBLOB", "BLOB"),
            ("BLOB", "BLOB"),
            ("MEDIUMBLOB", "BLOB"),
            ("LONGBLOB", "BLOB"),
            ("DATE", "TEXT"),
            ("TIME", "TEXT"),
            ("DATETIME", "TEXT"),
            ("TIMESTAMP", "TEXT"),
        ]);

        Self {
            sqlite_to_mysql,
            mysql_to_sqlite,
        }
    }

    /// Map a source type name to the target dialect's type name.
    ///
    /// The size/precision suffix is stripped for the lookup; unknown types
    /// are returned unchanged.
    pub fn map_type(&self, source_type: &str, target: DbType) -> String {
        if source_type.is_empty() {
            return "TEXT".to_string();
        }

        let base = strip_size_suffix(&source_type.to_uppercase());

        let table = match target {
            DbType::Mysql => &self.sqlite_to_mysql,
            DbType::Sqlite => &self.mysql_to_sqlite,
        };

        table
            .get(base.as_str())
            .map(|t| t.to_string())
            .unwrap_or_else(|| source_type.to_string())
    }

    /// Whether the mapped type conventionally carries a size parameter
    /// in the target dialect.
    pub fn needs_size(&self, mapped_type: &str, target: DbType) -> bool {
        if !target.uses_declared_sizes() {
            return false;
        }
        matches!(mapped_type, "VARCHAR" | "CHAR" | "DECIMAL" | "NUMERIC")
    }
}

impl Default for TypeMaps {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove any parenthesized suffix, e.g. `VARCHAR(255)` -> `VARCHAR`.
fn strip_size_suffix(type_name: &str) -> String {
    match type_name.find('(') {
        Some(open) => match type_name[open..].find(')') {
            Some(close) => {
                let mut s = String::with_capacity(type_name.len());
                s.push_str(type_name[..open].trim_end());
                s.push_str(type_name[open + close + 1..].trim_end());
                s
            }
            None => type_name[..open].trim_end().to_string(),
        },
        None => type_name.to_string(),
    }
}
