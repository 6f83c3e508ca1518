//! Dialect-neutral schema metadata for tables, columns, and indexes.
//!
//! These types are produced once per run by the schema analyzer and
//! consumed read-only by the SQL converter and the migration engine.

use serde::{Deserialize, Serialize};

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within its table).
    pub name: String,

    /// Logical data type name as reported by the source dialect
    /// (e.g., "varchar", "INTEGER").
    pub data_type: String,

    /// Declared size: character maximum length or numeric precision.
    pub size: i32,

    /// Numeric scale.
    pub decimal_digits: i32,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Default-value literal in the source dialect's syntax.
    pub default_value: Option<String>,

    /// Free-text column comment.
    pub comment: Option<String>,

    /// Whether the column is part of the primary key.
    pub primary_key: bool,

    /// Whether the column auto-increments.
    ///
    /// For SQLite sources this is a best-effort inference from the stored
    /// creation statement and can yield false negatives on non-canonical
    /// whitespace or casing.
    pub auto_increment: bool,

    /// Whether the column carries a single-column unique constraint.
    pub unique: bool,
}

/// Index metadata: one entry per (index, column) pair.
///
/// Primary-key-backed indexes are excluded; primary keys are modeled
/// solely via [`Column::primary_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Owning table name.
    pub table: String,

    /// Indexed column name.
    pub column: String,

    /// 1-based position of the column within a composite index.
    pub ordinal_position: i32,

    /// Whether the index is unique.
    pub unique: bool,
}

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table name (unique within a schema snapshot).
    pub name: String,

    /// Free-text table comment.
    pub comment: Option<String>,

    /// Columns in their source-reported order. The order is significant:
    /// it defines DDL column order and positional binding for inserts.
    pub columns: Vec<Column>,

    /// Non-primary-key indexes.
    pub indexes: Vec<Index>,

    /// Row count captured at analysis time. Advisory only: used for
    /// progress estimation, never for correctness.
    pub row_count: i64,
}

impl Table {
    /// Check if any column is part of the primary key.
    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }

    /// Primary key columns in table order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether the table had zero rows at analysis time.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}
