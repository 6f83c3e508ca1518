//! SQL dialect identities and syntax rules.
//!
//! The two supported engines differ in identifier quoting, auto-increment
//! syntax, internal-table naming, and how temporal values are stored.
//! Everything dialect-specific that is not a type mapping lives here;
//! type mappings are in [`typemap`].

pub mod typemap;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A supported database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Mysql,
    Sqlite,
}

impl DbType {
    /// Get the dialect identifier.
    pub fn name(&self) -> &'static str {
        match self {
            DbType::Mysql => "mysql",
            DbType::Sqlite => "sqlite",
        }
    }

    /// Classify a connection URL by its scheme prefix.
    ///
    /// Returns `None` when the URL matches neither supported dialect;
    /// callers must abort rather than guess.
    pub fn from_url(url: &str) -> Option<DbType> {
        if url.starts_with("mysql://") {
            Some(DbType::Mysql)
        } else if url.starts_with("sqlite:") {
            Some(DbType::Sqlite)
        } else {
            None
        }
    }

    /// Quote an identifier (table name, column name, etc.).
    ///
    /// - MySQL: `` `identifier` `` (embedded backticks doubled)
    /// - SQLite: `"identifier"` (embedded double quotes doubled)
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            DbType::Mysql => format!("`{}`", name.replace('`', "``")),
            DbType::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Whether a table name belongs to the engine itself and must be
    /// excluded from analysis.
    pub fn is_internal_table(&self, table: &str) -> bool {
        match self {
            DbType::Sqlite => table.starts_with("sqlite_"),
            DbType::Mysql => {
                table.starts_with("information_schema")
                    || table.starts_with("performance_schema")
                    || table.starts_with("mysql")
                    || table.starts_with("sys")
            }
        }
    }

    /// Whether column `COMMENT` clauses are part of this dialect's DDL.
    pub fn supports_column_comments(&self) -> bool {
        matches!(self, DbType::Mysql)
    }

    /// Engine-specific options appended after the closing paren of
    /// `CREATE TABLE`, or an empty string.
    pub fn table_options(&self) -> &'static str {
        match self {
            DbType::Mysql => " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci",
            DbType::Sqlite => "",
        }
    }

    /// Whether this dialect stores date/time values as text, requiring
    /// temporal row values to be stringified on insert.
    pub fn stores_temporal_as_text(&self) -> bool {
        matches!(self, DbType::Sqlite)
    }

    /// Whether declared sizes on character/decimal types are meaningful
    /// in this dialect's DDL.
    pub fn uses_declared_sizes(&self) -> bool {
        matches!(self, DbType::Mysql)
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
