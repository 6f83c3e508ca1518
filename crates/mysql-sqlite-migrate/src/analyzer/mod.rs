//! Schema introspection against a live source connection.
//!
//! Produces the ordered, dialect-neutral table list consumed by the SQL
//! converter and the migration engine. Engine-internal tables are
//! filtered out; any failure while enumerating tables aborts the whole
//! analysis. Row counting alone is non-fatal and degrades to zero.

mod mysql;
mod sqlite;

use std::collections::HashSet;

use tracing::info;

use crate::core::schema::{Index, Table};
use crate::drivers::DbConnection;
use crate::error::Result;

/// Introspects a source database into [`Table`] metadata.
pub struct SchemaAnalyzer;

impl SchemaAnalyzer {
    /// Analyze all user tables visible on the connection, in name order.
    pub async fn analyze(conn: &mut DbConnection) -> Result<Vec<Table>> {
        let tables = match conn {
            DbConnection::Mysql(conn) => mysql::analyze(conn).await?,
            DbConnection::Sqlite(conn) => sqlite::analyze(conn).await?,
        };

        info!("analyzed {} tables", tables.len());
        Ok(tables)
    }
}

/// Drop duplicate index rows, keyed by (name, column, position).
pub(crate) fn dedup_indexes(indexes: Vec<Index>) -> Vec<Index> {
    let mut seen = HashSet::new();
    indexes
        .into_iter()
        .filter(|ix| seen.insert((ix.name.clone(), ix.column.clone(), ix.ordinal_position)))
        .collect()
}

/// Mark columns covered by a single-column unique index.
pub(crate) fn apply_unique_flags(table: &mut Table) {
    let unique_singles: Vec<String> = {
        let mut by_name: std::collections::HashMap<&str, (bool, usize)> =
            std::collections::HashMap::new();
        for ix in &table.indexes {
            let entry = by_name.entry(ix.name.as_str()).or_insert((ix.unique, 0));
            entry.1 += 1;
        }
        table
            .indexes
            .iter()
            .filter(|ix| {
                by_name
                    .get(ix.name.as_str())
                    .map(|(unique, cols)| *unique && *cols == 1)
                    .unwrap_or(false)
            })
            .map(|ix| ix.column.clone())
            .collect()
    };

    for column in &mut table.columns {
        if unique_singles.iter().any(|c| c == &column.name) {
            column.unique = true;
        }
    }
}
