//! SQL synthesis from the schema model.
//!
//! Pure, stateless text generation: no connection access, no failure
//! modes. The same [`Table`] value always yields byte-identical SQL.

use crate::core::schema::{Column, Table};
use crate::dialect::typemap::TypeMaps;
use crate::dialect::DbType;

/// Builds DDL and DML text for a target dialect from schema metadata.
pub struct SqlConverter<'a> {
    maps: &'a TypeMaps,
}

impl<'a> SqlConverter<'a> {
    pub fn new(maps: &'a TypeMaps) -> Self {
        Self { maps }
    }

    /// Generate a `CREATE TABLE` statement for the target dialect.
    pub fn create_table_sql(&self, table: &Table, target: DbType) -> String {
        let mut clauses: Vec<String> = Vec::with_capacity(table.columns.len() + 1);
        let mut pk_folded = false;

        for column in &table.columns {
            let (clause, folded) = self.column_definition(column, target);
            pk_folded |= folded;
            clauses.push(clause);
        }

        // A table-level PRIMARY KEY clause is redundant once a column
        // clause already carries PRIMARY KEY AUTOINCREMENT.
        if table.has_primary_key() && !pk_folded {
            let cols: Vec<String> = table
                .primary_key_columns()
                .map(|c| target.quote_ident(&c.name))
                .collect();
            clauses.push(format!("PRIMARY KEY ({})", cols.join(", ")));
        }

        format!(
            "CREATE TABLE {} (\n  {}\n){}",
            target.quote_ident(&table.name),
            clauses.join(",\n  "),
            target.table_options()
        )
    }

    /// Generate a single column clause: quoted name, mapped type,
    /// nullability, auto-increment, default, comment.
    ///
    /// Returns the clause and whether the primary key was folded into it.
    fn column_definition(&self, column: &Column, target: DbType) -> (String, bool) {
        let mut sql = target.quote_ident(&column.name);
        let mut pk_folded = false;

        sql.push(' ');
        sql.push_str(&self.convert_data_type(&column.data_type, column.size, target));

        if !column.nullable {
            sql.push_str(" NOT NULL");
        }

        if column.auto_increment {
            match target {
                DbType::Mysql => sql.push_str(" AUTO_INCREMENT"),
                DbType::Sqlite => {
                    // AUTOINCREMENT is only valid on the integer primary key.
                    if column.primary_key {
                        sql.push_str(" PRIMARY KEY AUTOINCREMENT");
                        pk_folded = true;
                    }
                }
            }
        }

        if let Some(default) = column.default_value.as_deref() {
            if !default.is_empty() {
                sql.push_str(" DEFAULT ");
                sql.push_str(&convert_default_value(default));
            }
        }

        if let Some(comment) = column.comment.as_deref() {
            if !comment.is_empty() && target.supports_column_comments() {
                sql.push_str(&format!(" COMMENT '{}'", escape_string(comment)));
            }
        }

        (sql, pk_folded)
    }

    /// Map a source data type to the target dialect, reattaching the
    /// declared size where the target type conventionally carries one.
    pub fn convert_data_type(&self, source_type: &str, size: i32, target: DbType) -> String {
        let mapped = self.maps.map_type(source_type, target);

        if size > 0 && self.maps.needs_size(&mapped, target) {
            format!("{}({})", mapped, size)
        } else {
            mapped
        }
    }

    /// Generate the `INSERT` statement template with one positional
    /// placeholder per column, in table-column order.
    ///
    /// Column order here must match [`select_sql`](Self::select_sql):
    /// it is the contract binding analysis order to row-value binding.
    pub fn insert_sql(&self, table: &Table, target: DbType) -> String {
        let cols: Vec<String> = table
            .columns
            .iter()
            .map(|c| target.quote_ident(&c.name))
            .collect();
        let placeholders: Vec<&str> = table.columns.iter().map(|_| "?").collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            target.quote_ident(&table.name),
            cols.join(", "),
            placeholders.join(", ")
        )
    }

    /// Generate the full-table `SELECT` used to stream source rows.
    pub fn select_sql(&self, table: &Table, source: DbType) -> String {
        let cols: Vec<String> = table
            .columns
            .iter()
            .map(|c| source.quote_ident(&c.name))
            .collect();

        format!(
            "SELECT {} FROM {}",
            cols.join(", "),
            source.quote_ident(&table.name)
        )
    }

    /// Generate a `DROP TABLE IF EXISTS` statement.
    pub fn drop_table_sql(&self, table_name: &str, target: DbType) -> String {
        format!("DROP TABLE IF EXISTS {}", target.quote_ident(table_name))
    }
}

/// Generate the `SELECT COUNT(*)` used for row counting.
pub fn count_sql(table_name: &str, dialect: DbType) -> String {
    format!("SELECT COUNT(*) FROM {}", dialect.quote_ident(table_name))
}

/// Convert a default-value literal to the target syntax.
///
/// Precedence: current-timestamp keyword forms pass through as the
/// keyword; values that parse as a signed decimal number pass through
/// unquoted; boolean-ish literals normalize to 1/0; everything else
/// becomes a single-quoted string literal.
pub fn convert_default_value(default: &str) -> String {
    let upper = default.to_uppercase();
    if upper == "CURRENT_TIMESTAMP" || upper == "NOW()" {
        return "CURRENT_TIMESTAMP".to_string();
    }

    if is_decimal_literal(default) {
        return default.to_string();
    }

    if upper == "TRUE" {
        return "1".to_string();
    }
    if upper == "FALSE" {
        return "0".to_string();
    }

    format!("'{}'", escape_string(default))
}

/// Match an optionally signed decimal number: `-?\d+(\.\d+)?`.
fn is_decimal_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() {
        return false;
    }

    match digits.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && !frac.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => digits.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// Escape a string for inclusion in a single-quoted SQL literal.
fn escape_string(s: &str) -> String {
    s.replace('\'', "''").replace('\\', "\\\\")
}
