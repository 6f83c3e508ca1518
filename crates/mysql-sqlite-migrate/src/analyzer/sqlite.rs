//! SQLite schema introspection via `sqlite_master` and table pragmas.

use sqlx::{Row as _, SqliteConnection};
use tracing::{debug, warn};

use crate::convert::count_sql;
use crate::core::schema::{Column, Index, Table};
use crate::dialect::DbType;
use crate::error::{MigrateError, Result};

use super::{apply_unique_flags, dedup_indexes};

pub(crate) async fn analyze(conn: &mut SqliteConnection) -> Result<Vec<Table>> {
    let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| MigrateError::SchemaAnalysis(format!("listing sqlite tables: {}", e)))?;

    let mut tables = Vec::new();

    for row in rows {
        let name: String = row
            .try_get("name")
            .map_err(|e| MigrateError::SchemaAnalysis(format!("reading table list: {}", e)))?;

        if DbType::Sqlite.is_internal_table(&name) {
            continue;
        }

        let create_sql = load_create_sql(conn, &name).await?;
        let columns = load_columns(conn, &name, create_sql.as_deref()).await?;
        let indexes = dedup_indexes(load_indexes(conn, &name).await?);
        let row_count = load_row_count(conn, &name).await;

        let mut table = Table {
            name,
            comment: None,
            columns,
            indexes,
            row_count,
        };
        apply_unique_flags(&mut table);

        debug!(
            "analyzed table {} ({} columns, {} rows)",
            table.name,
            table.columns.len(),
            table.row_count
        );
        tables.push(table);
    }

    Ok(tables)
}

/// The stored `CREATE TABLE` text, used for auto-increment inference.
async fn load_create_sql(conn: &mut SqliteConnection, table: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
        .bind(table)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            MigrateError::SchemaAnalysis(format!("reading creation statement for {}: {}", table, e))
        })?;

    Ok(row.and_then(|r| r.try_get::<Option<String>, _>("sql").ok().flatten()))
}

async fn load_columns(
    conn: &mut SqliteConnection,
    table: &str,
    create_sql: Option<&str>,
) -> Result<Vec<Column>> {
    let pragma = format!("PRAGMA table_info({})", DbType::Sqlite.quote_ident(table));
    let rows = sqlx::query(&pragma)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            MigrateError::SchemaAnalysis(format!("loading columns for {}: {}", table, e))
        })?;

    let read_err = |e: sqlx::Error| {
        MigrateError::SchemaAnalysis(format!("reading columns for {}: {}", table, e))
    };

    // Primary key membership comes out of the same pragma; collect it
    // up front so columns can be annotated as they are built.
    let mut primary_key: Vec<(i64, String)> = Vec::new();
    for row in &rows {
        let pk_pos: i64 = row.try_get("pk").map_err(read_err)?;
        if pk_pos > 0 {
            primary_key.push((pk_pos, row.try_get("name").map_err(read_err)?));
        }
    }
    primary_key.sort();
    let primary_key: Vec<String> = primary_key.into_iter().map(|(_, name)| name).collect();

    let create_upper = create_sql.map(str::to_uppercase);

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("name").map_err(read_err)?;
        let declared: String = row.try_get("type").map_err(read_err)?;
        let (data_type, size, decimal_digits) = split_declared_type(&declared);

        columns.push(Column {
            primary_key: primary_key.contains(&name),
            auto_increment: is_auto_increment(create_upper.as_deref(), &name),
            data_type,
            size,
            decimal_digits,
            nullable: row.try_get::<i64, _>("notnull").map_err(read_err)? == 0,
            default_value: row
                .try_get::<Option<String>, _>("dflt_value")
                .map_err(read_err)?
                .map(|v| unquote_default(&v)),
            comment: None,
            unique: false,
            name,
        });
    }

    Ok(columns)
}

/// Infer auto-increment by searching the stored creation statement for
/// the column name adjacent to the integer-primary-key-autoincrement
/// marker.
///
/// Best effort only: non-canonical whitespace, quoting, or casing in the
/// creation statement produces a false negative.
fn is_auto_increment(create_sql_upper: Option<&str>, column: &str) -> bool {
    match create_sql_upper {
        Some(sql) => sql.contains(&format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            column.to_uppercase()
        )),
        None => false,
    }
}

/// Split a declared type like `VARCHAR(255)` or `DECIMAL(10,2)` into the
/// base type name, size, and decimal digits.
fn split_declared_type(declared: &str) -> (String, i32, i32) {
    let declared = declared.trim();
    let Some(open) = declared.find('(') else {
        return (declared.to_string(), 0, 0);
    };
    let Some(close) = declared[open..].find(')') else {
        return (declared.to_string(), 0, 0);
    };

    let base = declared[..open].trim_end().to_string();
    let args = &declared[open + 1..open + close];
    let mut parts = args.splitn(2, ',');
    let size = parts
        .next()
        .and_then(|p| p.trim().parse::<i32>().ok())
        .unwrap_or(0);
    let digits = parts
        .next()
        .and_then(|p| p.trim().parse::<i32>().ok())
        .unwrap_or(0);

    (base, size, digits)
}

/// Strip the single quotes SQLite keeps around string defaults so the
/// model holds the bare literal text.
fn unquote_default(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed[1..trimmed.len() - 1].replace("''", "'")
    } else {
        trimmed.to_string()
    }
}

/// Non-primary-key index rows from `index_list` / `index_info`.
async fn load_indexes(conn: &mut SqliteConnection, table: &str) -> Result<Vec<Index>> {
    let pragma = format!("PRAGMA index_list({})", DbType::Sqlite.quote_ident(table));
    let rows = sqlx::query(&pragma)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            MigrateError::SchemaAnalysis(format!("loading indexes for {}: {}", table, e))
        })?;

    let read_err = |e: sqlx::Error| {
        MigrateError::SchemaAnalysis(format!("reading indexes for {}: {}", table, e))
    };

    let mut indexes = Vec::new();
    for row in rows {
        let origin: String = row.try_get("origin").map_err(read_err)?;
        if origin == "pk" {
            continue;
        }

        let index_name: String = row.try_get("name").map_err(read_err)?;
        let unique = row.try_get::<i64, _>("unique").map_err(read_err)? == 1;

        let pragma = format!(
            "PRAGMA index_info({})",
            DbType::Sqlite.quote_ident(&index_name)
        );
        let info_rows = sqlx::query(&pragma)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                MigrateError::SchemaAnalysis(format!(
                    "loading index {} for {}: {}",
                    index_name, table, e
                ))
            })?;

        for info in info_rows {
            // Expression index members report no column name; skip them.
            let Some(column) = info
                .try_get::<Option<String>, _>("name")
                .map_err(read_err)?
            else {
                continue;
            };

            indexes.push(Index {
                name: index_name.clone(),
                table: table.to_string(),
                column,
                ordinal_position: info.try_get::<i64, _>("seqno").map_err(read_err)? as i32 + 1,
                unique,
            });
        }
    }

    Ok(indexes)
}

/// Advisory row count; failures degrade to zero.
async fn load_row_count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let query = count_sql(table, DbType::Sqlite);

    match sqlx::query(&query).fetch_one(&mut *conn).await {
        Ok(row) => row.try_get::<i64, _>(0).unwrap_or(0),
        Err(e) => {
            warn!("row count failed for {}: {}", table, e);
            0
        }
    }
}
