//! MySQL schema introspection via `information_schema`.

use sqlx::{MySqlConnection, Row as _};
use tracing::{debug, warn};

use crate::convert::count_sql;
use crate::core::schema::{Column, Index, Table};
use crate::dialect::DbType;
use crate::error::{MigrateError, Result};

use super::{apply_unique_flags, dedup_indexes};

pub(crate) async fn analyze(conn: &mut MySqlConnection) -> Result<Vec<Table>> {
    let query = r#"
        SELECT TABLE_NAME, TABLE_COMMENT
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
    "#;

    let rows = sqlx::query(query)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| MigrateError::SchemaAnalysis(format!("listing mysql tables: {}", e)))?;

    let mut tables = Vec::new();

    for row in rows {
        let name: String = row
            .try_get("TABLE_NAME")
            .map_err(|e| MigrateError::SchemaAnalysis(format!("reading table list: {}", e)))?;

        if DbType::Mysql.is_internal_table(&name) {
            continue;
        }

        let comment: Option<String> = row
            .try_get::<String, _>("TABLE_COMMENT")
            .ok()
            .filter(|c| !c.is_empty());

        let primary_key = load_primary_key(conn, &name).await?;
        let columns = load_columns(conn, &name, &primary_key).await?;
        let indexes = dedup_indexes(load_indexes(conn, &name).await?);
        let row_count = load_row_count(conn, &name).await;

        let mut table = Table {
            name,
            comment,
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

/// Primary key column names in key order.
async fn load_primary_key(conn: &mut MySqlConnection, table: &str) -> Result<Vec<String>> {
    let query = r#"
        SELECT COLUMN_NAME
        FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY'
        ORDER BY ORDINAL_POSITION
    "#;

    let rows = sqlx::query(query)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            MigrateError::SchemaAnalysis(format!("loading primary key for {}: {}", table, e))
        })?;

    rows.iter()
        .map(|row| {
            row.try_get("COLUMN_NAME").map_err(|e| {
                MigrateError::SchemaAnalysis(format!("reading primary key for {}: {}", table, e))
            })
        })
        .collect()
}

async fn load_columns(
    conn: &mut MySqlConnection,
    table: &str,
    primary_key: &[String],
) -> Result<Vec<Column>> {
    let query = r#"
        SELECT
            COLUMN_NAME,
            DATA_TYPE,
            CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, 0) AS SIGNED) AS declared_size,
            CAST(COALESCE(NUMERIC_SCALE, 0) AS SIGNED) AS decimal_digits,
            CAST(IF(IS_NULLABLE = 'YES', 1, 0) AS SIGNED) AS is_nullable,
            COLUMN_DEFAULT,
            COLUMN_COMMENT,
            CAST(IF(EXTRA LIKE '%auto_increment%', 1, 0) AS SIGNED) AS is_auto_increment
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    "#;

    let rows = sqlx::query(query)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            MigrateError::SchemaAnalysis(format!("loading columns for {}: {}", table, e))
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let read_err = |e: sqlx::Error| {
            MigrateError::SchemaAnalysis(format!("reading columns for {}: {}", table, e))
        };

        let name: String = row.try_get("COLUMN_NAME").map_err(read_err)?;
        // Lengths beyond i32 (LONGTEXT and friends) carry no useful
        // declared size; the mapped type is unbounded anyway.
        let size: i64 = row.try_get("declared_size").map_err(read_err)?;
        let size = if size > i32::MAX as i64 { 0 } else { size as i32 };

        columns.push(Column {
            primary_key: primary_key.contains(&name),
            name,
            data_type: row.try_get("DATA_TYPE").map_err(read_err)?,
            size,
            decimal_digits: row.try_get::<i64, _>("decimal_digits").map_err(read_err)? as i32,
            nullable: row.try_get::<i64, _>("is_nullable").map_err(read_err)? == 1,
            default_value: row.try_get("COLUMN_DEFAULT").map_err(read_err)?,
            comment: row
                .try_get::<String, _>("COLUMN_COMMENT")
                .ok()
                .filter(|c| !c.is_empty()),
            auto_increment: row.try_get::<i64, _>("is_auto_increment").map_err(read_err)? == 1,
            unique: false,
        });
    }

    Ok(columns)
}

/// Non-primary-key index rows, one per (index, column).
async fn load_indexes(conn: &mut MySqlConnection, table: &str) -> Result<Vec<Index>> {
    let query = r#"
        SELECT
            INDEX_NAME,
            COLUMN_NAME,
            CAST(SEQ_IN_INDEX AS SIGNED) AS seq_in_index,
            CAST(IF(NON_UNIQUE = 0, 1, 0) AS SIGNED) AS is_unique
        FROM INFORMATION_SCHEMA.STATISTICS
        WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND INDEX_NAME <> 'PRIMARY'
        ORDER BY INDEX_NAME, SEQ_IN_INDEX
    "#;

    let rows = sqlx::query(query)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            MigrateError::SchemaAnalysis(format!("loading indexes for {}: {}", table, e))
        })?;

    let mut indexes = Vec::with_capacity(rows.len());
    for row in rows {
        let read_err = |e: sqlx::Error| {
            MigrateError::SchemaAnalysis(format!("reading indexes for {}: {}", table, e))
        };

        indexes.push(Index {
            name: row.try_get("INDEX_NAME").map_err(read_err)?,
            table: table.to_string(),
            column: row.try_get("COLUMN_NAME").map_err(read_err)?,
            ordinal_position: row.try_get::<i64, _>("seq_in_index").map_err(read_err)? as i32,
            unique: row.try_get::<i64, _>("is_unique").map_err(read_err)? == 1,
        });
    }

    Ok(indexes)
}

/// Advisory row count; failures degrade to zero.
async fn load_row_count(conn: &mut MySqlConnection, table: &str) -> i64 {
    let query = count_sql(table, DbType::Mysql);

    match sqlx::query(&query).fetch_one(&mut *conn).await {
        Ok(row) => row.try_get::<i64, _>(0).unwrap_or(0),
        Err(e) => {
            warn!("row count failed for {}: {}", table, e);
            0
        }
    }
}
