//! Database connection handling with static dispatch over the two
//! supported engines.
//!
//! [`DbConnection`] wraps a live sqlx connection. Connection acquisition
//! itself (credentials, URLs, file paths) belongs to the caller; the
//! migration core only needs the open handle and its dialect identity.

pub mod mysql;
pub mod sqlite;

use std::str::FromStr;

use futures::stream::{BoxStream, StreamExt};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, MySqlConnection, Row as _, SqliteConnection};
use tracing::info;

use crate::core::schema::Column;
use crate::core::value::Row;
use crate::dialect::DbType;
use crate::error::{MigrateError, Result};

/// An open connection to one of the supported engines.
pub enum DbConnection {
    Mysql(MySqlConnection),
    Sqlite(SqliteConnection),
}

impl DbConnection {
    /// Open a connection, classifying the dialect from the URL prefix.
    ///
    /// SQLite databases are created if missing and opened with foreign
    /// keys enabled. Unrecognized URLs are rejected, never guessed at.
    pub async fn connect(url: &str) -> Result<Self> {
        match DbType::from_url(url) {
            Some(DbType::Mysql) => {
                let conn = MySqlConnection::connect(url).await?;
                info!("connected to mysql database");
                Ok(DbConnection::Mysql(conn))
            }
            Some(DbType::Sqlite) => {
                let options = SqliteConnectOptions::from_str(url)?
                    .create_if_missing(true)
                    .foreign_keys(true);
                let conn = options.connect().await?;
                info!("connected to sqlite database");
                Ok(DbConnection::Sqlite(conn))
            }
            None => Err(MigrateError::UnknownDialect(url.to_string())),
        }
    }

    /// The dialect this connection belongs to.
    pub fn db_type(&self) -> DbType {
        match self {
            DbConnection::Mysql(_) => DbType::Mysql,
            DbConnection::Sqlite(_) => DbType::Sqlite,
        }
    }

    /// Validate that the connection is live.
    pub async fn ping(&mut self) -> Result<()> {
        self.execute("SELECT 1").await?;
        Ok(())
    }

    /// Execute a statement over the text protocol, returning the
    /// affected row count.
    ///
    /// Must stay unprepared: MySQL does not allow `BEGIN` in the
    /// prepared-statement protocol.
    pub async fn execute(&mut self, sql: &str) -> Result<u64> {
        match self {
            DbConnection::Mysql(conn) => {
                Ok(sqlx::raw_sql(sql).execute(&mut *conn).await?.rows_affected())
            }
            DbConnection::Sqlite(conn) => {
                Ok(sqlx::raw_sql(sql).execute(&mut *conn).await?.rows_affected())
            }
        }
    }

    /// Run a query expected to return a single integer (e.g. `COUNT(*)`).
    pub async fn fetch_count(&mut self, sql: &str) -> Result<i64> {
        match self {
            DbConnection::Mysql(conn) => {
                let row = sqlx::query(sql).fetch_one(&mut *conn).await?;
                Ok(row.try_get::<i64, _>(0)?)
            }
            DbConnection::Sqlite(conn) => {
                let row = sqlx::query(sql).fetch_one(&mut *conn).await?;
                Ok(row.try_get::<i64, _>(0)?)
            }
        }
    }

    /// Stream rows from a query as decoded [`Row`] values, in the given
    /// column order.
    ///
    /// This is a forward-only cursor: it must be fully drained or dropped
    /// before the connection can be used again.
    pub fn fetch_rows<'c>(
        &'c mut self,
        sql: &'c str,
        columns: &'c [Column],
    ) -> BoxStream<'c, Result<Row>> {
        match self {
            DbConnection::Mysql(conn) => sqlx::query(sql)
                .fetch(&mut *conn)
                .map(move |res| {
                    res.map(|row| mysql::decode_row(&row, columns))
                        .map_err(MigrateError::from)
                })
                .boxed(),
            DbConnection::Sqlite(conn) => sqlx::query(sql)
                .fetch(&mut *conn)
                .map(move |res| {
                    res.map(|row| sqlite::decode_row(&row, columns))
                        .map_err(MigrateError::from)
                })
                .boxed(),
        }
    }

    /// Execute a prepared insert with positionally bound values.
    ///
    /// The statement text is cached per connection, so repeated calls
    /// with the same SQL reuse the prepared statement.
    pub async fn execute_insert(&mut self, sql: &str, values: &Row) -> Result<u64> {
        match self {
            DbConnection::Mysql(conn) => {
                let mut query = sqlx::query(sql);
                for value in values {
                    query = mysql::bind_value(query, value);
                }
                Ok(query.execute(&mut *conn).await?.rows_affected())
            }
            DbConnection::Sqlite(conn) => {
                let mut query = sqlx::query(sql);
                for value in values {
                    query = sqlite::bind_value(query, value);
                }
                Ok(query.execute(&mut *conn).await?.rows_affected())
            }
        }
    }

    /// Open an explicit transaction, suspending auto-commit until the
    /// next COMMIT or ROLLBACK.
    pub async fn begin(&mut self) -> Result<()> {
        self.execute("BEGIN").await?;
        Ok(())
    }

    /// Commit the open transaction.
    pub async fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT").await?;
        Ok(())
    }

    /// Roll back the open transaction.
    pub async fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK").await?;
        Ok(())
    }

    /// Close the connection cleanly.
    pub async fn close(self) -> Result<()> {
        match self {
            DbConnection::Mysql(conn) => conn.close().await?,
            DbConnection::Sqlite(conn) => conn.close().await?,
        }
        Ok(())
    }
}
