//! # mysql-sqlite-migrate
//!
//! Bidirectional MySQL/SQLite schema and data migration library.
//!
//! The core pipeline: introspect a source database into a
//! dialect-neutral schema model, synthesize target-dialect DDL/DML from
//! that model, then stream-copy rows table by table in batches under
//! explicit transaction control, with progress callbacks and cooperative
//! cancellation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_sqlite_migrate::{DbConnection, MigrationEngine, NullSink};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> mysql_sqlite_migrate::Result<()> {
//!     let mut source = DbConnection::connect("mysql://root:pw@localhost/app").await?;
//!     let mut target = DbConnection::connect("sqlite:app.db").await?;
//!
//!     let engine = MigrationEngine::new();
//!     let cancel = CancellationToken::new();
//!     let result = engine.run(&mut source, &mut target, &NullSink, &cancel).await;
//!
//!     println!("migrated {} rows", result.rows_migrated);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod convert;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod progress;

// Re-exports for convenient access
pub use analyzer::SchemaAnalyzer;
pub use convert::SqlConverter;
pub use crate::core::schema::{Column, Index, Table};
pub use crate::core::value::{Row, Value};
pub use dialect::typemap::TypeMaps;
pub use dialect::DbType;
pub use drivers::DbConnection;
pub use engine::{MigrationEngine, MigrationResult, RowCountCheck, RunOutcome};
pub use error::{MigrateError, Result};
pub use progress::{NullSink, ProgressSink};
