//! Migration engine - drives a single run from analysis to commit.
//!
//! One worker processes tables strictly sequentially: target-side DDL
//! and interior commits share one connection and one transaction scope.
//! Cancellation is cooperative, polled at table boundaries and at every
//! row. The engine never lets an error escape: callers always receive a
//! [`MigrationResult`] value.

use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::analyzer::SchemaAnalyzer;
use crate::convert::{count_sql, SqlConverter};
use crate::core::schema::Table;
use crate::core::value::Row;
use crate::dialect::typemap::TypeMaps;
use crate::drivers::DbConnection;
use crate::error::{MigrateError, Result};
use crate::progress::ProgressSink;

/// Rows buffered between prepared-insert flushes.
pub const BATCH_SIZE: usize = 1000;

/// Rows between interior transaction commits; distinct from the batch
/// size.
pub const COMMIT_INTERVAL: i64 = 5000;

/// Terminal state of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// All tables copied and the final commit succeeded.
    Committed,
    /// An error aborted the run; uncommitted work was rolled back.
    RolledBack,
    /// Cancellation was requested and honored at a row or table
    /// boundary.
    Cancelled,
}

/// Result of a migration run, returned to the caller at run end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Terminal state of the run.
    pub outcome: RunOutcome,

    /// Whether the run committed fully.
    pub success: bool,

    /// Human-readable failure message, if any.
    pub error: Option<String>,

    /// Tables found in the source.
    pub tables_total: usize,

    /// Tables fully migrated (empty tables included).
    pub tables_migrated: usize,

    /// Total rows copied across all completed tables.
    pub rows_migrated: i64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl MigrationResult {
    fn start(run_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            outcome: RunOutcome::RolledBack,
            success: false,
            error: None,
            tables_total: 0,
            tables_migrated: 0,
            rows_migrated: 0,
            started_at,
            finished_at: started_at,
        }
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MigrateError::Config(format!("serializing result: {}", e)))
    }
}

/// Per-table row-count comparison between source and target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowCountCheck {
    pub table: String,
    pub source_rows: i64,
    pub target_rows: i64,
}

impl RowCountCheck {
    pub fn matches(&self) -> bool {
        self.source_rows == self.target_rows
    }
}

/// Orchestrates a migration run over two open connections.
pub struct MigrationEngine {
    batch_size: usize,
    commit_interval: i64,
    type_maps: TypeMaps,
}

impl Default for MigrationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationEngine {
    pub fn new() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            commit_interval: COMMIT_INTERVAL,
            type_maps: TypeMaps::new(),
        }
    }

    /// Run a migration from `source` into `target`.
    ///
    /// The whole run executes inside explicit transactions on the target
    /// connection, with interior commits every [`COMMIT_INTERVAL`] rows
    /// and at each completed table. A later rollback therefore only
    /// undoes work since the last commit: the run is best-effort
    /// partially durable, not all-or-nothing. Tables fully completed
    /// before a failure or cancellation remain migrated.
    ///
    /// Errors never escape; the returned [`MigrationResult`] carries the
    /// outcome, and failures are additionally surfaced through
    /// [`ProgressSink::on_error`]. Cancellation is its own outcome, not
    /// an error.
    pub async fn run(
        &self,
        source: &mut DbConnection,
        target: &mut DbConnection,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> MigrationResult {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut result = MigrationResult::start(run_id, Utc::now());
        let mut tx_open = false;

        match self
            .run_inner(source, target, sink, cancel, &mut result, &mut tx_open)
            .await
        {
            Ok(()) => {
                result.success = true;
                result.outcome = RunOutcome::Committed;
                info!(
                    "migration complete: {}/{} tables, {} rows",
                    result.tables_migrated, result.tables_total, result.rows_migrated
                );
                sink.on_progress("migration complete", 1.0);
            }
            Err(MigrateError::Cancelled) => {
                Self::rollback_quietly(target, tx_open).await;
                result.outcome = RunOutcome::Cancelled;
                result.error = Some("migration cancelled".to_string());
                info!("migration cancelled after {} tables", result.tables_migrated);
            }
            Err(e) => {
                Self::rollback_quietly(target, tx_open).await;
                result.outcome = RunOutcome::RolledBack;
                let message = e.to_string();
                error!("migration failed: {}", message);
                sink.on_error(&message, &e);
                result.error = Some(message);
            }
        }

        result.finished_at = Utc::now();
        result
    }

    async fn run_inner(
        &self,
        source: &mut DbConnection,
        target: &mut DbConnection,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
        result: &mut MigrationResult,
        tx_open: &mut bool,
    ) -> Result<()> {
        let source_type = source.db_type();
        let target_type = target.db_type();
        info!("starting migration run: {} -> {}", source_type, target_type);

        // Connectivity check, before any schema work.
        source.ping().await?;
        target.ping().await?;

        sink.on_progress("analyzing source schema", 0.0);
        let tables = SchemaAnalyzer::analyze(source).await?;
        result.tables_total = tables.len();

        if tables.is_empty() {
            sink.on_progress("no tables found in source", 1.0);
            return Ok(());
        }

        sink.on_progress(
            &format!("found {} tables, creating target schema", tables.len()),
            0.1,
        );

        let converter = SqlConverter::new(&self.type_maps);

        target.begin().await?;
        *tx_open = true;

        for (i, table) in tables.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            target
                .execute(&converter.drop_table_sql(&table.name, target_type))
                .await
                .map_err(|e| MigrateError::schema_creation(table.name.as_str(), &e))?;
            target
                .execute(&converter.create_table_sql(table, target_type))
                .await
                .map_err(|e| MigrateError::schema_creation(table.name.as_str(), &e))?;
            debug!("created table {}", table.name);

            sink.on_progress(
                &format!("created table {} ({}/{})", table.name, i + 1, tables.len()),
                0.1 + 0.1 * (i + 1) as f64 / tables.len() as f64,
            );
        }

        sink.on_progress("schema created, copying data", 0.2);

        let total_rows: i64 = tables.iter().map(|t| t.row_count.max(0)).sum();
        let mut rows_before = 0i64;

        for table in &tables {
            if cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            // Zero rows at analysis time: nothing to copy, still counted
            // as migrated.
            if table.is_empty() {
                debug!("skipping empty table {}", table.name);
                result.tables_migrated += 1;
                continue;
            }

            sink.on_table_start(&table.name, table.row_count);

            let copied = self
                .copy_table(
                    source, target, table, &converter, sink, cancel, rows_before, total_rows,
                )
                .await?;

            // Make fully copied tables durable before moving on.
            target
                .commit()
                .await
                .map_err(|e| MigrateError::copy(table.name.as_str(), &e))?;
            target
                .begin()
                .await
                .map_err(|e| MigrateError::copy(table.name.as_str(), &e))?;

            result.tables_migrated += 1;
            result.rows_migrated += copied;
            rows_before += table.row_count;

            sink.on_table_complete(&table.name, copied);
            info!("migrated table {}: {} rows", table.name, copied);
        }

        target.commit().await?;
        *tx_open = false;
        Ok(())
    }

    /// Stream one table's rows from source to target in batches.
    #[allow(clippy::too_many_arguments)]
    async fn copy_table(
        &self,
        source: &mut DbConnection,
        target: &mut DbConnection,
        table: &Table,
        converter: &SqlConverter<'_>,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
        rows_before: i64,
        total_rows: i64,
    ) -> Result<i64> {
        let select = converter.select_sql(table, source.db_type());
        let insert = converter.insert_sql(table, target.db_type());
        let target_type = target.db_type();

        let mut batch: Vec<Row> = Vec::with_capacity(self.batch_size);
        let mut copied = 0i64;

        let mut stream = source.fetch_rows(&select, &table.columns);

        while let Some(row) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            let row = row.map_err(|e| MigrateError::copy(table.name.as_str(), &e))?;
            batch.push(row.into_iter().map(|v| v.normalize_for(target_type)).collect());
            copied += 1;

            if batch.len() >= self.batch_size {
                Self::flush_batch(target, &insert, &mut batch)
                    .await
                    .map_err(|e| MigrateError::copy(table.name.as_str(), &e))?;

                if copied % self.commit_interval == 0 {
                    target
                        .commit()
                        .await
                        .map_err(|e| MigrateError::copy(table.name.as_str(), &e))?;
                    target
                        .begin()
                        .await
                        .map_err(|e| MigrateError::copy(table.name.as_str(), &e))?;
                }

                sink.on_progress(
                    &format!("copying {}: {}/{} rows", table.name, copied, table.row_count),
                    copy_fraction(rows_before + copied, total_rows),
                );
            }
        }

        drop(stream);

        if !batch.is_empty() {
            Self::flush_batch(target, &insert, &mut batch)
                .await
                .map_err(|e| MigrateError::copy(table.name.as_str(), &e))?;
        }

        Ok(copied)
    }

    async fn flush_batch(
        target: &mut DbConnection,
        insert_sql: &str,
        batch: &mut Vec<Row>,
    ) -> Result<()> {
        for row in batch.drain(..) {
            target.execute_insert(insert_sql, &row).await?;
        }
        Ok(())
    }

    async fn rollback_quietly(target: &mut DbConnection, tx_open: bool) {
        if !tx_open {
            return;
        }
        if let Err(e) = target.rollback().await {
            warn!("rollback failed: {}", e);
        }
    }

    /// Compare per-table row counts between source and target.
    ///
    /// Missing or unreadable target tables count as zero rows rather
    /// than failing the whole comparison.
    pub async fn validate(
        source: &mut DbConnection,
        target: &mut DbConnection,
    ) -> Result<Vec<RowCountCheck>> {
        let source_type = source.db_type();
        let target_type = target.db_type();
        let tables = SchemaAnalyzer::analyze(source).await?;

        let mut checks = Vec::with_capacity(tables.len());
        for table in &tables {
            let source_rows = source
                .fetch_count(&count_sql(&table.name, source_type))
                .await
                .unwrap_or(table.row_count);
            let target_rows = target
                .fetch_count(&count_sql(&table.name, target_type))
                .await
                .unwrap_or(0);

            if source_rows == target_rows {
                info!("{}: {} rows (match)", table.name, source_rows);
            } else {
                warn!(
                    "{}: source={} target={} (mismatch)",
                    table.name, source_rows, target_rows
                );
            }

            checks.push(RowCountCheck {
                table: table.name.clone(),
                source_rows,
                target_rows,
            });
        }

        Ok(checks)
    }
}

/// Overall fraction while copying: 0.2 to 1.0, proportional to rows
/// copied so far versus the advisory total.
fn copy_fraction(rows_done: i64, total_rows: i64) -> f64 {
    if total_rows <= 0 {
        return 1.0;
    }
    (0.2 + 0.8 * rows_done as f64 / total_rows as f64).min(1.0)
}
