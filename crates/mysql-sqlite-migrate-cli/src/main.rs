//! mysql-sqlite-migrate CLI - bidirectional MySQL/SQLite migration.
//!
//! This binary owns everything the migration core treats as external:
//! URL handling, logging setup, signal-driven cancellation, and console
//! progress output.

use clap::{Parser, Subcommand};
use mysql_sqlite_migrate::{
    DbConnection, DbType, MigrateError, MigrationEngine, ProgressSink, RunOutcome, SchemaAnalyzer,
    SqlConverter, TypeMaps,
};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::Level;

#[derive(Parser)]
#[command(name = "mysql-sqlite-migrate")]
#[command(about = "Bidirectional MySQL/SQLite schema and data migration")]
#[command(version)]
struct Cli {
    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate all tables from a source database into a target database
    Run {
        /// Source connection URL (mysql://... or sqlite:...)
        #[arg(long)]
        source: String,

        /// Target connection URL (mysql://... or sqlite:...)
        #[arg(long)]
        target: String,

        /// Suppress per-batch progress lines
        #[arg(long)]
        quiet: bool,
    },

    /// Analyze a source database and print the DDL that a migration
    /// would generate
    Inspect {
        /// Source connection URL
        #[arg(long)]
        source: String,

        /// Target dialect to generate DDL for: mysql or sqlite
        /// [default: the opposite of the source]
        #[arg(long)]
        to: Option<String>,
    },

    /// Compare per-table row counts between source and target
    Validate {
        /// Source connection URL
        #[arg(long)]
        source: String,

        /// Target connection URL
        #[arg(long)]
        target: String,
    },
}

/// Progress sink that prints to stderr.
struct ConsoleSink {
    quiet: bool,
}

impl ProgressSink for ConsoleSink {
    fn on_progress(&self, message: &str, fraction: f64) {
        if !self.quiet {
            eprintln!("[{:>5.1}%] {}", fraction * 100.0, message);
        }
    }

    fn on_table_start(&self, table: &str, total_rows: i64) {
        eprintln!("==> {} ({} rows)", table, total_rows);
    }

    fn on_table_complete(&self, table: &str, migrated_rows: i64) {
        eprintln!("<== {} done ({} rows)", table, migrated_rows);
    }

    fn on_error(&self, message: &str, _error: &MigrateError) {
        eprintln!("error: {}", message);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    match cli.command {
        Commands::Run {
            source,
            target,
            quiet,
        } => {
            let mut source = DbConnection::connect(&source).await?;
            let mut target = DbConnection::connect(&target).await?;

            let cancel = setup_signal_handler();
            let sink = ConsoleSink { quiet };
            let engine = MigrationEngine::new();

            let result = engine.run(&mut source, &mut target, &sink, &cancel).await;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let status = match result.outcome {
                    RunOutcome::Committed => "Migration completed!",
                    RunOutcome::Cancelled => "Migration cancelled.",
                    RunOutcome::RolledBack => "Migration failed.",
                };
                println!("\n{}", status);
                println!("  Run ID: {}", result.run_id);
                println!(
                    "  Duration: {:.2}s",
                    result.duration().num_milliseconds() as f64 / 1000.0
                );
                println!(
                    "  Tables: {}/{}",
                    result.tables_migrated, result.tables_total
                );
                println!("  Rows: {}", result.rows_migrated);
                if let Some(ref error) = result.error {
                    println!("  Error: {}", error);
                }
            }

            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Inspect { source, to } => {
            let mut source = DbConnection::connect(&source).await?;

            let target_type = match to.as_deref() {
                Some("mysql") => DbType::Mysql,
                Some("sqlite") => DbType::Sqlite,
                Some(other) => {
                    return Err(MigrateError::Config(format!(
                        "unknown dialect '{}', expected mysql or sqlite",
                        other
                    )))
                }
                // Default to converting toward the other dialect.
                None => match source.db_type() {
                    DbType::Mysql => DbType::Sqlite,
                    DbType::Sqlite => DbType::Mysql,
                },
            };

            let tables = SchemaAnalyzer::analyze(&mut source).await?;
            let maps = TypeMaps::new();
            let converter = SqlConverter::new(&maps);

            println!("-- {} tables, {} DDL", tables.len(), target_type);
            for table in &tables {
                println!(
                    "\n-- {} ({} columns, {} rows, {} indexes)",
                    table.name,
                    table.columns.len(),
                    table.row_count,
                    table.indexes.len()
                );
                println!("{};", converter.create_table_sql(table, target_type));
            }

            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { source, target } => {
            let mut source = DbConnection::connect(&source).await?;
            let mut target = DbConnection::connect(&target).await?;

            let checks = MigrationEngine::validate(&mut source, &mut target).await?;

            let mut all_match = true;
            for check in &checks {
                if check.matches() {
                    println!("  ok   {} ({} rows)", check.table, check.source_rows);
                } else {
                    all_match = false;
                    println!(
                        "  FAIL {} (source={} target={})",
                        check.table, check.source_rows, check.target_rows
                    );
                }
            }

            Ok(if all_match {
                println!("\nValidation completed successfully");
                ExitCode::SUCCESS
            } else {
                println!("\nValidation found mismatches");
                ExitCode::FAILURE
            })
        }
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Ctrl-C requests cooperative cancellation; the engine stops at the
/// next row boundary.
fn setup_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancellation requested, stopping at the next row boundary...");
            token.cancel();
        }
    });

    cancel
}
