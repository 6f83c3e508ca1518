//! Progress reporting capability consumed by the caller.
//!
//! The engine invokes these callbacks synchronously from its worker;
//! marshaling to another execution context (a UI thread, a channel) is
//! the implementor's responsibility.

use crate::error::MigrateError;

/// Receives migration lifecycle and progress events.
///
/// `on_error` terminates the event sequence for a run; every other
/// callback may fire any number of times.
pub trait ProgressSink: Send + Sync {
    /// A human-readable status message with an overall completion
    /// fraction in `[0, 1]`.
    fn on_progress(&self, message: &str, fraction: f64);

    /// Row copying is starting for a table. The row count is the
    /// advisory estimate captured at analysis time.
    fn on_table_start(&self, table: &str, total_rows: i64);

    /// A table finished copying.
    fn on_table_complete(&self, table: &str, migrated_rows: i64);

    /// The run failed. Cancellation does not produce this event.
    fn on_error(&self, message: &str, error: &MigrateError);
}

/// A sink that discards all events.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _message: &str, _fraction: f64) {}
    fn on_table_start(&self, _table: &str, _total_rows: i64) {}
    fn on_table_complete(&self, _table: &str, _migrated_rows: i64) {}
    fn on_error(&self, _message: &str, _error: &MigrateError) {}
}
