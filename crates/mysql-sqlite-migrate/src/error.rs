//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (bad URL, missing argument, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection URL does not match a supported dialect.
    #[error("Unsupported database URL (expected mysql:// or sqlite:): {0}")]
    UnknownDialect(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema analysis failed on the source database.
    #[error("Schema analysis failed: {0}")]
    SchemaAnalysis(String),

    /// DDL rejected by the target database.
    #[error("Schema creation failed for table {table}: {message}")]
    SchemaCreation { table: String, message: String },

    /// Data copy failed for a specific table.
    #[error("Data copy failed for table {table}: {message}")]
    Copy { table: String, message: String },

    /// Migration was cancelled via the cancellation token.
    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a SchemaCreation error.
    pub fn schema_creation(table: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::SchemaCreation {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a Copy error.
    pub fn copy(table: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Copy {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is the cooperative-cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MigrateError::Cancelled)
    }

    /// Format error with full details including the error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_build_messages() {
        let e = MigrateError::schema_creation("users", "syntax error");
        assert_eq!(
            e.to_string(),
            "Schema creation failed for table users: syntax error"
        );

        let e = MigrateError::copy("orders", "constraint violation");
        assert!(e.to_string().contains("orders"));
        assert!(!e.is_cancelled());
        assert!(MigrateError::Cancelled.is_cancelled());
    }
}
