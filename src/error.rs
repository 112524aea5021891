//! Error types for table-batcher
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for table-batcher
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Input Errors
    // ============================================================================
    #[error("Invalid row operation on line {line}: {message}")]
    InvalidInput { line: usize, message: String },

    // ============================================================================
    // Store Errors
    // ============================================================================
    /// The store refused an atomic batch because of the operation at `index`.
    #[error("Transaction rejected at operation {index}: {message}")]
    TransactionRejected { index: usize, message: String },

    #[error("Transaction of {size} operations exceeds the store limit of {limit}")]
    TransactionTooLarge { size: usize, limit: usize },

    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid table name error
    pub fn invalid_table(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTableName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an input error for a given line
    pub fn invalid_input(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            line,
            message: message.into(),
        }
    }

    /// Create a transaction rejection naming the failing operation
    pub fn rejected(index: usize, message: impl Into<String>) -> Self {
        Self::TransactionRejected {
            index,
            message: message.into(),
        }
    }

    /// Create a store (transport) error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Index of the single failing operation, if this is a partial-batch rejection
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Error::TransactionRejected { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result type alias for table-batcher
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("connection");
        assert_eq!(err.to_string(), "Missing required config field: connection");

        let err = Error::rejected(37, "bad row key");
        assert_eq!(
            err.to_string(),
            "Transaction rejected at operation 37: bad row key"
        );

        let err = Error::TransactionTooLarge {
            size: 101,
            limit: 100,
        };
        assert_eq!(
            err.to_string(),
            "Transaction of 101 operations exceeds the store limit of 100"
        );
    }

    #[test]
    fn test_failed_index() {
        assert_eq!(Error::rejected(4, "x").failed_index(), Some(4));

        assert_eq!(Error::store("connection reset").failed_index(), None);
        assert_eq!(
            Error::TableNotFound {
                table: "Missing".to_string()
            }
            .failed_index(),
            None
        );
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.with_context(|| "outer".to_string());
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
