//! Error types for the statement exporter.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while reading, rendering or writing statements.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Invalid transaction record
    #[error("Invalid transaction at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Date matches none of the accepted shapes
    #[error("Invalid date format: {value:?}")]
    InvalidDateFormat { value: String },

    /// Configuration values that cannot be used for an export
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Persisting one document failed
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some documents of an export could not be written
    #[error("{failed} of {total} statement documents could not be written")]
    PartialExport { failed: usize, total: usize },

    /// Missing command line arguments
    #[error(
        "Missing arguments. Usage: statement-export <input.csv> <output.ofx> [config.toml]"
    )]
    MissingArgument,
}
