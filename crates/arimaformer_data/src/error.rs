//! Error types for arimaformer_data.

use thiserror::Error;

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur in data operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// Invalid data shape.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Empty dataset.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// The series cannot produce a single window.
    #[error("Series of length {len} is too short for window size {window}")]
    SeriesTooShort {
        /// Series length.
        len: usize,
        /// Requested window.
        window: usize,
    },

    /// Batch size error.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(String),

    /// Requested column is absent from the CSV header.
    #[error("Column '{column}' not found in {path} (available: {available})")]
    MissingColumn {
        /// Requested column.
        column: String,
        /// File path.
        path: String,
        /// Header columns that were found.
        available: String,
    },

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Scaler used before `fit`.
    #[error("Scaler has not been fitted")]
    NotFitted,

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// CSV reader/writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Statistical model error.
    #[error("ARIMA error: {0}")]
    Stats(#[from] arimaformer_stats::StatsError),
}
