//! Error types for forecast analysis.

use thiserror::Error;

/// Errors that can occur during analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No samples to evaluate.
    #[error("Cannot evaluate an empty forecast")]
    Empty,

    /// Truth and predictions differ in length.
    #[error("Length mismatch: {truth} targets vs {preds} predictions")]
    LengthMismatch {
        /// Number of targets.
        truth: usize,
        /// Number of predictions.
        preds: usize,
    },

    /// Rendering failed.
    #[error("Plot error: {0}")]
    Plot(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
