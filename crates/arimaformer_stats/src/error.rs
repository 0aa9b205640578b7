//! Error types for arimaformer_stats.

use thiserror::Error;

/// Result type alias using [`StatsError`].
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors raised while fitting or evaluating statistical models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// The series is too short for the requested model order.
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData {
        /// Minimum number of observations.
        needed: usize,
        /// Number of observations provided.
        got: usize,
    },

    /// The least-squares normal equations could not be solved.
    #[error("Singular design matrix while estimating {0}")]
    SingularMatrix(&'static str),

    /// The series contains NaN or infinite values.
    #[error("Series contains a non-finite value at index {0}")]
    NonFinite(usize),

    /// A prediction range falls outside the series.
    #[error("Invalid prediction range {start}..={end} for a series of length {len}")]
    InvalidRange {
        /// First requested index.
        start: usize,
        /// Last requested index.
        end: usize,
        /// Series length.
        len: usize,
    },
}
