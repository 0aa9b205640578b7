//! Error types for training.

use thiserror::Error;

/// Result type alias for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

/// Errors that can occur during training.
#[derive(Error, Debug)]
pub enum TrainError {
    /// The training loss became NaN or infinite.
    #[error("Non-finite loss {loss} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss {
        /// Epoch (1-based).
        epoch: usize,
        /// Batch index within the epoch.
        batch: usize,
        /// Offending loss value.
        loss: f32,
    },

    /// Invalid trainer configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data error.
    #[error("Data error: {0}")]
    DataError(#[from] arimaformer_data::DataError),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] arimaformer_core::CoreError),

    /// Metrics or plotting failed.
    #[error("Analysis error: {0}")]
    AnalysisError(#[from] arimaformer_analysis::AnalysisError),
}
