//! Error type for end-to-end experiments.

use thiserror::Error;

/// Result type alias for experiment operations.
pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Errors raised while configuring or running an experiment.
#[derive(Error, Debug)]
pub enum ExperimentError {
    /// No input series was configured.
    #[error("No data path configured")]
    MissingDataPath,

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] arimaformer_core::CoreError),

    /// Data error.
    #[error("Data error: {0}")]
    Data(#[from] arimaformer_data::DataError),

    /// Training error.
    #[error("Training error: {0}")]
    Train(#[from] arimaformer_train::TrainError),

    /// Metrics error.
    #[error("Analysis error: {0}")]
    Analysis(#[from] arimaformer_analysis::AnalysisError),

    /// Configuration (de)serialization failed.
    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
