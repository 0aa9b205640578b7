//! # arimaformer
//!
//! Hybrid time series forecasting: an ARIMA model produces one-step
//! predictions and a causal Transformer encoder learns to correct them.
//!
//! - **Statistics**: ARIMA(p, d, q) estimation, in-sample level prediction, forecasting
//! - **Data**: CSV loading, min-max scaling, sliding windows, batch-first loading
//! - **Models**: `TransAm` encoder with sinusoidal positions and a causal mask
//! - **Training**: AdamW with gradient clipping, step LR decay, rolling evaluation
//! - **Analysis**: MAE/RMSE reports and forecast plots
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use arimaformer::prelude::*;
//!
//! let mut config = ExperimentConfig::default();
//! config.data_path = Some("series.csv".into());
//!
//! let output = run_experiment::<Autodiff<NdArray>>(&config, Default::default())?;
//! println!("{}", output.final_report.to_string_table());
//! ```
//!
//! ## Feature Flags
//!
//! - `backend-ndarray` (default): CPU backend using ndarray
//! - `backend-wgpu`: GPU backend using WGPU

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod experiment;

pub use arimaformer_analysis as analysis;
pub use arimaformer_core as core;
pub use arimaformer_data as data;
pub use arimaformer_models as models;
pub use arimaformer_stats as stats;
pub use arimaformer_train as train;

pub use error::{ExperimentError, Result};
pub use experiment::{run_experiment, run_on_series, ExperimentConfig, ExperimentOutput};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use arimaformer::prelude::*;
/// ```
pub mod prelude {
    pub use arimaformer_core::{backend, Seed};

    pub use arimaformer_stats::{ArimaModel, ArimaOrder};

    pub use arimaformer_data::{
        read_value_column, write_value_column, DataConfig, HybridDataset, MinMaxScaler,
        SequenceLoader, WindowedSeries,
    };

    pub use arimaformer_models::{TransAm, TransAmConfig};

    pub use arimaformer_train::{ForecastTrainer, ForecastTrainerConfig, Scheduler, StepLR};

    pub use arimaformer_analysis::{plot_forecast, ForecastReport, PlotStyle};

    pub use crate::{run_experiment, run_on_series, ExperimentConfig, ExperimentOutput};
}
