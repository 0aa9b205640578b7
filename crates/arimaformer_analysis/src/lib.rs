//! # arimaformer_analysis
//!
//! Evaluation utilities for the hybrid forecaster:
//! - [`ForecastReport`]: MAE and RMSE, absolute and relative to the target range
//! - [`plot_forecast`]: PNG of predictions against ground truth

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod plot;
mod report;

pub use error::{AnalysisError, Result};
pub use plot::{plot_forecast, PlotStyle};
pub use report::ForecastReport;
