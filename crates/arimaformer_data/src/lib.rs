//! # arimaformer_data
//!
//! Data handling for the hybrid ARIMA + Transformer forecaster.
//!
//! This crate provides:
//! - [`read_value_column`] / [`write_value_column`] for single-column CSV series
//! - [`MinMaxScaler`] for range scaling
//! - [`create_inout_sequences`] and [`WindowedSeries`] for sliding windows
//! - [`SequenceLoader`] for batch-first tensor chunks
//! - [`HybridDataset`] which chains ARIMA, scaling and windowing
//!
//! ## Example
//!
//! ```rust,ignore
//! use arimaformer_data::{read_value_column, DataConfig, HybridDataset, SequenceLoader};
//!
//! let values = read_value_column("series.csv", "Value")?;
//! let data = HybridDataset::prepare(&values, &DataConfig::default())?;
//! let loader = SequenceLoader::builder(data.train).batch_size(64).build()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hybrid;
mod io;
mod loader;
mod scaler;
pub mod synthetic;
mod window;

pub use error::{DataError, Result};
pub use hybrid::{DataConfig, HybridDataset};
pub use io::{read_value_column, write_value_column, DEFAULT_VALUE_COLUMN};
pub use loader::{SequenceBatch, SequenceLoader, SequenceLoaderBuilder, SequenceLoaderIter};
pub use scaler::MinMaxScaler;
pub use window::{create_inout_sequences, WindowedSeries};
