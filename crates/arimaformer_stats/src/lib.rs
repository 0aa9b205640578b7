//! # arimaformer_stats
//!
//! Classical statistical models used to pre-process the series before the
//! neural stage.
//!
//! - [`ArimaModel`] fits ARIMA(p, d, q) by conditional least squares
//!   (Hannan-Rissanen when both AR and MA terms are present)
//! - [`ArimaModel::predict_levels`] produces in-sample one-step-ahead
//!   predictions on the original scale
//! - [`ArimaModel::forecast`] extends the series out of sample
//!
//! ## Example
//!
//! ```rust,ignore
//! use arimaformer_stats::{ArimaModel, ArimaOrder};
//!
//! let model = ArimaModel::fit(&values, ArimaOrder::new(1, 1, 0))?;
//! let fitted = model.predict_levels(&values, 1, values.len())?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod arima;
mod error;

pub use arima::{difference, integrate, ArimaModel, ArimaOrder};
pub use error::{Result, StatsError};
