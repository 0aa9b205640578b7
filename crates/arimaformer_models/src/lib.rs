//! # arimaformer_models
//!
//! Neural stage of the hybrid forecaster.
//!
//! - [`TransAm`] - single-block Transformer encoder regressing every window
//!   position from the ARIMA inputs seen so far
//! - [`PositionalEncoding`] - fixed sinusoidal table
//! - [`TransformerEncoderLayer`] - post-norm encoder layer with causal masking

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod transformer;

pub use transformer::*;
