//! # arimaformer_core
//!
//! Core types shared by the arimaformer crates.
//!
//! This crate provides:
//! - [`Seed`] for deterministic random number generation
//! - [`CoreError`] and the crate [`Result`] alias
//! - Backend type aliases behind feature flags
//!
//! ## Tensor layout
//!
//! Sequence tensors are batch-first, `(B, L, F)`:
//! - `B`: number of windows in the batch
//! - `L`: window length (time steps)
//! - `F`: features per step (1 for the raw univariate input)

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod seed;

pub use error::{CoreError, Result};
pub use seed::Seed;

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::{NdArray, NdArrayDevice};

    #[cfg(feature = "backend-wgpu")]
    pub use burn_wgpu::{Wgpu, WgpuDevice};
}
