//! # arimaformer_train
//!
//! Training loop for the Transformer stage of the hybrid forecaster.
//!
//! This crate provides:
//! - [`ForecastTrainer`]: AdamW with global gradient-norm clipping, one LR step per epoch
//! - Batched validation and rolling one-step evaluation with metrics and plots
//! - [`StepLR`] and the [`Scheduler`] trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use arimaformer_train::{ForecastTrainer, ForecastTrainerConfig};
//!
//! let trainer = ForecastTrainer::<Autodiff<NdArray>>::new(ForecastTrainerConfig::default(), device);
//! let output = trainer.fit_with_forward(
//!     model,
//!     &data.train,
//!     &data.valid,
//!     |m, x| m.forward(x),
//!     |m, x| m.forward(x),
//! )?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clip;
pub mod error;
pub mod scheduler;
pub mod training;

pub use clip::{clip_grad_norm, global_grad_norm};
pub use error::{Result, TrainError};
pub use scheduler::{Scheduler, StepLR};
pub use training::{ForecastOutput, ForecastTrainer, ForecastTrainerConfig, RollingEvaluation};
