//! Training loop for sequence-to-sequence refinement.
//!
//! Every epoch runs one pass over the training windows, then validates on the
//! full series. Every `plot_every` epochs validation is a rolling one-step
//! evaluation that also produces a [`ForecastReport`] and a plot; otherwise a
//! cheaper batched MSE is computed.

use std::path::PathBuf;
use std::time::Instant;

use arimaformer_analysis::{plot_forecast, ForecastReport, PlotStyle};
use arimaformer_data::{SequenceLoader, WindowedSeries};
use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use serde::{Deserialize, Serialize};

use crate::clip::clip_grad_norm;
use crate::error::{Result, TrainError};
use crate::scheduler::{Scheduler, StepLR};

/// Configuration for [`ForecastTrainer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastTrainerConfig {
    /// Number of epochs.
    pub n_epochs: usize,
    /// Initial learning rate.
    pub lr: f64,
    /// AdamW weight decay.
    pub weight_decay: f32,
    /// Maximum global L2 norm over all parameter gradients.
    pub grad_clip_norm: f32,
    /// Training batch size.
    pub batch_size: usize,
    /// Batch size of the batched validation pass.
    pub eval_batch_size: usize,
    /// Epochs between LR decays.
    pub lr_step_size: usize,
    /// LR decay factor.
    pub lr_gamma: f64,
    /// Rolling evaluation every this many epochs (0 = never).
    pub plot_every: usize,
    /// Directory for `transformer-epoch{N}.png`; `None` disables plotting.
    pub plot_dir: Option<PathBuf>,
}

impl Default for ForecastTrainerConfig {
    fn default() -> Self {
        Self {
            n_epochs: 300,
            lr: 0.005,
            weight_decay: 0.01,
            grad_clip_norm: 0.7,
            batch_size: 64,
            eval_batch_size: 1000,
            lr_step_size: 1,
            lr_gamma: 0.95,
            plot_every: 10,
            plot_dir: Some(PathBuf::from("ARIMATransformer")),
        }
    }
}

impl ForecastTrainerConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.n_epochs == 0 {
            return Err(TrainError::InvalidConfig("n_epochs must be > 0".to_string()));
        }
        if self.batch_size == 0 || self.eval_batch_size == 0 {
            return Err(TrainError::InvalidConfig("batch sizes must be > 0".to_string()));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(TrainError::InvalidConfig(format!(
                "lr must be positive, got {}",
                self.lr
            )));
        }
        if self.grad_clip_norm <= 0.0 {
            return Err(TrainError::InvalidConfig(format!(
                "grad_clip_norm must be positive, got {}",
                self.grad_clip_norm
            )));
        }
        Ok(())
    }

    fn is_rolling_epoch(&self, epoch: usize) -> bool {
        self.plot_every > 0 && epoch % self.plot_every == 0
    }
}

/// Result of a rolling one-step evaluation.
#[derive(Debug, Clone)]
pub struct RollingEvaluation {
    /// Mean window MSE.
    pub loss: f32,
    /// Last-position prediction of every window.
    pub preds: Vec<f32>,
    /// Last-position target of every window.
    pub truth: Vec<f32>,
    /// Errors of `preds` against `truth`.
    pub report: ForecastReport,
}

/// Training output with per-epoch history and the best model.
#[derive(Debug)]
pub struct ForecastOutput<M> {
    /// Model from the epoch with the lowest validation loss.
    pub model: M,
    /// Mean training loss per epoch.
    pub train_losses: Vec<f32>,
    /// Validation loss per epoch.
    pub valid_losses: Vec<f32>,
    /// Reports of the rolling evaluations, keyed by epoch (1-based).
    pub reports: Vec<(usize, ForecastReport)>,
    /// Best validation loss.
    pub best_valid_loss: f32,
    /// Epoch (1-based) of the best validation loss.
    pub best_epoch: usize,
    /// Total training time in seconds.
    pub training_time_secs: f64,
}

/// Trainer for models mapping `[batch, window, 1]` inputs to outputs of the same shape.
pub struct ForecastTrainer<B: AutodiffBackend> {
    config: ForecastTrainerConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> ForecastTrainer<B> {
    /// Create a new trainer.
    pub fn new(config: ForecastTrainerConfig, device: B::Device) -> Self {
        Self { config, device }
    }

    /// Train a model using forward closures.
    ///
    /// `forward_fn` runs on the autodiff backend during training and
    /// `valid_forward_fn` on the inner backend during evaluation.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, an empty or unbatchable series, a
    /// non-finite training loss, or when a plot cannot be written.
    pub fn fit_with_forward<M, F, G>(
        &self,
        model: M,
        train: &WindowedSeries,
        valid: &WindowedSeries,
        forward_fn: F,
        valid_forward_fn: G,
    ) -> Result<ForecastOutput<M>>
    where
        M: AutodiffModule<B> + Clone,
        F: Fn(&M, Tensor<B, 3>) -> Tensor<B, 3>,
        G: Fn(&M::InnerModule, Tensor<B::InnerBackend, 3>) -> Tensor<B::InnerBackend, 3>,
    {
        self.config.validate()?;
        let start_time = Instant::now();

        let train_loader = SequenceLoader::builder(train.clone())
            .batch_size(self.config.batch_size)
            .build()?;
        let valid_loader = SequenceLoader::builder(valid.clone())
            .batch_size(self.config.eval_batch_size)
            .build()?;
        if train_loader.n_batches() == 0 {
            return Err(TrainError::InvalidConfig(format!(
                "training series of {} windows yields no batches",
                train.len()
            )));
        }

        let optimizer_config = AdamWConfig::new()
            .with_epsilon(1e-8)
            .with_weight_decay(self.config.weight_decay);
        let mut optim = optimizer_config.init::<B, M>();
        let scheduler = StepLR::new(self.config.lr, self.config.lr_step_size, self.config.lr_gamma);

        let mut best_model = model.clone();
        let mut best_valid_loss = f32::INFINITY;
        let mut best_epoch = 0;

        let mut train_losses = Vec::with_capacity(self.config.n_epochs);
        let mut valid_losses = Vec::with_capacity(self.config.n_epochs);
        let mut reports = Vec::new();

        let mut current_model = model;

        for epoch in 1..=self.config.n_epochs {
            let epoch_start = Instant::now();
            let lr = scheduler.get_lr(epoch - 1);

            let train_loss = self.train_epoch(
                &mut current_model,
                &mut optim,
                &train_loader,
                lr,
                epoch,
                &forward_fn,
            )?;
            train_losses.push(train_loss);

            let inner_model = current_model.clone().valid();
            let valid_loss = if self.config.is_rolling_epoch(epoch) {
                let rolling = self.rolling_evaluate(&inner_model, valid, &valid_forward_fn)?;
                if let Some(dir) = &self.config.plot_dir {
                    let path = dir.join(format!("transformer-epoch{epoch}.png"));
                    let style = PlotStyle::default().with_caption(format!("epoch {epoch}"));
                    plot_forecast(&path, &rolling.truth, &rolling.preds, &style)?;
                }
                tracing::info!(
                    epoch,
                    mae = rolling.report.mae,
                    rmse = rolling.report.rmse,
                    mae_pct = rolling.report.mae_pct,
                    rmse_pct = rolling.report.rmse_pct,
                    "rolling evaluation"
                );
                reports.push((epoch, rolling.report));
                rolling.loss
            } else {
                self.evaluate(&inner_model, &valid_loader, &valid_forward_fn)
            };
            valid_losses.push(valid_loss);

            if valid_loss < best_valid_loss {
                best_valid_loss = valid_loss;
                best_epoch = epoch;
                best_model = current_model.clone();
            }

            tracing::info!(
                "| end of epoch {:3} | time: {:5.2}s | valid loss {:5.5} | valid ppl {:8.2}",
                epoch,
                epoch_start.elapsed().as_secs_f64(),
                valid_loss,
                valid_loss.exp()
            );
        }

        let training_time_secs = start_time.elapsed().as_secs_f64();
        tracing::info!(
            best_epoch,
            best_valid_loss,
            training_time_secs,
            "training complete"
        );

        Ok(ForecastOutput {
            model: best_model,
            train_losses,
            valid_losses,
            reports,
            best_valid_loss,
            best_epoch,
            training_time_secs,
        })
    }

    fn train_epoch<M, O, F>(
        &self,
        model: &mut M,
        optim: &mut O,
        loader: &SequenceLoader,
        lr: f64,
        epoch: usize,
        forward_fn: &F,
    ) -> Result<f32>
    where
        M: AutodiffModule<B> + Clone,
        O: Optimizer<M, B>,
        F: Fn(&M, Tensor<B, 3>) -> Tensor<B, 3>,
    {
        let loss_fn = MseLoss::new();
        let n_batches = loader.n_batches();
        let log_every = log_interval(loader.len(), loader.batch_size());

        let mut epoch_loss = 0.0f32;
        let mut interval_loss = 0.0f32;
        let mut interval_batches = 0usize;
        let mut interval_start = Instant::now();

        for (batch_idx, batch) in loader.iter::<B>(&self.device).enumerate() {
            let output = forward_fn(model, batch.inputs);
            let loss = loss_fn.forward(output, batch.targets, Reduction::Mean);
            let loss_value = loss.clone().into_scalar().elem::<f32>();
            if !loss_value.is_finite() {
                return Err(TrainError::NonFiniteLoss {
                    epoch,
                    batch: batch_idx,
                    loss: loss_value,
                });
            }

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, model);
            let (grads, grad_norm) =
                clip_grad_norm::<B, M>(model, grads, self.config.grad_clip_norm);
            tracing::trace!(epoch, batch = batch_idx, grad_norm, "gradient norm");
            *model = optim.step(lr, model.clone(), grads);

            epoch_loss += loss_value;
            interval_loss += loss_value;
            interval_batches += 1;

            if (batch_idx + 1) % log_every == 0 {
                let cur_loss = interval_loss / interval_batches as f32;
                let ms_per_batch =
                    interval_start.elapsed().as_secs_f64() * 1000.0 / interval_batches as f64;
                tracing::debug!(
                    "| epoch {:3} | {:5}/{:5} batches | lr {:02.6} | {:5.2} ms | loss {:5.5} | ppl {:8.2}",
                    epoch,
                    batch_idx + 1,
                    n_batches,
                    lr,
                    ms_per_batch,
                    cur_loss,
                    cur_loss.exp()
                );
                interval_loss = 0.0;
                interval_batches = 0;
                interval_start = Instant::now();
            }
        }

        Ok(epoch_loss / n_batches as f32)
    }

    /// Batched validation MSE, `sum(batch_len * batch_loss) / n_windows`.
    pub fn evaluate<M, G>(&self, model: &M, loader: &SequenceLoader, valid_forward_fn: &G) -> f32
    where
        M: Module<B::InnerBackend>,
        G: Fn(&M, Tensor<B::InnerBackend, 3>) -> Tensor<B::InnerBackend, 3>,
    {
        let inner_device: <B::InnerBackend as Backend>::Device = self.device.clone().into();
        let loss_fn = MseLoss::new();

        let mut total_loss = 0.0f32;
        for batch in loader.iter::<B::InnerBackend>(&inner_device) {
            let len = batch.len();
            let output = valid_forward_fn(model, batch.inputs);
            let loss = loss_fn.forward(output, batch.targets, Reduction::Mean);
            total_loss += len as f32 * loss.into_scalar().elem::<f32>();
        }

        total_loss / loader.len() as f32
    }

    /// Rolling one-step evaluation.
    ///
    /// Windows are fed one at a time; the last position of each output and
    /// target forms the forecast and truth series of the report.
    ///
    /// # Errors
    ///
    /// Fails if the series has no batchable window.
    pub fn rolling_evaluate<M, G>(
        &self,
        model: &M,
        series: &WindowedSeries,
        valid_forward_fn: &G,
    ) -> Result<RollingEvaluation>
    where
        M: Module<B::InnerBackend>,
        G: Fn(&M, Tensor<B::InnerBackend, 3>) -> Tensor<B::InnerBackend, 3>,
    {
        let inner_device: <B::InnerBackend as Backend>::Device = self.device.clone().into();
        let loader = SequenceLoader::builder(series.clone()).batch_size(1).build()?;
        let loss_fn = MseLoss::new();
        let last = series.window() - 1;

        let mut total_loss = 0.0f32;
        let mut preds = Vec::with_capacity(loader.n_batches());
        let mut truth = Vec::with_capacity(loader.n_batches());

        for batch in loader.iter::<B::InnerBackend>(&inner_device) {
            let output = valid_forward_fn(model, batch.inputs);
            preds.push(last_step(output.clone(), last));
            truth.push(last_step(batch.targets.clone(), last));

            let loss = loss_fn.forward(output, batch.targets, Reduction::Mean);
            total_loss += loss.into_scalar().elem::<f32>();
        }

        let report = ForecastReport::compute(&truth, &preds)?;
        Ok(RollingEvaluation {
            loss: total_loss / preds.len() as f32,
            preds,
            truth,
            report,
        })
    }
}

/// Batches between progress lines: `max(1, n_windows / batch_size)`.
fn log_interval(n_windows: usize, batch_size: usize) -> usize {
    (n_windows / batch_size).max(1)
}

fn last_step<B: Backend>(x: Tensor<B, 3>, last: usize) -> f32 {
    x.slice([0..1, last..last + 1, 0..1])
        .into_scalar()
        .elem::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arimaformer_data::create_inout_sequences;
    use arimaformer_models::{TransAm, TransAmConfig};
    use burn_autodiff::Autodiff;
    use burn_ndarray::NdArray;

    type TestBackend = Autodiff<NdArray>;

    fn toy_series(n: usize, window: usize) -> WindowedSeries {
        let labels: Vec<f32> = (0..n).map(|i| (i as f32 * 0.3).sin() * 0.8).collect();
        let inputs: Vec<f32> = labels.iter().map(|v| v * 0.9).collect();
        create_inout_sequences(&inputs, &labels, window).unwrap()
    }

    fn small_model(device: &<TestBackend as Backend>::Device) -> TransAm<TestBackend> {
        TransAmConfig::default()
            .with_feature_size(8)
            .with_n_heads(2)
            .with_d_ff(16)
            .init(device)
    }

    fn quick_config(n_epochs: usize) -> ForecastTrainerConfig {
        ForecastTrainerConfig {
            n_epochs,
            batch_size: 8,
            eval_batch_size: 16,
            plot_every: 0,
            plot_dir: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_trainer_config_default() {
        let config = ForecastTrainerConfig::default();
        assert_eq!(config.n_epochs, 300);
        assert_eq!(config.lr, 0.005);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.eval_batch_size, 1000);
        assert_eq!(config.plot_every, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ForecastTrainerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TrainError::InvalidConfig(_))));

        let config = ForecastTrainerConfig {
            lr: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_uses_defaults_for_missing_fields() {
        let config: ForecastTrainerConfig = serde_json::from_str(r#"{"n_epochs": 5}"#).unwrap();
        assert_eq!(config.n_epochs, 5);
        assert_eq!(config.lr_gamma, 0.95);
    }

    #[test]
    fn test_fit_records_history() {
        let device = Default::default();
        let series = toy_series(40, 6);
        let trainer = ForecastTrainer::<TestBackend>::new(quick_config(3), device);

        let output = trainer
            .fit_with_forward(
                small_model(&device),
                &series,
                &series,
                |m, x| m.forward(x),
                |m, x| m.forward(x),
            )
            .unwrap();

        assert_eq!(output.train_losses.len(), 3);
        assert_eq!(output.valid_losses.len(), 3);
        assert!(output.train_losses.iter().all(|l| l.is_finite()));
        assert!((1..=3).contains(&output.best_epoch));
        assert!(output.reports.is_empty());
    }

    #[test]
    fn test_rolling_epoch_writes_plot() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let series = toy_series(30, 5);
        let config = ForecastTrainerConfig {
            plot_every: 2,
            plot_dir: Some(dir.path().join("plots")),
            ..quick_config(2)
        };
        let trainer = ForecastTrainer::<TestBackend>::new(config, device);

        let output = trainer
            .fit_with_forward(
                small_model(&device),
                &series,
                &series,
                |m, x| m.forward(x),
                |m, x| m.forward(x),
            )
            .unwrap();

        assert_eq!(output.reports.len(), 1);
        assert_eq!(output.reports[0].0, 2);
        // 25 windows, the last is never batched
        assert_eq!(output.reports[0].1.n, 24);
        assert!(dir.path().join("plots").join("transformer-epoch2.png").exists());
    }

    #[test]
    fn test_evaluate_weights_by_batch_length() {
        let device = Default::default();
        let series = toy_series(30, 5);
        let trainer = ForecastTrainer::<TestBackend>::new(quick_config(1), device);
        let loader = SequenceLoader::builder(series).batch_size(10).build().unwrap();

        // A constant-zero predictor makes every window loss its mean squared label.
        let model = small_model(&device).valid();
        let zero = |_: &TransAm<NdArray>, x: Tensor<NdArray, 3>| x.zeros_like();
        let loss = trainer.evaluate(&model, &loader, &zero);

        let labels = loader.series().labels();
        let expected: f32 = (0..24)
            .map(|i| labels.row(i).iter().map(|v| v * v).sum::<f32>() / 5.0)
            .sum::<f32>()
            / 25.0;
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_nan_label_stops_training() {
        let device = Default::default();
        let mut labels: Vec<f32> = (0..30).map(|i| (i as f32 * 0.3).sin()).collect();
        labels[3] = f32::NAN;
        let series = create_inout_sequences(&labels, &labels, 5).unwrap();
        let trainer = ForecastTrainer::<TestBackend>::new(quick_config(2), device);

        let err = trainer
            .fit_with_forward(
                small_model(&device),
                &series,
                &series,
                |m, x| m.forward(x),
                |m, x| m.forward(x),
            )
            .unwrap_err();

        assert!(
            matches!(err, TrainError::NonFiniteLoss { epoch: 1, batch: 0, loss } if loss.is_nan()),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_series_shorter_than_batch_size() {
        let device = Default::default();
        let series = toy_series(12, 4);
        let config = ForecastTrainerConfig {
            batch_size: 64,
            ..quick_config(2)
        };
        let trainer = ForecastTrainer::<TestBackend>::new(config, device);

        let output = trainer
            .fit_with_forward(
                small_model(&device),
                &series,
                &series,
                |m, x| m.forward(x),
                |m, x| m.forward(x),
            )
            .unwrap();

        assert_eq!(output.train_losses.len(), 2);
        assert!(output.train_losses.iter().all(|l| l.is_finite()));
        assert!(output.valid_losses.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn test_log_interval_never_zero() {
        assert_eq!(log_interval(9, 64), 1);
        assert_eq!(log_interval(0, 8), 1);
        assert_eq!(log_interval(640, 64), 10);
        assert_eq!(log_interval(130, 64), 2);
    }

    #[test]
    fn test_training_clips_to_global_norm() {
        let device = Default::default();
        let series = toy_series(40, 6);
        let model = small_model(&device);
        let loader = SequenceLoader::builder(series).batch_size(8).build().unwrap();
        let batch = loader.iter::<TestBackend>(&device).next().unwrap();

        // Large targets force gradients well above the clip threshold.
        let targets = batch.targets.mul_scalar(100.0);
        let loss = MseLoss::new().forward(model.forward(batch.inputs), targets, Reduction::Mean);
        let grads = GradientsParams::from_grads(loss.backward(), &model);

        let (grads, norm) = clip_grad_norm::<TestBackend, _>(&model, grads, 0.7);
        assert!(norm > 0.7);
        let clipped = crate::clip::global_grad_norm::<TestBackend, _>(&model, &grads);
        assert!(clipped <= 0.7 + 1e-4, "clipped norm {clipped}");
    }

    #[test]
    fn test_rolling_evaluate_collects_last_step() {
        let device = Default::default();
        let series = toy_series(20, 4);
        let trainer = ForecastTrainer::<TestBackend>::new(quick_config(1), device);
        let model = small_model(&device).valid();

        let identity = |_: &TransAm<NdArray>, x: Tensor<NdArray, 3>| x;
        let rolling = trainer.rolling_evaluate(&model, &series, &identity).unwrap();

        assert_eq!(rolling.preds.len(), 15);
        assert_eq!(rolling.preds[0], series.inputs()[[0, 3]]);
        assert_eq!(rolling.truth[0], series.labels()[[0, 3]]);
        assert!(rolling.report.mae > 0.0);
    }
}
