//! End-to-end experiment: ARIMA pre-processing, Transformer training, final report.

use std::path::{Path, PathBuf};

use arimaformer_analysis::ForecastReport;
use arimaformer_core::Seed;
use arimaformer_data::{read_value_column, DataConfig, HybridDataset, DEFAULT_VALUE_COLUMN};
use arimaformer_models::{TransAm, TransAmConfig};
use arimaformer_train::{ForecastOutput, ForecastTrainer, ForecastTrainerConfig};
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};

/// Every knob of a run, loadable from JSON.
///
/// Missing fields take their defaults, so `{}` is a valid file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// CSV file holding the series.
    pub data_path: Option<PathBuf>,
    /// Column of the CSV to read.
    pub column: String,
    /// Seed for weight initialization.
    pub seed: Seed,
    /// ARIMA, scaling and windowing.
    pub data: DataConfig,
    /// Network shape.
    pub model: TransAmConfig,
    /// Optimization and evaluation.
    pub train: ForecastTrainerConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            column: DEFAULT_VALUE_COLUMN.to_string(),
            seed: Seed::default(),
            data: DataConfig::default(),
            model: TransAmConfig::default(),
            train: ForecastTrainerConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Fails only if serialization itself fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate all sections together.
    ///
    /// # Errors
    ///
    /// Returns the first section error, or a core error if the window does
    /// not fit the model's positional table.
    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.model.validate()?;
        self.model.check_window(self.data.input_window)?;
        self.train.validate()?;
        Ok(())
    }
}

/// Everything produced by a run.
#[derive(Debug)]
pub struct ExperimentOutput<B: AutodiffBackend> {
    /// Training history and best model.
    pub training: ForecastOutput<TransAm<B>>,
    /// Prepared windows, scalers and the fitted ARIMA model.
    pub data: HybridDataset,
    /// Rolling one-step errors of the best model, in original units.
    pub final_report: ForecastReport,
    /// Errors of ARIMA's own one-step prediction of each rolling truth point,
    /// in original units.
    pub arima_report: ForecastReport,
}

/// Run an experiment on the series named by `config.data_path`.
///
/// # Errors
///
/// Fails with [`ExperimentError::MissingDataPath`] when no path is set, and
/// otherwise as [`run_on_series`].
pub fn run_experiment<B: AutodiffBackend>(
    config: &ExperimentConfig,
    device: B::Device,
) -> Result<ExperimentOutput<B>> {
    let path = config
        .data_path
        .as_ref()
        .ok_or(ExperimentError::MissingDataPath)?;
    let values = read_value_column(path, &config.column)?;
    tracing::info!(path = %path.display(), column = %config.column, n = values.len(), "loaded series");
    run_on_series(config, &values, device)
}

/// Run an experiment on an in-memory series.
///
/// # Errors
///
/// Fails on an invalid configuration, when ARIMA cannot be fitted or the
/// series is too short for the window, and on any training error.
pub fn run_on_series<B: AutodiffBackend>(
    config: &ExperimentConfig,
    values: &[f64],
    device: B::Device,
) -> Result<ExperimentOutput<B>> {
    config.validate()?;
    config.seed.seed_backend::<B>();

    let data = HybridDataset::prepare(values, &config.data)?;
    let model: TransAm<B> = config.model.init(&device);
    tracing::info!(
        feature_size = config.model.feature_size,
        n_heads = config.model.n_heads,
        n_layers = config.model.n_layers,
        "model initialized"
    );

    let trainer = ForecastTrainer::<B>::new(config.train.clone(), device);
    let training = trainer.fit_with_forward(
        model,
        &data.train,
        &data.valid,
        |m, x| m.forward(x),
        |m, x| m.forward(x),
    )?;

    let best = training.model.clone().valid();
    let rolling = trainer.rolling_evaluate(&best, &data.valid, &|m: &TransAm<B::InnerBackend>, x| {
        m.forward(x)
    })?;

    let to_f64 = |v: &[f32]| v.iter().map(|&x| f64::from(x)).collect::<Vec<_>>();
    let preds = data.label_scaler.inverse_transform(&to_f64(&rolling.preds))?;
    let truth = data.label_scaler.inverse_transform(&to_f64(&rolling.truth))?;
    let final_report = ForecastReport::compute(&to_f32(&truth), &to_f32(&preds))?;

    let (skip, arima_preds) =
        arima_baseline(&data.arima_series, config.data.input_window, truth.len());
    let arima_truth = &truth[skip..skip + arima_preds.len()];
    let arima_report = ForecastReport::compute(&to_f32(arima_truth), &to_f32(arima_preds))?;

    tracing::info!(
        mae = final_report.mae,
        rmse = final_report.rmse,
        arima_mae = arima_report.mae,
        arima_rmse = arima_report.rmse,
        "final evaluation in original units"
    );

    Ok(ExperimentOutput {
        training,
        data,
        final_report,
        arima_report,
    })
}

/// ARIMA predictions aligned with the rolling truth series.
///
/// Truth `k` is `y[k + window - 1]`, which ARIMA predicts at
/// `arima_series[k + window - 2]`. With a window of one the first truth point
/// has no prediction; the returned count says how many leading truth values
/// to drop.
fn arima_baseline(arima_series: &[f64], window: usize, count: usize) -> (usize, &[f64]) {
    let skip = usize::from(window < 2);
    let start = (window + skip).saturating_sub(2);
    let end = (start + count.saturating_sub(skip)).min(arima_series.len());
    (skip, &arima_series[start.min(end)..end])
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_json() {
        let config = ExperimentConfig::default();
        let json = config.to_json_pretty().unwrap();
        let back: ExperimentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.column, "Value");
        assert_eq!(back.train.n_epochs, 300);
        assert_eq!(back.model.feature_size, 250);
        assert_eq!(back.data.input_window, 20);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"seed": 7, "train": {"n_epochs": 3}}"#).unwrap();

        let config = ExperimentConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed.value(), 7);
        assert_eq!(config.train.n_epochs, 3);
        assert_eq!(config.train.batch_size, 64);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_validate_rejects_window_beyond_table() {
        let mut config = ExperimentConfig::default();
        config.model.max_len = 10;
        assert!(matches!(config.validate(), Err(ExperimentError::Core(_))));
    }

    #[test]
    fn test_arima_baseline_predicts_the_truth_point() {
        // arima_series[j] is the prediction of y[j + 1].
        let arima_series: Vec<f64> = (1..=20).map(f64::from).collect();

        // window 8: truth starts at y[7], predicted by arima_series[6]
        let (skip, preds) = arima_baseline(&arima_series, 8, 5);
        assert_eq!(skip, 0);
        assert_eq!(preds, &[7.0, 8.0, 9.0, 10.0, 11.0]);

        // window 1: y[0] has no prediction
        let (skip, preds) = arima_baseline(&arima_series, 1, 4);
        assert_eq!(skip, 1);
        assert_eq!(preds, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_data_path() {
        type B = burn_autodiff::Autodiff<burn_ndarray::NdArray>;
        let result = run_experiment::<B>(&ExperimentConfig::default(), Default::default());
        assert!(matches!(result, Err(ExperimentError::MissingDataPath)));
    }
}
