//! ARIMA pre-processing chained with scaling and windowing.

use arimaformer_stats::{ArimaModel, ArimaOrder};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};
use crate::scaler::MinMaxScaler;
use crate::window::{create_inout_sequences, WindowedSeries};

/// Parameters of the data stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// ARIMA order used to pre-process the raw series.
    pub arima_order: ArimaOrder,
    /// Window length fed to the network.
    pub input_window: usize,
    /// Number of trailing windows dropped from each split.
    pub output_window: usize,
    /// Fraction of the series used for training.
    pub train_fraction: f64,
    /// Output range of both scalers.
    pub feature_range: (f64, f64),
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            arima_order: ArimaOrder::default(),
            input_window: 20,
            output_window: 1,
            train_fraction: 0.9,
            feature_range: (-1.0, 1.0),
        }
    }
}

impl DataConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidInput`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.input_window == 0 {
            return Err(DataError::InvalidInput("input_window must be > 0".to_string()));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            return Err(DataError::InvalidInput(format!(
                "train_fraction must be in (0, 1], got {}",
                self.train_fraction
            )));
        }
        MinMaxScaler::new(self.feature_range.0, self.feature_range.1)?;
        Ok(())
    }
}

/// Train and validation windows ready for the network.
///
/// Inputs are the ARIMA one-step predictions, labels the observed values,
/// each min-max scaled on its own. Validation covers the whole series.
#[derive(Debug, Clone)]
pub struct HybridDataset {
    /// Training windows (leading `train_fraction` of the series).
    pub train: WindowedSeries,
    /// Validation windows (entire series).
    pub valid: WindowedSeries,
    /// Scaler fitted on the observed series, for mapping predictions back.
    pub label_scaler: MinMaxScaler,
    /// Scaler fitted on the ARIMA series.
    pub input_scaler: MinMaxScaler,
    /// The fitted ARIMA model.
    pub arima: ArimaModel,
    /// ARIMA one-step predictions for indices `1..=n`, unscaled.
    pub arima_series: Vec<f64>,
}

impl HybridDataset {
    /// Run the full data stage on a raw series.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, ARIMA cannot be fitted, or a
    /// split is too short to yield at least one window.
    pub fn prepare(values: &[f64], config: &DataConfig) -> Result<Self> {
        config.validate()?;
        let n = values.len();

        let arima = ArimaModel::fit(values, config.arima_order)?;
        let arima_series = arima.predict_levels(values, 1, n)?;
        tracing::info!(order = %config.arima_order, n, "ARIMA pre-processing done");

        let (low, high) = config.feature_range;
        let mut input_scaler = MinMaxScaler::new(low, high)?;
        let inputs = to_f32(&input_scaler.fit_transform(&arima_series)?);
        let mut label_scaler = MinMaxScaler::new(low, high)?;
        let labels = to_f32(&label_scaler.fit_transform(values)?);

        let train_len = (config.train_fraction * n as f64) as usize;
        let train = create_inout_sequences(&inputs[..train_len], &labels[..train_len], config.input_window)?
            .drop_last(config.output_window);
        let valid = create_inout_sequences(&inputs, &labels, config.input_window)?
            .drop_last(config.output_window);

        if train.is_empty() || valid.is_empty() {
            return Err(DataError::SeriesTooShort {
                len: train_len,
                window: config.input_window + config.output_window,
            });
        }

        tracing::info!(
            train_windows = train.len(),
            valid_windows = valid.len(),
            window = config.input_window,
            "windowed series"
        );

        Ok(Self {
            train,
            valid,
            label_scaler,
            input_scaler,
            arima,
            arima_series,
        })
    }
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}
