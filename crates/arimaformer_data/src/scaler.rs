//! Min-max range scaling.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Scales values linearly into `feature_range`.
///
/// A constant series has zero range; its scale is taken as 1 so every value
/// maps to the lower bound of the range.
///
/// # Example
///
/// ```rust
/// use arimaformer_data::MinMaxScaler;
///
/// let mut scaler = MinMaxScaler::default();
/// let scaled = scaler.fit_transform(&[0.0, 5.0, 10.0]).unwrap();
/// assert_eq!(scaled, vec![-1.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    data_min: Option<f64>,
    data_max: Option<f64>,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self {
            feature_range: (-1.0, 1.0),
            data_min: None,
            data_max: None,
        }
    }
}

impl MinMaxScaler {
    /// Create an unfitted scaler for the given output range.
    ///
    /// # Errors
    ///
    /// Returns an error unless `low < high`.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !(low < high) {
            return Err(DataError::InvalidInput(format!(
                "feature range must satisfy low < high, got ({low}, {high})"
            )));
        }
        Ok(Self {
            feature_range: (low, high),
            data_min: None,
            data_max: None,
        })
    }

    /// Output range.
    #[must_use]
    pub fn feature_range(&self) -> (f64, f64) {
        self.feature_range
    }

    /// Observed `(min, max)` once fitted.
    #[must_use]
    pub fn data_range(&self) -> Option<(f64, f64)> {
        self.data_min.zip(self.data_max)
    }

    /// Learn the minimum and maximum of `data`.
    pub fn fit(&mut self, data: &[f64]) -> Result<&mut Self> {
        if data.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        if let Some(idx) = data.iter().position(|v| !v.is_finite()) {
            return Err(DataError::InvalidInput(format!(
                "non-finite value at index {idx}"
            )));
        }

        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        self.data_min = Some(min);
        self.data_max = Some(max);
        Ok(self)
    }

    fn scale_and_offset(&self) -> Result<(f64, f64)> {
        let (min, max) = self.data_range().ok_or(DataError::NotFitted)?;
        let (low, high) = self.feature_range;
        let range = if max - min == 0.0 { 1.0 } else { max - min };
        let scale = (high - low) / range;
        Ok((scale, low - min * scale))
    }

    /// Map `data` into the feature range.
    pub fn transform(&self, data: &[f64]) -> Result<Vec<f64>> {
        let (scale, offset) = self.scale_and_offset()?;
        Ok(data.iter().map(|v| v * scale + offset).collect())
    }

    /// Map scaled values back to the original units.
    pub fn inverse_transform(&self, data: &[f64]) -> Result<Vec<f64>> {
        let (scale, offset) = self.scale_and_offset()?;
        Ok(data.iter().map(|v| (v - offset) / scale).collect())
    }

    /// Fit on `data` and transform it.
    pub fn fit_transform(&mut self, data: &[f64]) -> Result<Vec<f64>> {
        self.fit(data)?.transform(data)
    }
}
