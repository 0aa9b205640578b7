//! Point-forecast error metrics.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Error summary of a one-step-ahead forecast.
///
/// Percentages are relative to the peak-to-peak range of the targets and are
/// `None` when the targets are constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// MAE as a percentage of the target range.
    pub mae_pct: Option<f64>,
    /// RMSE as a percentage of the target range.
    pub rmse_pct: Option<f64>,
    /// Number of evaluated points.
    pub n: usize,
}

impl ForecastReport {
    /// Compare `preds` against `truth`.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Empty`] for empty input and
    /// [`AnalysisError::LengthMismatch`] when the slices differ in length.
    pub fn compute(truth: &[f32], preds: &[f32]) -> Result<Self> {
        if truth.len() != preds.len() {
            return Err(AnalysisError::LengthMismatch {
                truth: truth.len(),
                preds: preds.len(),
            });
        }
        if truth.is_empty() {
            return Err(AnalysisError::Empty);
        }

        let n = truth.len();
        let (abs_sum, sq_sum) = truth
            .iter()
            .zip(preds)
            .fold((0.0f64, 0.0f64), |(abs, sq), (&t, &p)| {
                let err = f64::from(p) - f64::from(t);
                (abs + err.abs(), sq + err * err)
            });
        let mae = abs_sum / n as f64;
        let rmse = (sq_sum / n as f64).sqrt();

        let (lo, hi) = truth.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
            (lo.min(f64::from(t)), hi.max(f64::from(t)))
        });
        let range = hi - lo;
        let pct = |v: f64| (range > 0.0).then(|| v / range * 100.0);

        Ok(Self {
            mae,
            rmse,
            mae_pct: pct(mae),
            rmse_pct: pct(rmse),
            n,
        })
    }

    /// Display the report as a small table.
    pub fn to_string_table(&self) -> String {
        let fmt_pct = |v: Option<f64>| match v {
            Some(v) => format!("{v:>9.3}%"),
            None => format!("{:>10}", "n/a"),
        };

        let mut output = String::new();
        output.push_str("metric        value    % range\n");
        output.push_str(&format!("MAE    {:>12.6} {}\n", self.mae, fmt_pct(self.mae_pct)));
        output.push_str(&format!("RMSE   {:>12.6} {}\n", self.rmse, fmt_pct(self.rmse_pct)));
        output.push_str(&format!("n      {:>12}\n", self.n));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let truth = [0.0, 1.0, 2.0, 4.0];
        let preds = [1.0, 1.0, 2.0, 2.0];
        let report = ForecastReport::compute(&truth, &preds).unwrap();

        assert!((report.mae - 0.75).abs() < 1e-12);
        assert!((report.rmse - (5.0f64 / 4.0).sqrt()).abs() < 1e-12);
        assert!((report.mae_pct.unwrap() - 18.75).abs() < 1e-9);
        assert_eq!(report.n, 4);
    }

    #[test]
    fn test_perfect_forecast() {
        let truth = [0.5, -0.5, 0.25];
        let report = ForecastReport::compute(&truth, &truth).unwrap();
        assert_eq!(report.mae, 0.0);
        assert_eq!(report.rmse, 0.0);
        assert_eq!(report.rmse_pct, Some(0.0));
    }

    #[test]
    fn test_constant_truth_has_no_percentages() {
        let report = ForecastReport::compute(&[1.0, 1.0], &[0.0, 2.0]).unwrap();
        assert_eq!(report.mae, 1.0);
        assert!(report.mae_pct.is_none());
        assert!(report.to_string_table().contains("n/a"));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            ForecastReport::compute(&[], &[]),
            Err(AnalysisError::Empty)
        ));
        assert!(matches!(
            ForecastReport::compute(&[1.0], &[1.0, 2.0]),
            Err(AnalysisError::LengthMismatch { truth: 1, preds: 2 })
        ));
    }
}
