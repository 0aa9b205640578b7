//! ARIMA(p, d, q) estimation and prediction.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Model order of an ARIMA process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new order.
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Minimum number of observations needed to fit this order.
    pub const fn min_observations(&self) -> usize {
        self.p + self.d + self.q + 10
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// A fitted ARIMA model.
///
/// The differenced series `w = Δ^d y` follows
/// `w[t] = c + Σ φ_i w[t-i] + Σ θ_j e[t-j] + e[t]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArimaModel {
    /// Model order.
    pub order: ArimaOrder,
    /// AR coefficients φ_1..φ_p.
    pub ar_coeffs: Vec<f64>,
    /// MA coefficients θ_1..θ_q.
    pub ma_coeffs: Vec<f64>,
    /// Intercept `c` of the differenced process.
    pub constant: f64,
    /// Mean of the differenced process, `c / (1 - Σ φ)`.
    pub mean: f64,
    /// One-step residuals on the differenced series.
    pub residuals: Vec<f64>,
    /// Residual variance.
    pub sigma2: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Bayesian information criterion.
    pub bic: f64,
}

impl ArimaModel {
    /// Fit a model of the given order to `data`.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::NonFinite`] if the series has NaN/inf values,
    /// [`StatsError::InsufficientData`] if it is too short for the order and
    /// [`StatsError::SingularMatrix`] if the regression is degenerate.
    pub fn fit(data: &[f64], order: ArimaOrder) -> Result<Self> {
        check_finite(data)?;

        let needed = order.min_observations();
        if data.len() < needed {
            return Err(StatsError::InsufficientData {
                needed,
                got: data.len(),
            });
        }

        let diff_data = difference(data, order.d);
        let diff_needed = order.p.max(order.q) + 5;
        if diff_data.len() < diff_needed {
            return Err(StatsError::InsufficientData {
                needed: diff_needed + order.d,
                got: data.len(),
            });
        }

        let (ar_coeffs, ma_coeffs, constant) = match (order.p, order.q) {
            (p, 0) => {
                let (ar, c) = estimate_ar(&diff_data, p)?;
                (ar, Vec::new(), c)
            }
            (0, q) => {
                let (ma, mean) = estimate_ma(&diff_data, q);
                (Vec::new(), ma, mean)
            }
            (p, q) => estimate_arma(&diff_data, p, q)?,
        };

        let ar_sum: f64 = ar_coeffs.iter().sum();
        let mean = if (1.0 - ar_sum).abs() > 1e-8 {
            constant / (1.0 - ar_sum)
        } else {
            sample_mean(&diff_data)
        };

        let mut model = Self {
            order,
            ar_coeffs,
            ma_coeffs,
            constant,
            mean,
            residuals: Vec::new(),
            sigma2: 0.0,
            aic: 0.0,
            bic: 0.0,
        };

        let (_, residuals) = model.filter(&diff_data);
        let n = residuals.len() as f64;
        let k = (order.p + order.q + 1) as f64;
        let sigma2 = residuals.iter().map(|r| r * r).sum::<f64>() / n;
        let log_likelihood = -0.5 * n * (1.0 + (2.0 * std::f64::consts::PI * sigma2).ln());

        model.residuals = residuals;
        model.sigma2 = sigma2;
        model.aic = -2.0 * log_likelihood + 2.0 * k;
        model.bic = -2.0 * log_likelihood + k * n.ln();

        tracing::debug!(
            order = %order,
            ar = ?model.ar_coeffs,
            ma = ?model.ma_coeffs,
            constant = model.constant,
            sigma2 = model.sigma2,
            "fitted ARIMA model"
        );

        Ok(model)
    }

    /// One-step-ahead predictions of the differenced series.
    ///
    /// Returns `w.len() + 1` predictions (the last one out of sample) and the
    /// `w.len()` residuals. History before the first observation is taken as
    /// the process mean with zero innovations.
    fn filter(&self, w: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = w.len();
        let mut preds = Vec::with_capacity(n + 1);
        let mut resid = Vec::with_capacity(n);

        for j in 0..=n {
            let mut pred = self.constant;
            for (i, phi) in self.ar_coeffs.iter().enumerate() {
                let lag = i + 1;
                pred += phi * if j >= lag { w[j - lag] } else { self.mean };
            }
            for (i, theta) in self.ma_coeffs.iter().enumerate() {
                let lag = i + 1;
                if j >= lag {
                    pred += theta * resid[j - lag];
                }
            }
            preds.push(pred);
            if j < n {
                resid.push(w[j] - pred);
            }
        }

        (preds, resid)
    }

    /// In-sample one-step-ahead predictions on the original scale.
    ///
    /// Returns predictions for indices `start..=end` of `data`. `end` may equal
    /// `data.len()`, in which case the final value is a true one-step forecast.
    /// For `t >= d` the prediction is the differenced-series prediction plus the
    /// lower-order differences observed at `t - 1`; for `t < d` the previous
    /// observation is used.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidRange`] unless `1 <= start <= end <= data.len()`.
    pub fn predict_levels(&self, data: &[f64], start: usize, end: usize) -> Result<Vec<f64>> {
        check_finite(data)?;
        let n = data.len();
        let d = self.order.d;
        if start == 0 || start > end || end > n || n <= d {
            return Err(StatsError::InvalidRange { start, end, len: n });
        }

        let w = difference(data, d);
        let (w_preds, _) = self.filter(&w);
        let lower: Vec<Vec<f64>> = (0..d).map(|k| difference(data, k)).collect();

        let preds = (start..=end)
            .map(|t| {
                if t < d {
                    return data[t - 1];
                }
                let base: f64 = lower
                    .iter()
                    .enumerate()
                    .map(|(k, diff_k)| diff_k[t - 1 - k])
                    .sum();
                w_preds[t - d] + base
            })
            .collect();

        Ok(preds)
    }

    /// Forecast `h` steps past the end of `data`, on the original scale.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is non-finite or shorter than `d + 1`.
    pub fn forecast(&self, data: &[f64], h: usize) -> Result<Vec<f64>> {
        check_finite(data)?;
        let d = self.order.d;
        if data.len() <= d {
            return Err(StatsError::InsufficientData {
                needed: d + 1,
                got: data.len(),
            });
        }

        let w = difference(data, d);
        let (_, mut resid) = self.filter(&w);
        let mut extended = w;
        let mut forecasts = Vec::with_capacity(h);

        for _ in 0..h {
            let j = extended.len();
            let mut pred = self.constant;
            for (i, phi) in self.ar_coeffs.iter().enumerate() {
                let lag = i + 1;
                pred += phi * if j >= lag { extended[j - lag] } else { self.mean };
            }
            for (i, theta) in self.ma_coeffs.iter().enumerate() {
                let lag = i + 1;
                if j >= lag {
                    pred += theta * resid[j - lag];
                }
            }
            extended.push(pred);
            resid.push(0.0);
            forecasts.push(pred);
        }

        for k in (0..d).rev() {
            let last = difference(data, k).last().copied().unwrap_or(0.0);
            forecasts = integrate(&forecasts, last);
        }

        Ok(forecasts)
    }

    /// Human-readable coefficient table.
    pub fn summary(&self) -> String {
        let mut s = format!("{} Model Summary\n", self.order);
        s.push_str(&"=".repeat(40));
        s.push('\n');

        if !self.ar_coeffs.is_empty() {
            s.push_str("AR Coefficients:\n");
            for (i, c) in self.ar_coeffs.iter().enumerate() {
                s.push_str(&format!("  phi{} = {:.6}\n", i + 1, c));
            }
        }

        if !self.ma_coeffs.is_empty() {
            s.push_str("MA Coefficients:\n");
            for (i, c) in self.ma_coeffs.iter().enumerate() {
                s.push_str(&format!("  theta{} = {:.6}\n", i + 1, c));
            }
        }

        s.push_str(&format!("Constant: {:.6}\n", self.constant));
        s.push_str(&format!("Mean:     {:.6}\n", self.mean));
        s.push_str(&format!("Sigma2:   {:.6}\n", self.sigma2));
        s.push_str(&format!("AIC:      {:.2}\n", self.aic));
        s.push_str(&format!("BIC:      {:.2}\n", self.bic));
        s
    }
}

/// Difference a series `d` times.
pub fn difference(data: &[f64], d: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Cumulative sum of `diff` starting from `start` (inverse of one differencing).
pub fn integrate(diff: &[f64], start: f64) -> Vec<f64> {
    let mut cumsum = start;
    diff.iter()
        .map(|d| {
            cumsum += d;
            cumsum
        })
        .collect()
}

fn check_finite(data: &[f64]) -> Result<()> {
    match data.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(StatsError::NonFinite(idx)),
        None => Ok(()),
    }
}

fn sample_mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        0.0
    } else {
        data.iter().sum::<f64>() / data.len() as f64
    }
}

/// Ordinary least squares, `β = (X'X)^-1 X'y`.
fn ols(rows: usize, cols: usize, x_data: &[f64], y: Vec<f64>, what: &'static str) -> Result<DVector<f64>> {
    let x = DMatrix::from_row_slice(rows, cols, x_data);
    let y = DVector::from_vec(y);

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;
    let xtx_inv = xtx.try_inverse().ok_or(StatsError::SingularMatrix(what))?;
    Ok(xtx_inv * xty)
}

/// AR(p) with intercept by conditional least squares. Returns (φ, c).
fn estimate_ar(data: &[f64], p: usize) -> Result<(Vec<f64>, f64)> {
    let n = data.len();
    if n < p + 2 {
        return Err(StatsError::InsufficientData { needed: p + 2, got: n });
    }

    let rows = n - p;
    let mut x_data = Vec::with_capacity(rows * (p + 1));
    for t in p..n {
        x_data.push(1.0);
        for i in 1..=p {
            x_data.push(data[t - i]);
        }
    }

    let beta = ols(rows, p + 1, &x_data, data[p..].to_vec(), "AR coefficients")?;
    Ok((beta.iter().skip(1).copied().collect(), beta[0]))
}

/// Pure MA(q) by iterative regression on the demeaned series. Returns (θ, mean).
fn estimate_ma(data: &[f64], q: usize) -> (Vec<f64>, f64) {
    const MAX_ITER: usize = 100;
    const TOL: f64 = 1e-6;

    let mean = sample_mean(data);
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();
    let n = centered.len();
    let mut coeffs = vec![0.0; q];

    for _ in 0..MAX_ITER {
        let resid = ma_residuals(&centered, &coeffs);

        let mut next = vec![0.0; q];
        for (i, coeff) in next.iter_mut().enumerate() {
            let mut num = 0.0;
            let mut den = 0.0;
            for t in (i + 1)..n {
                num += centered[t] * resid[t - i - 1];
                den += resid[t - i - 1] * resid[t - i - 1];
            }
            if den > 0.0 {
                *coeff = num / den;
            }
        }

        let delta: f64 = coeffs.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
        coeffs = next;
        if delta < TOL {
            break;
        }
    }

    (coeffs, mean)
}

fn ma_residuals(data: &[f64], coeffs: &[f64]) -> Vec<f64> {
    let mut resid = vec![0.0; data.len()];
    for t in 0..data.len() {
        let ma: f64 = coeffs
            .iter()
            .enumerate()
            .filter(|(i, _)| t > *i)
            .map(|(i, theta)| theta * resid[t - i - 1])
            .sum();
        resid[t] = data[t] - ma;
    }
    resid
}

/// ARMA(p, q) by the two-step Hannan-Rissanen procedure. Returns (φ, θ, c).
fn estimate_arma(data: &[f64], p: usize, q: usize) -> Result<(Vec<f64>, Vec<f64>, f64)> {
    let n = data.len();
    let mean = sample_mean(data);
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();

    // Long autoregression for innovation proxies.
    let long_order = (p + q).max(10).min(n / 4).max(1);
    let (long_ar, long_c) = estimate_ar(&centered, long_order)?;
    let mut proxies = vec![0.0; n];
    for t in long_order..n {
        let fitted: f64 = long_c
            + long_ar
                .iter()
                .enumerate()
                .map(|(i, phi)| phi * centered[t - i - 1])
                .sum::<f64>();
        proxies[t] = centered[t] - fitted;
    }

    let start = p.max(long_order + q);
    if n < start + p + q + 2 {
        return Err(StatsError::InsufficientData {
            needed: start + p + q + 2,
            got: n,
        });
    }

    let rows = n - start;
    let cols = p + q + 1;
    let mut x_data = Vec::with_capacity(rows * cols);
    for t in start..n {
        x_data.push(1.0);
        for i in 1..=p {
            x_data.push(centered[t - i]);
        }
        for j in 1..=q {
            x_data.push(proxies[t - j]);
        }
    }

    let beta = ols(rows, cols, &x_data, centered[start..].to_vec(), "ARMA coefficients")?;
    let ar: Vec<f64> = beta.iter().skip(1).take(p).copied().collect();
    let ma: Vec<f64> = beta.iter().skip(1 + p).take(q).copied().collect();
    let constant = mean * (1.0 - ar.iter().sum::<f64>()) + beta[0];

    Ok((ar, ma, constant))
}
