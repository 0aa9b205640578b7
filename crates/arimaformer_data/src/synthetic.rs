//! Deterministic synthetic series for demos and tests.

use arimaformer_core::Seed;
use rand::Rng;

/// A trending random walk with AR(1) increments and a daily-like cycle.
///
/// The increments follow `x[t] = 0.6 x[t-1] + 0.05 + u[t]` with
/// `u ~ U(-0.5, 0.5)`, and a sinusoid of period 24 is superimposed, which is
/// the kind of structure an ARIMA(1,1,0) captures only partly.
pub fn random_walk_with_trend(len: usize, seed: Seed) -> Vec<f64> {
    let mut rng = seed.derive("random_walk").to_rng();
    let mut level = 100.0;
    let mut increment = 0.0;

    (0..len)
        .map(|t| {
            increment = 0.6 * increment + 0.05 + rng.gen_range(-0.5..0.5);
            level += increment;
            let cycle = 2.0 * (2.0 * std::f64::consts::PI * t as f64 / 24.0).sin();
            level + cycle
        })
        .collect()
}
