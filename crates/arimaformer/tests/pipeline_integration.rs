//! Integration tests for the full forecasting pipeline.
//!
//! These tests run a tiny experiment end to end on synthetic data.

use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;

use arimaformer::data::synthetic::random_walk_with_trend;
use arimaformer::prelude::*;

type TrainBackend = Autodiff<NdArray>;

fn tiny_config(dir: &std::path::Path) -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.seed = Seed::new(42);
    config.data.input_window = 8;
    config.model = TransAmConfig::default()
        .with_feature_size(8)
        .with_n_heads(2)
        .with_d_ff(16);
    config.train = ForecastTrainerConfig {
        n_epochs: 2,
        batch_size: 16,
        eval_batch_size: 64,
        plot_every: 2,
        plot_dir: Some(dir.join("plots")),
        ..Default::default()
    };
    config
}

#[test]
fn test_experiment_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("series.csv");
    let values = random_walk_with_trend(120, Seed::new(3));
    write_value_column(&csv_path, "Value", &values).unwrap();

    let mut config = tiny_config(dir.path());
    config.data_path = Some(csv_path);

    let output = run_experiment::<TrainBackend>(&config, Default::default()).unwrap();

    // 120 points, window 8: 112 windows, 111 after dropping the last.
    assert_eq!(output.data.valid.len(), 111);
    // floor(0.9 * 120) = 108 points: 100 windows, 99 after dropping the last.
    assert_eq!(output.data.train.len(), 99);

    assert_eq!(output.training.train_losses.len(), 2);
    assert_eq!(output.training.valid_losses.len(), 2);
    assert!(output.training.train_losses.iter().all(|l| l.is_finite()));
    assert_eq!(output.training.reports.len(), 1);

    assert_eq!(output.final_report.n, 110);
    assert_eq!(output.arima_report.n, 110);
    assert!(output.final_report.mae.is_finite());
    assert!(output.arima_report.mae > 0.0);

    // Rolling truth is y[7..117]; ARIMA predicts y[t] at arima_series[t - 1].
    let truth: Vec<f32> = values[7..117].iter().map(|&v| v as f32).collect();
    let arima: Vec<f32> = output.data.arima_series[6..116]
        .iter()
        .map(|&v| v as f32)
        .collect();
    let expected = ForecastReport::compute(&truth, &arima).unwrap();
    let tol = 1e-3 * expected.mae.max(1.0);
    assert!((output.arima_report.mae - expected.mae).abs() < tol);
    assert!((output.arima_report.rmse - expected.rmse).abs() < tol);

    assert!(dir.path().join("plots").join("transformer-epoch2.png").exists());
}

#[test]
fn test_series_too_short() {
    let dir = tempfile::tempdir().unwrap();
    let values = random_walk_with_trend(10, Seed::new(6));
    let config = tiny_config(dir.path());

    let result = run_on_series::<TrainBackend>(&config, &values, Default::default());
    assert!(result.is_err());
}
