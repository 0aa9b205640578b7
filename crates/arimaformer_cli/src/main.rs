//! arimaformer CLI: train the hybrid forecaster, fit ARIMA, generate data.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arimaformer::data::synthetic::random_walk_with_trend;
use arimaformer::data::DEFAULT_VALUE_COLUMN;
use arimaformer::prelude::*;
use burn_autodiff::Autodiff;

/// Backend type for training.
#[cfg(not(feature = "backend-wgpu"))]
type TrainBackend = Autodiff<burn_ndarray::NdArray>;

/// Backend type for training.
#[cfg(feature = "backend-wgpu")]
type TrainBackend = Autodiff<burn_wgpu::Wgpu>;

#[derive(Parser)]
#[command(name = "arimaformer")]
#[command(author, version)]
#[command(about = "Hybrid ARIMA + Transformer forecasting for univariate series")]
#[command(long_about = "arimaformer: ARIMA one-step predictions refined by a causal Transformer.

EXAMPLES:
  # Generate a synthetic series
  arimaformer generate --output series.csv --len 2000

  # Fit ARIMA(1,1,0) and forecast 10 steps
  arimaformer arima --data series.csv --horizon 10

  # Train with the default configuration
  arimaformer train --data series.csv

  # Train from a config file, overriding the epoch count
  arimaformer config > run.json
  arimaformer train --config run.json --data series.csv --epochs 50")]
struct Cli {
    /// Increase verbosity (-v for batch progress, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the Transformer on ARIMA predictions of a CSV series
    Train(TrainArgs),
    /// Fit an ARIMA model and print its summary, errors and forecast
    Arima {
        /// CSV file with a header row
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Column holding the series
        #[arg(long, default_value = DEFAULT_VALUE_COLUMN, value_name = "NAME")]
        column: String,

        /// Autoregressive order
        #[arg(long, default_value = "1")]
        p: usize,

        /// Differencing order
        #[arg(long, default_value = "1")]
        d: usize,

        /// Moving-average order
        #[arg(long, default_value = "0")]
        q: usize,

        /// Out-of-sample steps to forecast
        #[arg(long, default_value = "10", value_name = "N")]
        horizon: usize,
    },
    /// Write a synthetic series to CSV
    Generate {
        /// Output CSV path
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        /// Number of points
        #[arg(long, default_value = "2000", value_name = "N")]
        len: usize,

        /// Random seed
        #[arg(long, default_value = "0", value_name = "SEED")]
        seed: u64,
    },
    /// Print the default experiment configuration as JSON
    Config,
}

#[derive(clap::Args)]
struct TrainArgs {
    /// JSON experiment configuration (flags below override it)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CSV file with a header row
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Column holding the series
    #[arg(long, value_name = "NAME")]
    column: Option<String>,

    /// Number of training epochs
    #[arg(long, value_name = "N")]
    epochs: Option<usize>,

    /// Initial learning rate
    #[arg(long, value_name = "LR")]
    lr: Option<f64>,

    /// Training batch size
    #[arg(long, value_name = "SIZE")]
    batch_size: Option<usize>,

    /// Input window length
    #[arg(long, value_name = "N")]
    window: Option<usize>,

    /// Directory for plots and the run summary
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Random seed for weight initialization
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Skip rolling-evaluation plots
    #[arg(long, default_value = "false")]
    no_plots: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Train(args) => handle_train(args),
        Commands::Arima {
            data,
            column,
            p,
            d,
            q,
            horizon,
        } => handle_arima(data, column, ArimaOrder { p, d, q }, horizon),
        Commands::Generate { output, len, seed } => handle_generate(output, len, seed),
        Commands::Config => handle_config(),
    }
}

/// Merge the config file with flag overrides; also returns the summary directory.
fn build_config(args: TrainArgs) -> Result<(ExperimentConfig, Option<PathBuf>)> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => ExperimentConfig::default(),
    };

    if let Some(data) = args.data {
        config.data_path = Some(data);
    }
    if let Some(column) = args.column {
        config.column = column;
    }
    if let Some(epochs) = args.epochs {
        config.train.n_epochs = epochs;
    }
    if let Some(lr) = args.lr {
        config.train.lr = lr;
    }
    if let Some(batch_size) = args.batch_size {
        config.train.batch_size = batch_size;
    }
    if let Some(window) = args.window {
        config.data.input_window = window;
    }
    if let Some(seed) = args.seed {
        config.seed = Seed::new(seed);
    }
    if let Some(output) = &args.output {
        config.train.plot_dir = Some(output.clone());
    }
    let summary_dir = args.output.or_else(|| config.train.plot_dir.clone());
    if args.no_plots {
        config.train.plot_dir = None;
    }

    if config.data_path.is_none() {
        bail!("No input series: pass --data or set data_path in the config file");
    }
    Ok((config, summary_dir))
}

fn handle_train(args: TrainArgs) -> Result<()> {
    let (config, summary_dir) = build_config(args)?;
    config.validate().context("Invalid configuration")?;

    let device: <TrainBackend as burn::tensor::backend::Backend>::Device = Default::default();
    tracing::info!(?device, "using device");

    let output = run_experiment::<TrainBackend>(&config, device).context("Training failed")?;

    println!();
    println!(
        "Best validation loss: {:.6} at epoch {}",
        output.training.best_valid_loss, output.training.best_epoch
    );
    println!("Training time: {:.1}s", output.training.training_time_secs);
    println!();
    println!("Transformer (original units):");
    print!("{}", output.final_report.to_string_table());
    println!();
    println!("ARIMA one-step baseline (original units):");
    print!("{}", output.arima_report.to_string_table());

    if let Some(dir) = &summary_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create '{}'", dir.display()))?;
        let summary = serde_json::json!({
            "config": config,
            "train_losses": output.training.train_losses,
            "valid_losses": output.training.valid_losses,
            "best_epoch": output.training.best_epoch,
            "best_valid_loss": output.training.best_valid_loss,
            "final_report": output.final_report,
            "arima_report": output.arima_report,
        });
        let path = dir.join("summary.json");
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        println!();
        println!("Summary written to {}", path.display());
    }

    Ok(())
}

fn handle_arima(data: PathBuf, column: String, order: ArimaOrder, horizon: usize) -> Result<()> {
    let values = read_value_column(&data, &column)
        .with_context(|| format!("Failed to read column '{}' of '{}'", column, data.display()))?;
    let model = ArimaModel::fit(&values, order).with_context(|| format!("Failed to fit {order}"))?;

    println!("{}", model.summary());

    let n = values.len();
    let preds = model.predict_levels(&values, 1, n - 1)?;
    let truth: Vec<f32> = values[1..].iter().map(|&v| v as f32).collect();
    let preds: Vec<f32> = preds.iter().map(|&v| v as f32).collect();
    let report = ForecastReport::compute(&truth, &preds)?;
    println!("In-sample one-step errors:");
    print!("{}", report.to_string_table());

    if horizon > 0 {
        let forecast = model.forecast(&values, horizon)?;
        println!();
        println!("Forecast:");
        for (h, value) in forecast.iter().enumerate() {
            println!("  t+{:<3} {:.6}", h + 1, value);
        }
    }

    Ok(())
}

fn handle_generate(output: PathBuf, len: usize, seed: u64) -> Result<()> {
    let values = random_walk_with_trend(len, Seed::new(seed));
    write_value_column(&output, DEFAULT_VALUE_COLUMN, &values)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    println!("Wrote {} points to {}", len, output.display());
    Ok(())
}

fn handle_config() -> Result<()> {
    println!("{}", ExperimentConfig::default().to_json_pretty()?);
    Ok(())
}
