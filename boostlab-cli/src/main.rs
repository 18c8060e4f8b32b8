//! BoostLab CLI — backtest, single-prediction and schema commands.
//!
//! Commands:
//! - `run` — simulate the XGB investor from a TOML config over a price file
//! - `predict` — train on a price file and print tomorrow-morning's allocation
//! - `schema` — print the expanded feature columns the model is trained on

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boostlab_core::features::WarmupPolicy;
use boostlab_core::{DirectionModel, ModelParams};
use boostlab_runner::{load_csv, run_backtest, save_artifacts, synthetic_series, RunConfig, RunResult};

#[derive(Parser)]
#[command(
    name = "boostlab",
    about = "BoostLab CLI — gradient-boosted next-day direction investor"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Daily price CSV (Date,Open,High,Low,Close,Volume).
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Use deterministic synthetic prices instead of a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed label for synthetic prices.
        #[arg(long, default_value = "SPY")]
        synthetic_seed: String,

        /// First synthetic date (YYYY-MM-DD).
        #[arg(long, default_value = "2018-01-02")]
        synthetic_start: String,

        /// Last synthetic date (YYYY-MM-DD).
        #[arg(long, default_value = "2023-12-29")]
        synthetic_end: String,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Train on a price file and print the next morning allocation.
    Predict {
        /// Daily price CSV (Date,Open,High,Low,Close,Volume).
        #[arg(long)]
        prices: PathBuf,

        /// Lagged copies per feature. Ignored with --config.
        #[arg(long, default_value_t = 2)]
        window: usize,

        /// Drop rows with indicator warm-up values instead of filling them.
        #[arg(long, default_value_t = false)]
        drop_warmup: bool,

        /// Take model parameters from a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the expanded feature schema.
    Schema {
        /// Lagged copies per feature. Ignored with --config.
        #[arg(long, default_value_t = 2)]
        window: usize,

        /// Take the feature layout from a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            prices,
            synthetic,
            synthetic_seed,
            synthetic_start,
            synthetic_end,
            output_dir,
        } => run_cmd(
            config,
            prices,
            synthetic.then_some((synthetic_seed, synthetic_start, synthetic_end)),
            output_dir,
        ),
        Commands::Predict {
            prices,
            window,
            drop_warmup,
            config,
        } => predict_cmd(prices, window, drop_warmup, config),
        Commands::Schema { window, config } => schema_cmd(window, config),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

fn run_cmd(
    config_path: PathBuf,
    prices: Option<PathBuf>,
    synthetic: Option<(String, String, String)>,
    output_dir: PathBuf,
) -> Result<()> {
    let config = RunConfig::from_file(&config_path)?;
    tracing::info!("loaded config {}", config_path.display());

    let (series, has_synthetic) = match (prices, synthetic) {
        (Some(_), Some(_)) => bail!("--prices and --synthetic are mutually exclusive"),
        (None, None) => bail!("one of --prices or --synthetic is required"),
        (Some(path), None) => (load_csv(&path)?, false),
        (None, Some((seed, start, end))) => (synthetic_series(&seed, parse_date(&start)?, parse_date(&end)?)?, true),
    };

    let result = run_backtest(&config, &series, has_synthetic)?;
    print_summary(&result);

    let paths = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", paths.dir.display());
    Ok(())
}

fn model_params(window: usize, warmup: WarmupPolicy, config: Option<PathBuf>) -> Result<ModelParams> {
    Ok(match config {
        Some(path) => RunConfig::from_file(&path)?.model_params(),
        None => ModelParams {
            window,
            warmup,
            ..ModelParams::default()
        },
    })
}

fn predict_cmd(prices: PathBuf, window: usize, drop_warmup: bool, config: Option<PathBuf>) -> Result<()> {
    let warmup = if drop_warmup {
        WarmupPolicy::Undefined
    } else {
        WarmupPolicy::LibraryFill
    };
    let model = DirectionModel::new(model_params(window, warmup, config)?)?;
    let series = load_csv(&prices)?;
    let Some(last) = series.last_date() else {
        bail!("price file has no bars");
    };

    let trained = model.train(series.bars())?;
    let fraction = model.predict_allocation_fraction(series.bars(), &trained)?;

    println!();
    println!("=== Morning Decision ===");
    println!("Latest bar:     {last}");
    println!("Trained on:     {} rows through {}", trained.training_rows(), trained.trained_through());
    println!("Up days:        {}", trained.positive_labels());
    println!("Columns:        {}", trained.schema().len());
    println!("Allocation:     {:.0}%", fraction * 100.0);
    println!();
    Ok(())
}

fn schema_cmd(window: usize, config: Option<PathBuf>) -> Result<()> {
    let model = DirectionModel::new(model_params(window, WarmupPolicy::default(), config)?)?;
    let schema = model.schema();
    for (i, name) in schema.columns().iter().enumerate() {
        println!("{i:>3}  {name}");
    }
    println!("fingerprint: {}", schema.fingerprint());
    Ok(())
}

fn print_summary(result: &RunResult) {
    let summary = &result.summary;
    let metrics = &summary.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", summary.run_id);
    println!("Investor:       {}", summary.investor);
    println!("Period:         {} to {}", summary.start_date, summary.end_date);
    println!("Days:           {} ({} invested)", metrics.trading_days, metrics.invested_days);
    println!("Trainings:      {} ({:?})", summary.trainings, summary.retrain);
    println!();
    println!("--- Performance ---");
    println!("Initial Value:  {:.2}", summary.initial_investment);
    println!("Final Value:    {:.2}", summary.final_value);
    println!("Total Return:   {:.2}%", metrics.total_return * 100.0);
    println!("CAGR:           {:.2}%", metrics.cagr * 100.0);
    println!("Sharpe:         {:.3}", metrics.sharpe);
    println!("Max Drawdown:   {:.2}%", metrics.max_drawdown * 100.0);
    if let Some(model) = &summary.model {
        println!();
        println!("--- Top Features ---");
        for (name, gain) in model.feature_importance.iter().take(5) {
            println!("{name:<24}{:.3}", gain);
        }
    }
    if summary.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
