//! Run driver: wires config, investor, ledger and metrics together.
//!
//! `run_backtest` is what the CLI calls. It builds an `XgbInvestor` from the
//! config, picks the simulated range and returns a `RunResult` holding the
//! ledger report plus the run summary.

use boostlab_core::domain::PriceSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::dataset_hash;
use crate::investor::{Investor, InvestorError};
use crate::ledger::{DateRange, Ledger, LedgerError, LedgerReport};
use crate::metrics::PerformanceMetrics;
use crate::xgb_investor::{RetrainPolicy, XgbInvestor};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("investor error: {0}")]
    Investor(#[from] InvestorError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("{bars} bars are not enough history to train the model")]
    NotEnoughHistory { bars: usize },
}

/// Current schema version of `summary.json`.
pub const SCHEMA_VERSION: u32 = 1;

/// The trained model behind the last morning decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub trained_through: chrono::NaiveDate,
    pub training_rows: usize,
    pub positive_labels: usize,
    pub schema_fingerprint: String,
    pub columns: Vec<String>,
    /// Gain importance, highest first.
    pub feature_importance: Vec<(String, f64)>,
}

/// Everything `summary.json` carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub investor: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub initial_investment: f64,
    pub final_value: f64,
    pub retrain: RetrainPolicy,
    pub window: usize,
    pub trainings: usize,
    pub metrics: PerformanceMetrics,
    pub model: Option<ModelSummary>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub summary: RunSummary,
    pub report: LedgerReport,
}

/// Simulate the configured strategy over `series`.
///
/// Without a `start_date` the run begins on the first day the model can be
/// trained; an explicit start that is too early fails on that morning.
pub fn run_backtest(config: &RunConfig, series: &PriceSeries, has_synthetic: bool) -> Result<RunResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let mut investor = XgbInvestor::new(config.initial_investment, config.model_params(), config.retrain)?;

    let start = match config.start_date {
        Some(date) => Some(date),
        None => {
            let first = investor
                .first_tradable_day(series)
                .ok_or(RunError::NotEnoughHistory { bars: series.len() })?;
            let date = series.bars()[first].date;
            tracing::info!("no start_date configured; first tradable day is {date}");
            Some(date)
        }
    };
    let range = DateRange::new(start, config.end_date);

    tracing::info!(
        "run {}: {} bars, window {}, retrain {:?}",
        &run_id[..12],
        series.len(),
        config.window,
        config.retrain
    );
    let report = Ledger::run(series, &mut investor, range)?;

    let model = investor.trained().map(|trained| {
        let mut feature_importance = trained.feature_importance();
        feature_importance.sort_by(|a, b| b.1.total_cmp(&a.1));
        ModelSummary {
            trained_through: trained.trained_through(),
            training_rows: trained.training_rows(),
            positive_labels: trained.positive_labels(),
            schema_fingerprint: trained.schema().fingerprint(),
            columns: trained.schema().columns().to_vec(),
            feature_importance,
        }
    });
    let trainings = investor.predictions().iter().filter(|p| p.retrained).count();

    let summary = RunSummary {
        schema_version: SCHEMA_VERSION,
        run_id,
        investor: investor.name().to_string(),
        dataset_hash: dataset_hash(series),
        has_synthetic,
        start_date: report.start_date,
        end_date: report.end_date,
        initial_investment: report.initial_investment,
        final_value: report.final_value(),
        retrain: config.retrain,
        window: config.window,
        trainings,
        metrics: report.metrics.clone(),
        model,
    };
    Ok(RunResult { summary, report })
}
