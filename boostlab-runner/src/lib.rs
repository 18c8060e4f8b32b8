//! BoostLab Runner — investor strategy, portfolio ledger, configuration and artifacts.
//!
//! This crate builds on `boostlab-core` to provide:
//! - The `Investor` abstraction and its cash/market account
//! - The gradient-boosted direction investor (`XgbInvestor`)
//! - A day-by-day ledger with morning and afternoon sessions
//! - TOML run configuration with content-addressed run ids
//! - CSV price loading and a synthetic fallback
//! - Performance metrics and run artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod investor;
pub mod ledger;
pub mod metrics;
pub mod runner;
pub mod xgb_investor;

pub use config::{ConfigError, RunConfig};
pub use data_loader::{generate_synthetic_bars, load_csv, read_prices, synthetic_series, LoadError};
pub use export::{save_artifacts, ArtifactPaths, ExportError};
pub use investor::{BrokerUpdate, DayData, Investor, InvestorAccount, InvestorError, Session};
pub use ledger::{DateRange, Ledger, LedgerError, LedgerRecord, LedgerReport};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, RunError, RunResult, RunSummary};
pub use xgb_investor::{RetrainPolicy, XgbInvestor};
