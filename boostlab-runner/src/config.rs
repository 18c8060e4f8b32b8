//! Serializable run configuration.
//!
//! A run is described by one TOML file:
//!
//! ```toml
//! initial_investment = 10000.0
//! window = 2
//! start_date = "2021-01-04"
//! warmup = "undefined"
//!
//! [classifier]
//! n_estimators = 300
//! seed = 7
//!
//! [retrain]
//! policy = "every_n_days"
//! days = 5
//! ```
//!
//! Missing keys take the strategy defaults. An optional `[[features]]`
//! array replaces the default nine-column layout.

use crate::xgb_investor::RetrainPolicy;
use boostlab_core::features::{FeatureLayout, WarmupPolicy};
use boostlab_core::model::ClassifierParams;
use boostlab_core::ModelParams;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Starting cash.
    pub initial_investment: f64,

    /// Lagged copies of each base feature.
    #[serde(default = "default_window")]
    pub window: usize,

    /// First simulated day (inclusive). Defaults to the first bar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Last simulated day (inclusive). Defaults to the last bar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub classifier: ClassifierParams,

    #[serde(default)]
    pub retrain: RetrainPolicy,

    #[serde(default)]
    pub warmup: WarmupPolicy,

    /// Replaces the default feature layout when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureLayout>,
}

fn default_window() -> usize {
    ModelParams::default().window
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial_investment: 10_000.0,
            window: default_window(),
            start_date: None,
            end_date: None,
            classifier: ClassifierParams::default(),
            retrain: RetrainPolicy::default(),
            warmup: WarmupPolicy::default(),
            features: None,
        }
    }
}

impl RunConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML config string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_investment.is_finite() || self.initial_investment <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_investment must be positive, got {}",
                self.initial_investment
            )));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        if let RetrainPolicy::EveryNDays { days: 0 } = self.retrain {
            return Err(ConfigError::Invalid("retrain.days must be at least 1".into()));
        }
        self.classifier
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(layout) = &self.features {
            layout
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("features: {e}")))?;
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }

    /// Strategy parameters for the direction model.
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            window: self.window,
            classifier: self.classifier.clone(),
            layout: self.features.clone().unwrap_or_default(),
            warmup: self.warmup,
        }
    }
}
