//! Feature layout — the ordered preset table the assembler builds columns from.
//!
//! The default layout is the strategy's fixed column set. It is plain data
//! so a run configuration can override it without touching code.

use crate::features::FeatureError;
use serde::{Deserialize, Serialize};

/// Bollinger Bands output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BollingerOutput {
    Hband,
    Mavg,
    Lband,
    Pband,
}

/// ADX output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdxOutput {
    AdxPos,
    AdxNeg,
}

/// Stochastic RSI output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StochRsiOutput {
    K,
    D,
}

/// Where a feature column's values come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FeatureSource {
    /// ln(Open') - ln(Close)
    ReturnInterday,
    /// ln(Open') - ln(Open'.shift(1))
    ReturnOpen,
    /// ln(Close) - ln(Open')
    ReturnIntraday,
    Volume,
    Bollinger {
        window: usize,
        std_dev: f64,
        output: BollingerOutput,
    },
    Adx {
        window: usize,
        output: AdxOutput,
    },
    StochRsi {
        window: usize,
        smooth1: usize,
        smooth2: usize,
        output: StochRsiOutput,
    },
}

impl FeatureSource {
    pub fn is_indicator(&self) -> bool {
        matches!(
            self,
            FeatureSource::Bollinger { .. } | FeatureSource::Adx { .. } | FeatureSource::StochRsi { .. }
        )
    }
}

/// One named column of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    #[serde(flatten)]
    pub source: FeatureSource,
}

impl FeatureColumn {
    pub fn new(name: impl Into<String>, source: FeatureSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Ordered list of feature columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureLayout {
    columns: Vec<FeatureColumn>,
}

impl FeatureLayout {
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self, FeatureError> {
        let layout = Self { columns };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.columns.is_empty() {
            return Err(FeatureError::EmptyLayout);
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(FeatureError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        use FeatureSource::*;
        Self {
            columns: vec![
                FeatureColumn::new("Return_interday", ReturnInterday),
                FeatureColumn::new(
                    "bb_pband",
                    Bollinger {
                        window: 3,
                        std_dev: 1.775,
                        output: BollingerOutput::Pband,
                    },
                ),
                FeatureColumn::new("Return_open", ReturnOpen),
                FeatureColumn::new(
                    "adx_pos_w6",
                    Adx {
                        window: 6,
                        output: AdxOutput::AdxPos,
                    },
                ),
                FeatureColumn::new(
                    "adx_pos_w42",
                    Adx {
                        window: 42,
                        output: AdxOutput::AdxPos,
                    },
                ),
                FeatureColumn::new("Volume", Volume),
                FeatureColumn::new(
                    "adx_neg_w1",
                    Adx {
                        window: 1,
                        output: AdxOutput::AdxNeg,
                    },
                ),
                FeatureColumn::new("Return_intraday", ReturnIntraday),
                FeatureColumn::new(
                    "stochRsi_k",
                    StochRsi {
                        window: 47,
                        smooth1: 43,
                        smooth2: 12,
                        output: StochRsiOutput::K,
                    },
                ),
            ],
        }
    }
}
