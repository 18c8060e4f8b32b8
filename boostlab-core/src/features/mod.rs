//! Feature pipeline: indicator adapter, feature assembly, lag expansion and
//! label construction.
//!
//! Training and inference go through the same `FeatureAssembler` and the same
//! `expand` call so that the column schema the classifier sees is identical
//! on both paths.

pub mod adapter;
pub mod assembler;
pub mod frame;
pub mod labels;
pub mod lag;
pub mod layout;

pub use adapter::{indicator_column, WarmupPolicy};
pub use assembler::{Assembly, AssemblyMode, FeatureAssembler, OPEN_SHIFT};
pub use frame::{FeatureFrame, FeatureSchema};
pub use labels::{align_training_rows, training_mask, LabelVector};
pub use lag::{expand, expanded_schema, lag_column_name};
pub use layout::{AdxOutput, BollingerOutput, FeatureColumn, FeatureLayout, FeatureSource, StochRsiOutput};

use crate::indicators::IndicatorError;
use thiserror::Error;

/// Errors from the feature pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("indicator failed: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("need at least {required} bars, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("column '{column}' has {found} rows, frame has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("feature/label misalignment: {features} feature rows vs {labels} labels")]
    Alignment { features: usize, labels: usize },

    #[error("feature layout is empty")]
    EmptyLayout,
}
