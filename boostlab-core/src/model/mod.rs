//! Gradient-boosted direction classifier.

pub mod gbm;
pub mod matrix;
pub mod tree;

pub use gbm::{ClassifierParams, GradientBoostedClassifier};
pub use matrix::DenseMatrix;
pub use tree::{Node, RegressionTree};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{rows} training rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("label at row {row} is {value}, expected 0 or 1")]
    InvalidLabel { row: usize, value: u8 },

    #[error("non-finite feature at row {row}, column {column}")]
    NonFiniteFeature { row: usize, column: usize },

    #[error("model expects {expected} features, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("invalid classifier parameters: {0}")]
    InvalidParams(String),
}
