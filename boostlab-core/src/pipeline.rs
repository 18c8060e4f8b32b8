//! Train/predict contract for the next-day direction model.
//!
//! `DirectionModel::train` and `DirectionModel::predict_allocation_fraction`
//! share one `FeatureAssembler` and one lag window. The expanded column
//! schema is stored with every `TrainedModel` and compared against the
//! inference row before the classifier sees it.

use crate::domain::Bar;
use crate::features::{
    align_training_rows, expand, expanded_schema, training_mask, AssemblyMode, FeatureAssembler,
    FeatureError, FeatureFrame, FeatureLayout, FeatureSchema, LabelVector, WarmupPolicy,
};
use crate::indicators::IndicatorError;
use crate::model::{ClassifierParams, GradientBoostedClassifier, ModelError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("no complete training rows in {bars} bars after indicator warm-up")]
    NoTrainingRows { bars: usize },

    #[error("inference row for {date} is undefined in column '{column}'")]
    IncompleteInferenceRow { date: NaiveDate, column: String },

    #[error(
        "inference schema does not match the trained model: expected {expected} columns, \
         found {found}, first difference at column {first_difference}"
    )]
    ShapeMismatch {
        expected: usize,
        found: usize,
        first_difference: usize,
    },
}

impl PipelineError {
    /// True for every flavour of "not enough price history".
    pub fn is_insufficient_history(&self) -> bool {
        matches!(
            self,
            PipelineError::NoTrainingRows { .. }
                | PipelineError::IncompleteInferenceRow { .. }
                | PipelineError::Feature(FeatureError::InsufficientHistory { .. })
                | PipelineError::Feature(FeatureError::Indicator(
                    IndicatorError::InsufficientHistory { .. }
                ))
        )
    }
}

/// Strategy configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Number of lagged copies of each base feature.
    pub window: usize,
    pub classifier: ClassifierParams,
    #[serde(rename = "features")]
    pub layout: FeatureLayout,
    pub warmup: WarmupPolicy,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            window: 2,
            classifier: ClassifierParams::default(),
            layout: FeatureLayout::default(),
            warmup: WarmupPolicy::default(),
        }
    }
}

/// Lagged, labelled rows ready for fitting.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub frame: FeatureFrame,
    pub labels: LabelVector,
    pub dates: Vec<NaiveDate>,
}

/// The latest expanded feature row.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRow {
    pub date: NaiveDate,
    pub schema: FeatureSchema,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    schema: FeatureSchema,
    window: usize,
    classifier: GradientBoostedClassifier,
    training_rows: usize,
    positive_labels: usize,
    trained_through: NaiveDate,
}

impl TrainedModel {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn classifier(&self) -> &GradientBoostedClassifier {
        &self.classifier
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    pub fn positive_labels(&self) -> usize {
        self.positive_labels
    }

    /// Date of the last training row.
    pub fn trained_through(&self) -> NaiveDate {
        self.trained_through
    }

    /// Normalised gain importance per expanded column, in schema order.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        self.schema
            .columns()
            .iter()
            .cloned()
            .zip(self.classifier.feature_importance())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DirectionModel {
    params: ModelParams,
    assembler: FeatureAssembler,
}

impl DirectionModel {
    pub fn new(params: ModelParams) -> Result<Self, PipelineError> {
        params.classifier.validate()?;
        let assembler = FeatureAssembler::new(params.layout.clone(), params.warmup)?;
        Ok(Self { params, assembler })
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    /// Column schema the classifier is trained on and fed with.
    pub fn schema(&self) -> FeatureSchema {
        expanded_schema(&self.assembler.schema(), self.params.window)
    }

    /// Assemble, label, drop undefined rows in lockstep, then lag-expand.
    pub fn training_set(&self, bars: &[Bar]) -> Result<TrainingSet, PipelineError> {
        let assembly = self.assembler.assemble(bars, AssemblyMode::Training)?;
        let target = assembly.target.unwrap_or_default();
        let labels = LabelVector::from_target(&target);
        let (kept, labels) = align_training_rows(&assembly.frame, &target, &labels)?;
        if kept.n_rows() == 0 {
            return Err(PipelineError::NoTrainingRows { bars: bars.len() });
        }
        let dates = assembly
            .dates
            .iter()
            .zip(training_mask(&assembly.frame, &target))
            .filter_map(|(&d, keep)| keep.then_some(d))
            .collect();
        let frame = expand(&kept, self.params.window)?;
        Ok(TrainingSet {
            frame,
            labels,
            dates,
        })
    }

    /// Fit a fresh classifier on the whole visible history.
    pub fn train(&self, bars: &[Bar]) -> Result<TrainedModel, PipelineError> {
        let set = self.training_set(bars)?;
        let matrix = set.frame.to_matrix();
        let classifier = GradientBoostedClassifier::fit(&self.params.classifier, &matrix, set.labels.values())?;
        let trained_through = match set.dates.last() {
            Some(&d) => d,
            None => return Err(PipelineError::NoTrainingRows { bars: bars.len() }),
        };
        tracing::info!(
            "trained direction model: {} rows through {}, {} up days, {} columns",
            set.labels.len(),
            trained_through,
            set.labels.positives(),
            set.frame.n_cols()
        );
        Ok(TrainedModel {
            schema: set.frame.schema(),
            window: self.params.window,
            classifier,
            training_rows: set.labels.len(),
            positive_labels: set.labels.positives(),
            trained_through,
        })
    }

    /// Final row of the lag-expanded inference frame.
    pub fn inference_row(&self, bars: &[Bar]) -> Result<InferenceRow, PipelineError> {
        let assembly = self.assembler.assemble(bars, AssemblyMode::Inference)?;
        let frame = expand(&assembly.frame, self.params.window)?;
        let (date, values) = match (assembly.dates.last(), frame.last_row()) {
            (Some(&date), Some(values)) => (date, values),
            _ => {
                return Err(FeatureError::InsufficientHistory {
                    required: AssemblyMode::Inference.trailing_rows(crate::features::OPEN_SHIFT) + 1,
                    available: bars.len(),
                }
                .into())
            }
        };
        Ok(InferenceRow {
            date,
            schema: frame.schema(),
            values,
        })
    }

    /// Morning allocation: `1.0` if the model predicts an up move, else `0.0`.
    pub fn predict_allocation_fraction(&self, bars: &[Bar], model: &TrainedModel) -> Result<f64, PipelineError> {
        let row = self.inference_row(bars)?;
        if let Some(first_difference) = model.schema.first_difference(&row.schema) {
            return Err(PipelineError::ShapeMismatch {
                expected: model.schema.len(),
                found: row.schema.len(),
                first_difference,
            });
        }
        if let Some(i) = row.values.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::IncompleteInferenceRow {
                date: row.date,
                column: row.schema.columns()[i].clone(),
            });
        }
        let class = model.classifier.predict_row(&row.values)?;
        tracing::debug!("{}: predicted class {}", row.date, class);
        Ok(f64::from(class))
    }
}
