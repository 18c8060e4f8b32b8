//! Gradient-boosted binary classifier (logistic loss, second-order trees).

use crate::model::tree::{grow, sample_features, GrowContext, GrowParams, RegressionTree, SortedColumns};
use crate::model::{DenseMatrix, ModelError};
use crate::rng::RngHierarchy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Hessians are floored here so leaf weights stay finite on saturated rows.
const MIN_HESSIAN: f64 = 1e-16;

/// Classifier hyperparameters. Missing fields take the strategy defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows drawn (Bernoulli) for each tree.
    pub subsample: f64,
    /// Fraction of the tree's columns sampled at every depth level.
    pub colsample_bylevel: f64,
    /// Fraction of all columns sampled for each tree.
    pub colsample_bytree: f64,
    pub reg_lambda: f64,
    pub gamma: f64,
    pub min_child_weight: f64,
    pub base_score: f64,
    pub seed: u64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            n_estimators: 1000,
            max_depth: 14,
            learning_rate: 0.06266659029259186,
            subsample: 1.0,
            colsample_bylevel: 0.6452280156999572,
            colsample_bytree: 0.9581223733932949,
            reg_lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            base_score: 0.5,
            seed: 0,
        }
    }
}

impl ClassifierParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |msg: String| -> Result<(), ModelError> { Err(ModelError::InvalidParams(msg)) };
        if self.n_estimators == 0 {
            return invalid("n_estimators must be >= 1".into());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid(format!("learning_rate must be > 0, got {}", self.learning_rate));
        }
        for (name, value) in [
            ("subsample", self.subsample),
            ("colsample_bylevel", self.colsample_bylevel),
            ("colsample_bytree", self.colsample_bytree),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return invalid(format!("{name} must be in (0, 1], got {value}"));
            }
        }
        for (name, value) in [
            ("reg_lambda", self.reg_lambda),
            ("gamma", self.gamma),
            ("min_child_weight", self.min_child_weight),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("{name} must be >= 0, got {value}"));
            }
        }
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return invalid(format!("base_score must be in (0, 1), got {}", self.base_score));
        }
        Ok(())
    }

    fn grow_params(&self) -> GrowParams {
        GrowParams {
            max_depth: self.max_depth,
            eta: self.learning_rate,
            lambda: self.reg_lambda,
            gamma: self.gamma,
            min_child_weight: self.min_child_weight,
            colsample_bylevel: self.colsample_bylevel,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn log_loss(margins: &[f64], labels: &[u8]) -> f64 {
    let total: f64 = margins
        .iter()
        .zip(labels)
        .map(|(&m, &y)| {
            let p = sigmoid(m).clamp(1e-15, 1.0 - 1e-15);
            if y == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / margins.len().max(1) as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    params: ClassifierParams,
    base_margin: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
    importance: Vec<f64>,
}

impl GradientBoostedClassifier {
    /// Fit on `x` (one row per sample) against {0, 1} labels.
    ///
    /// The same inputs, parameters and seed always give the same model,
    /// whatever the size of the rayon pool.
    pub fn fit(params: &ClassifierParams, x: &DenseMatrix, labels: &[u8]) -> Result<Self, ModelError> {
        params.validate()?;
        let n = x.n_rows();
        if n == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if labels.len() != n {
            return Err(ModelError::LabelCountMismatch {
                rows: n,
                labels: labels.len(),
            });
        }
        if let Some((row, &value)) = labels.iter().enumerate().find(|&(_, &y)| y > 1) {
            return Err(ModelError::InvalidLabel { row, value });
        }
        if let Some((row, column)) = x.first_non_finite() {
            return Err(ModelError::NonFiniteFeature { row, column });
        }

        let started = Instant::now();
        let grow_params = params.grow_params();
        let hierarchy = RngHierarchy::new(params.seed);
        let sorted = SortedColumns::new(x);
        let all_features: Vec<usize> = (0..x.n_cols()).collect();
        let all_rows: Vec<usize> = (0..n).collect();
        let target: Vec<f64> = labels.iter().map(|&y| f64::from(y)).collect();

        let base_margin = (params.base_score / (1.0 - params.base_score)).ln();
        let mut margins = vec![base_margin; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importance = vec![0.0; x.n_cols()];

        for t in 0..params.n_estimators {
            for i in 0..n {
                let p = sigmoid(margins[i]);
                grad[i] = p - target[i];
                hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let mut rng = hierarchy.rng_for("tree", t as u64);
            let rows: Vec<usize> = if params.subsample < 1.0 {
                all_rows
                    .iter()
                    .copied()
                    .filter(|_| rng.gen::<f64>() < params.subsample)
                    .collect()
            } else {
                all_rows.clone()
            };
            let features = sample_features(&all_features, params.colsample_bytree, &mut rng);

            let ctx = GrowContext {
                x,
                sorted: &sorted,
                grad: &grad,
                hess: &hess,
            };
            let tree = grow(&ctx, &rows, &features, &grow_params, &mut rng);

            for (i, margin) in margins.iter_mut().enumerate() {
                *margin += tree.predict(x.row(i));
            }
            tree.accumulate_gain(&mut importance);
            trees.push(tree);

            if (t + 1) % 100 == 0 {
                tracing::debug!("round {}: train logloss={:.6}", t + 1, log_loss(&margins, labels));
            }
        }

        tracing::info!(
            "classifier fitted: {} trees, {} rows x {} features, logloss={:.6}, {:.2?}",
            trees.len(),
            n,
            x.n_cols(),
            log_loss(&margins, labels),
            started.elapsed()
        );

        Ok(Self {
            params: params.clone(),
            base_margin,
            n_features: x.n_cols(),
            trees,
            importance,
        })
    }

    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    fn check_width(&self, found: usize) -> Result<(), ModelError> {
        if found != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                found,
            });
        }
        Ok(())
    }

    /// Raw additive score (log-odds) for one row.
    pub fn margin(&self, row: &[f64]) -> Result<f64, ModelError> {
        self.check_width(row.len())?;
        Ok(self.base_margin + self.trees.iter().map(|t| t.predict(row)).sum::<f64>())
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        self.margin(row).map(sigmoid)
    }

    /// Class 1 iff the probability exceeds 0.5.
    pub fn predict_row(&self, row: &[f64]) -> Result<u8, ModelError> {
        Ok(u8::from(self.predict_proba_row(row)? > 0.5))
    }

    pub fn predict_proba(&self, x: &DenseMatrix) -> Result<Vec<f64>, ModelError> {
        self.check_width(x.n_cols())?;
        x.rows().map(|row| self.predict_proba_row(row)).collect()
    }

    pub fn predict(&self, x: &DenseMatrix) -> Result<Vec<u8>, ModelError> {
        self.check_width(x.n_cols())?;
        x.rows().map(|row| self.predict_row(row)).collect()
    }

    /// Total split gain per feature, normalised to sum to 1 (all zero if no splits).
    pub fn feature_importance(&self) -> Vec<f64> {
        let total: f64 = self.importance.iter().sum();
        if total > 0.0 {
            self.importance.iter().map(|g| g / total).collect()
        } else {
            self.importance.clone()
        }
    }
}
