//! Gradient-boosted direction investor.
//!
//! Every morning the investor (re)trains the direction model on all visible
//! history, predicts whether today's open is followed by a higher open, and
//! goes all in or stays in cash. Every afternoon it exits.

use crate::investor::{DayData, Investor, InvestorAccount, InvestorError};
use boostlab_core::domain::PriceSeries;
use boostlab_core::{DirectionModel, ModelParams, TrainedModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// When the morning session refits the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetrainPolicy {
    /// Fit a fresh model on the full visible history every morning.
    #[default]
    EveryMorning,
    /// Refit once `days` mornings have used the cached model.
    EveryNDays { days: usize },
    /// Fit on the first morning only.
    Once,
}

impl RetrainPolicy {
    fn is_due(self, cached: bool, mornings_since_training: usize) -> bool {
        if !cached {
            return true;
        }
        match self {
            RetrainPolicy::EveryMorning => true,
            RetrainPolicy::EveryNDays { days } => mornings_since_training >= days,
            RetrainPolicy::Once => false,
        }
    }
}

/// One morning decision, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub fraction: f64,
    pub retrained: bool,
    pub trained_through: NaiveDate,
}

#[derive(Debug)]
pub struct XgbInvestor {
    account: InvestorAccount,
    model: DirectionModel,
    retrain: RetrainPolicy,
    trained: Option<TrainedModel>,
    mornings_since_training: usize,
    predictions: Vec<Prediction>,
}

impl XgbInvestor {
    pub fn new(initial_investment: f64, params: ModelParams, retrain: RetrainPolicy) -> Result<Self, InvestorError> {
        Ok(Self {
            account: InvestorAccount::new(initial_investment)?,
            model: DirectionModel::new(params)?,
            retrain,
            trained: None,
            mornings_since_training: 0,
            predictions: Vec::new(),
        })
    }

    /// Default strategy parameters with the given lag window.
    pub fn with_window(initial_investment: f64, window: usize) -> Result<Self, InvestorError> {
        Self::new(
            initial_investment,
            ModelParams {
                window,
                ..ModelParams::default()
            },
            RetrainPolicy::default(),
        )
    }

    pub fn model(&self) -> &DirectionModel {
        &self.model
    }

    pub fn retrain_policy(&self) -> RetrainPolicy {
        self.retrain
    }

    /// The model used for the latest prediction.
    pub fn trained(&self) -> Option<&TrainedModel> {
        self.trained.as_ref()
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Index of the first day whose morning has both a training set and a
    /// complete inference row. Assumes readiness never reverts once reached,
    /// which holds under `WarmupPolicy::LibraryFill`.
    pub fn first_tradable_day(&self, series: &PriceSeries) -> Option<usize> {
        let ready = |i: usize| {
            let bars = series.visible_through(i);
            self.model.training_set(bars).is_ok()
                && self
                    .model
                    .inference_row(bars)
                    .is_ok_and(|row| row.values.iter().all(|v| v.is_finite()))
        };
        let days: Vec<usize> = (0..series.len()).collect();
        let first = days.partition_point(|&i| !ready(i));
        (first < days.len()).then_some(first)
    }
}

impl Investor for XgbInvestor {
    fn name(&self) -> &str {
        "xgb"
    }

    fn account(&self) -> &InvestorAccount {
        &self.account
    }

    fn account_mut(&mut self) -> &mut InvestorAccount {
        &mut self.account
    }

    fn possibly_invest_morning(&mut self, data: &DayData<'_>) -> Result<(), InvestorError> {
        let bars = data.visible();
        let retrained = self
            .retrain
            .is_due(self.trained.is_some(), self.mornings_since_training);
        let trained = match self.trained.take() {
            Some(model) if !retrained => model,
            _ => {
                self.mornings_since_training = 0;
                self.model.train(bars)?
            }
        };
        let fraction = self.model.predict_allocation_fraction(bars, &trained)?;
        tracing::debug!(
            "{}: allocate {:.0}% (model through {}, retrained: {})",
            data.date(),
            fraction * 100.0,
            trained.trained_through(),
            retrained
        );
        self.predictions.push(Prediction {
            date: data.date(),
            fraction,
            retrained,
            trained_through: trained.trained_through(),
        });
        self.trained = Some(trained);
        self.mornings_since_training += 1;
        self.account.set_percentage_to_invest(fraction)
    }

    fn possibly_invest_afternoon(&mut self, _data: &DayData<'_>) -> Result<(), InvestorError> {
        self.account.set_percentage_to_invest(0.0)
    }
}
