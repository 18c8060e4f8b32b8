//! BoostLab Core — price series, indicators, feature pipeline and the
//! gradient-boosted next-day direction model.
//!
//! - Domain types (bars, validated price series)
//! - Indicator library (Bollinger, ADX directional lines, RSI, Stochastic RSI)
//! - Feature assembly, lag expansion and label construction
//! - Gradient-boosted binary classifier
//! - Train/predict contract with an explicit feature schema

pub mod domain;
pub mod features;
pub mod indicators;
pub mod model;
pub mod pipeline;
pub mod rng;

pub use pipeline::{DirectionModel, ModelParams, PipelineError, TrainedModel};
