//! Binary direction labels and lockstep row alignment.

use crate::features::assembler::difference;
use crate::features::frame::FeatureFrame;
use crate::features::FeatureError;

/// One {0, 1} label per training row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVector {
    values: Vec<u8>,
}

impl LabelVector {
    /// `label[i] = 1` iff `target[i] > 0`. Ties and undefined values are 0.
    pub fn from_target(target: &[f64]) -> Self {
        Self {
            values: target.iter().map(|&t| u8::from(t > 0.0)).collect(),
        }
    }

    /// Labels from a shifted open series: 1 iff the open rose from the previous row.
    ///
    /// Row 0 has no previous open; its label is 0 and is discarded during
    /// alignment together with the first feature row.
    pub fn from_open(open: &[f64]) -> Self {
        Self::from_target(&difference(open))
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1).count()
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.values.iter().map(|&v| f64::from(v)).collect()
    }

    fn retain(&self, mask: &[bool]) -> Self {
        Self {
            values: self
                .values
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(&v, _)| v)
                .collect(),
        }
    }
}

/// Rows usable for training: every feature and the target are defined.
pub fn training_mask(frame: &FeatureFrame, target: &[f64]) -> Vec<bool> {
    frame
        .complete_rows()
        .into_iter()
        .zip(target)
        .map(|(complete, t)| complete && !t.is_nan())
        .collect()
}

/// Drop every row with an undefined feature or target, from frame and labels alike.
///
/// Inputs must all have the frame's row count. The surviving frame and labels
/// have equal length, or the call fails with `FeatureError::Alignment`.
pub fn align_training_rows(
    frame: &FeatureFrame,
    target: &[f64],
    labels: &LabelVector,
) -> Result<(FeatureFrame, LabelVector), FeatureError> {
    for len in [target.len(), labels.len()] {
        if len != frame.n_rows() {
            return Err(FeatureError::Alignment {
                features: frame.n_rows(),
                labels: len,
            });
        }
    }
    let mask = training_mask(frame, target);
    let kept = frame.retain_rows(&mask)?;
    let labels = labels.retain(&mask);
    if kept.n_rows() != labels.len() {
        return Err(FeatureError::Alignment {
            features: kept.n_rows(),
            labels: labels.len(),
        });
    }
    Ok((kept, labels))
}
