//! Feature assembler — the un-lagged feature frame for training and inference.
//!
//! Both modes run the same column construction over the same layout; they
//! differ only in how many trailing rows are cut off after the open shift.

use crate::domain::Bar;
use crate::features::adapter::{indicator_column, WarmupPolicy};
use crate::features::frame::{FeatureFrame, FeatureSchema};
use crate::features::layout::{FeatureLayout, FeatureSource};
use crate::features::FeatureError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rows the open series is pulled back by: row `i` holds the open of day `i + 1`.
///
/// Modelling assumption: the next session's open is treated as known at
/// decision time.
pub const OPEN_SHIFT: usize = 1;

/// Which side of the train/predict contract a frame is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyMode {
    Training,
    Inference,
}

impl AssemblyMode {
    /// Trailing rows dropped for a given open shift.
    ///
    /// The last `shift` rows have no shifted open. Training additionally
    /// holds back the row that serves as the live inference input.
    pub fn trailing_rows(self, shift: usize) -> usize {
        match self {
            AssemblyMode::Training => shift + 1,
            AssemblyMode::Inference => shift,
        }
    }
}

/// Output of one assembly pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub frame: FeatureFrame,
    /// Trading day of each frame row.
    pub dates: Vec<NaiveDate>,
    /// The shifted open series the frame was built from.
    pub shifted_open: Vec<f64>,
    /// Training only: `open'[i] - open'[i-1]`, NaN at row 0.
    pub target: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAssembler {
    layout: FeatureLayout,
    warmup: WarmupPolicy,
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self {
            layout: FeatureLayout::default(),
            warmup: WarmupPolicy::default(),
        }
    }
}

impl FeatureAssembler {
    pub fn new(layout: FeatureLayout, warmup: WarmupPolicy) -> Result<Self, FeatureError> {
        layout.validate()?;
        Ok(Self { layout, warmup })
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn warmup(&self) -> WarmupPolicy {
        self.warmup
    }

    /// Column schema of every frame this assembler produces.
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::new(self.layout.names())
    }

    /// Build the feature frame for `bars` (oldest first).
    pub fn assemble(&self, bars: &[Bar], mode: AssemblyMode) -> Result<Assembly, FeatureError> {
        let drop = mode.trailing_rows(OPEN_SHIFT);
        if bars.len() <= drop {
            return Err(FeatureError::InsufficientHistory {
                required: drop + 1,
                available: bars.len(),
            });
        }
        let rows = bars.len() - drop;

        // Pull the open back so each row carries the next session's open.
        let shifted: Vec<Bar> = bars[..rows]
            .iter()
            .zip(&bars[OPEN_SHIFT..])
            .map(|(bar, next)| Bar {
                open: next.open,
                ..bar.clone()
            })
            .collect();
        let open: Vec<f64> = shifted.iter().map(|b| b.open).collect();
        let close: Vec<f64> = shifted.iter().map(|b| b.close).collect();

        let mut frame = FeatureFrame::new();
        for column in self.layout.columns() {
            let values = match &column.source {
                FeatureSource::ReturnInterday => open
                    .iter()
                    .zip(&close)
                    .map(|(o, c)| o.ln() - c.ln())
                    .collect(),
                FeatureSource::ReturnOpen => log_change(&open),
                FeatureSource::ReturnIntraday => close
                    .iter()
                    .zip(&open)
                    .map(|(c, o)| c.ln() - o.ln())
                    .collect(),
                FeatureSource::Volume => shifted.iter().map(|b| b.volume as f64).collect(),
                source => indicator_column(&shifted, source, self.warmup)?.unwrap_or_default(),
            };
            frame.push_column(column.name.clone(), values)?;
        }

        let target = match mode {
            AssemblyMode::Training => Some(difference(&open)),
            AssemblyMode::Inference => None,
        };

        Ok(Assembly {
            frame,
            dates: shifted.iter().map(|b| b.date).collect(),
            shifted_open: open,
            target,
        })
    }
}

/// `ln(x[i]) - ln(x[i-1])`, NaN at row 0.
fn log_change(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| w[1].ln() - w[0].ln()))
        .take(values.len())
        .collect()
}

/// `x[i] - x[i-1]`, NaN at row 0.
pub(crate) fn difference(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| w[1] - w[0]))
        .take(values.len())
        .collect()
}
