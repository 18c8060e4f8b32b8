//! Stochastic RSI.
//!
//! StochRSI = (RSI - min(RSI, window)) / (max(RSI, window) - min(RSI, window))
//! %K = SMA(StochRSI, smooth1)
//! %D = SMA(%K, smooth2)
//!
//! Values are fractions in [0, 1]. A flat RSI window leaves StochRSI
//! undefined (NaN), which propagates through the smoothing windows.
//! Lookback (%K): 2 * (window - 1) + (smooth1 - 1).

use crate::domain::Bar;
use crate::indicators::rsi::rsi_series;
use crate::indicators::{check_window, rolling, Indicator, IndicatorError};

/// Which Stochastic RSI line to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochRsiLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct StochRsi {
    window: usize,
    smooth1: usize,
    smooth2: usize,
    line: StochRsiLine,
    name: String,
}

impl StochRsi {
    pub fn k(window: usize, smooth1: usize, smooth2: usize) -> Self {
        Self {
            window,
            smooth1,
            smooth2,
            line: StochRsiLine::K,
            name: format!("stoch_rsi_k_{window}_{smooth1}_{smooth2}"),
        }
    }

    pub fn d(window: usize, smooth1: usize, smooth2: usize) -> Self {
        Self {
            window,
            smooth1,
            smooth2,
            line: StochRsiLine::D,
            name: format!("stoch_rsi_d_{window}_{smooth1}_{smooth2}"),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

impl Indicator for StochRsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k = 2 * self.window.saturating_sub(1) + self.smooth1.saturating_sub(1);
        match self.line {
            StochRsiLine::K => k,
            StochRsiLine::D => k + self.smooth2.saturating_sub(1),
        }
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<f64>, IndicatorError> {
        check_window(&self.name, "window", self.window, bars.len())?;
        for (param, value) in [("smooth1", self.smooth1), ("smooth2", self.smooth2)] {
            if value == 0 {
                return Err(IndicatorError::InvalidParameter {
                    indicator: self.name.clone(),
                    reason: format!("{param} must be >= 1"),
                });
            }
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let rsi = rsi_series(&closes, self.window);
        let lowest = rolling(&rsi, self.window, min);
        let highest = rolling(&rsi, self.window, max);

        let stoch: Vec<f64> = rsi
            .iter()
            .zip(lowest.iter().zip(highest.iter()))
            .map(|(&r, (&lo, &hi))| {
                let range = hi - lo;
                if r.is_nan() || range.is_nan() || range == 0.0 {
                    f64::NAN
                } else {
                    (r - lo) / range
                }
            })
            .collect();

        let k = rolling(&stoch, self.smooth1, mean);
        Ok(match self.line {
            StochRsiLine::K => k,
            StochRsiLine::D => rolling(&k, self.smooth2, mean),
        })
    }
}
