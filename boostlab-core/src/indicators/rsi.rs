//! Relative Strength Index (RSI).
//!
//! Gains and losses are smoothed with an exponential moving average
//! (alpha = 1/period, seeded with the first observation). The change at
//! bar 0 is undefined and counts as zero movement.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period - 1.
//! Edge case: avg_loss == 0 → RSI = 100.

use crate::domain::Bar;
use crate::indicators::{check_window, Indicator, IndicatorError};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

/// RSI over a raw close series. Callers validate `period` first.
pub(crate) fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 || period == 0 {
        return result;
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 0..n {
        let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        if change.is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        if i == 0 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        }

        if i + 1 >= period {
            result[i] = compute_rsi(avg_gain, avg_loss);
        }
    }

    result
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<f64>, IndicatorError> {
        check_window(&self.name, "window", self.period, bars.len())?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Ok(rsi_series(&closes, self.period))
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let result = Rsi::new(3).compute(&bars).unwrap();
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        for &v in &result[2..] {
            assert_approx(v, 100.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[15.0, 14.0, 13.0, 12.0, 11.0]);
        let result = Rsi::new(2).compute(&bars).unwrap();
        for &v in &result[1..] {
            assert_approx(v, 0.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rsi_hand_computed_period_2() {
        // changes: 0, +2, -1, +1
        let bars = make_bars(&[10.0, 12.0, 11.0, 12.0]);
        let result = Rsi::new(2).compute(&bars).unwrap();
        // i=1: gain 1.0, loss 0.0 → 100
        assert_approx(result[1], 100.0, DEFAULT_EPSILON);
        // i=2: gain 0.5, loss 0.5 → 50
        assert_approx(result[2], 50.0, DEFAULT_EPSILON);
        // i=3: gain 0.75, loss 0.25 → 100 - 100/4 = 75
        assert_approx(result[3], 75.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_bounded() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.9).sin() * 5.0).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes)).unwrap();
        for v in result.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 13);
    }
}
