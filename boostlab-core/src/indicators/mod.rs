//! Indicator library.
//!
//! Indicators are pure functions: bar history in, numeric series out. Every
//! series has the same length as its input and starts with `lookback()` NaN
//! warm-up values.
//!
//! Multi-output indicators (Bollinger, ADX, Stochastic RSI) are exposed as
//! separate instances per output, keeping the single-series `Indicator`
//! trait unchanged.
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on price data from bar t+1 or
//! later. Every indicator must pass the truncated-vs-full series test.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod rsi;
pub mod stoch_rsi;

pub use adx::{Adx, DirectionalLine};
pub use atr::true_range;
pub use bollinger::{Bollinger, BollingerBand};
pub use rsi::Rsi;
pub use stoch_rsi::{StochRsi, StochRsiLine};

use crate::domain::Bar;
use thiserror::Error;

/// Errors raised by indicator computations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndicatorError {
    #[error("{indicator}: invalid parameter: {reason}")]
    InvalidParameter { indicator: String, reason: String },

    #[error("{indicator}: needs more than {window} bars, got {available}")]
    InsufficientHistory {
        indicator: String,
        window: usize,
        available: usize,
    },
}

/// Trait for indicators.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "adx_pos_6", "bollinger_pband_3_1.775").
    fn name(&self) -> &str;

    /// Number of leading NaN values in the output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`. Fails when a window
    /// parameter is zero or not shorter than the series.
    fn compute(&self, bars: &[Bar]) -> Result<Vec<f64>, IndicatorError>;
}

/// Validate a window parameter against the available history.
pub(crate) fn check_window(
    indicator: &str,
    param: &str,
    window: usize,
    available: usize,
) -> Result<(), IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::InvalidParameter {
            indicator: indicator.to_string(),
            reason: format!("{param} must be >= 1"),
        });
    }
    if window >= available {
        return Err(IndicatorError::InsufficientHistory {
            indicator: indicator.to_string(),
            window,
            available,
        });
    }
    Ok(())
}

/// Rolling reduction over a fixed window. Any NaN inside the window yields NaN.
pub(crate) fn rolling(values: &[f64], window: usize, reduce: fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = reduce(slice);
    }
    result
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_window_rejects_zero() {
        let err = check_window("sma", "window", 0, 10).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter { .. }));
    }

    #[test]
    fn check_window_rejects_window_not_shorter_than_series() {
        let err = check_window("sma", "window", 10, 10).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientHistory {
                indicator: "sma".into(),
                window: 10,
                available: 10,
            }
        );
        assert!(check_window("sma", "window", 9, 10).is_ok());
    }

    #[test]
    fn rolling_mean_with_nan_gap() {
        let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
        let out = rolling(&[1.0, 2.0, 3.0, f64::NAN, 5.0, 6.0, 7.0], 2, mean);
        assert!(out[0].is_nan());
        assert_approx(out[1], 1.5, DEFAULT_EPSILON);
        assert_approx(out[2], 2.5, DEFAULT_EPSILON);
        assert!(out[3].is_nan());
        assert!(out[4].is_nan());
        assert_approx(out[5], 5.5, DEFAULT_EPSILON);
    }
}
