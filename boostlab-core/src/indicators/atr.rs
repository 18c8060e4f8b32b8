//! True range and Wilder running sums.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first bar has no previous close, so TR[0] is NaN.

use crate::domain::Bar;

/// Compute the True Range series from bars.
/// TR[0] = NaN (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            tr[i] = f64::NAN;
        } else {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }

    tr
}

/// Wilder running sum: `S[t] = S[t-1] - S[t-1] / period + x[t]`.
///
/// Seed: sum of `values[1..=period]` placed at index `period` (index 0 is the
/// differencing border of every directional-movement series). A NaN after
/// the seed invalidates the rest of the series.
pub fn wilder_sum(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n <= period {
        return result;
    }

    let seed_window = &values[1..=period];
    if seed_window.iter().any(|v| v.is_nan()) {
        return result;
    }

    let mut prev: f64 = seed_window.iter().sum();
    result[period] = prev;

    for i in (period + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        prev = prev - prev / period as f64 + values[i];
        result[i] = prev;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // no previous close
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, |107-106|, |98-106|) = 9
        ]);
        let tr = true_range(&bars);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // Gap up: prev close 100, current bar 110-115-108
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, |115-100|, |108-100|) = 15
        ]);
        let tr = true_range(&bars);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_sum_period_3() {
        let values = [f64::NAN, 8.0, 9.0, 6.0, 6.0];
        let result = wilder_sum(&values, 3);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        // Seed: 8 + 9 + 6 = 23
        assert_approx(result[3], 23.0, DEFAULT_EPSILON);
        // 23 - 23/3 + 6
        assert_approx(result[4], 23.0 - 23.0 / 3.0 + 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_sum_period_1_is_identity() {
        let values = [f64::NAN, 2.0, 5.0, 1.0];
        let result = wilder_sum(&values, 1);
        assert_approx(result[1], 2.0, DEFAULT_EPSILON);
        assert_approx(result[2], 5.0, DEFAULT_EPSILON);
        assert_approx(result[3], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_sum_nan_invalidates_tail() {
        let values = [f64::NAN, 1.0, 1.0, f64::NAN, 1.0];
        let result = wilder_sum(&values, 2);
        assert_approx(result[2], 2.0, DEFAULT_EPSILON);
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
    }
}
