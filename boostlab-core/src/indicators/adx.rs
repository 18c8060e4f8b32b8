//! ADX directional lines — +DI and -DI (Wilder).
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Wilder running sums of +DM, -DM and TR, seeded with the sum of the
//!    first `period` values (bars 1..=period)
//! 3. +DI = 100 * sum(+DM) / sum(TR)
//! 4. -DI = 100 * sum(-DM) / sum(TR)
//!
//! The seed bar itself is not reported, so the first value sits at index
//! `period + 1`. Lookback: period + 1.

use crate::domain::Bar;
use crate::indicators::atr::{true_range, wilder_sum};
use crate::indicators::{check_window, Indicator, IndicatorError};

/// Which directional line to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionalLine {
    Positive,
    Negative,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    line: DirectionalLine,
    name: String,
}

impl Adx {
    pub fn positive(period: usize) -> Self {
        Self {
            period,
            line: DirectionalLine::Positive,
            name: format!("adx_pos_{period}"),
        }
    }

    pub fn negative(period: usize) -> Self {
        Self {
            period,
            line: DirectionalLine::Negative,
            name: format!("adx_neg_{period}"),
        }
    }
}

/// +DM and -DM per bar. Index 0 is NaN (no previous bar).
fn directional_movement(bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let n = bars.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        if bars[i].high.is_nan()
            || bars[i].low.is_nan()
            || bars[i - 1].high.is_nan()
            || bars[i - 1].low.is_nan()
        {
            continue;
        }

        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;

        plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
        minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
    }

    (plus_dm, minus_dm)
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<f64>, IndicatorError> {
        check_window(&self.name, "window", self.period, bars.len())?;

        let n = bars.len();
        let (plus_dm, minus_dm) = directional_movement(bars);
        let dm = match self.line {
            DirectionalLine::Positive => plus_dm,
            DirectionalLine::Negative => minus_dm,
        };

        let sum_tr = wilder_sum(&true_range(bars), self.period);
        let sum_dm = wilder_sum(&dm, self.period);

        let mut result = vec![f64::NAN; n];
        for i in (self.period + 1)..n {
            if sum_tr[i].is_nan() || sum_dm[i].is_nan() || sum_tr[i] == 0.0 {
                continue;
            }
            result[i] = 100.0 * sum_dm[i] / sum_tr[i];
        }

        Ok(result)
    }
}
