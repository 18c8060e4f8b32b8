//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! Outputs (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//! - PercentBand: (close - lower) / (upper - lower)
//!
//! Uses population stddev (divide by N). A zero-width band leaves the
//! percent band undefined (NaN).
//! Lookback: period - 1.

use crate::domain::Bar;
use crate::indicators::{check_window, Indicator, IndicatorError};

/// Which output of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    PercentBand,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    fn with_band(period: usize, multiplier: f64, band: BollingerBand, label: &str) -> Self {
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Upper, "upper")
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Middle, "middle")
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Lower, "lower")
    }

    pub fn pband(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::PercentBand, "pband")
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<f64>, IndicatorError> {
        check_window(&self.name, "window", self.period, bars.len())?;
        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(IndicatorError::InvalidParameter {
                indicator: self.name.clone(),
                reason: format!("std_dev multiplier must be finite and >= 0, got {}", self.multiplier),
            });
        }

        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for i in (self.period - 1)..n {
            let start = i + 1 - self.period;
            let window = &bars[start..=i];

            if window.iter().any(|bar| bar.close.is_nan()) {
                continue;
            }

            let mean = window.iter().map(|bar| bar.close).sum::<f64>() / self.period as f64;
            let variance: f64 = window
                .iter()
                .map(|bar| {
                    let diff = bar.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.period as f64;
            let stddev = variance.sqrt();
            let upper = mean + self.multiplier * stddev;
            let lower = mean - self.multiplier * stddev;

            result[i] = match self.band {
                BollingerBand::Middle => mean,
                BollingerBand::Upper => upper,
                BollingerBand::Lower => lower,
                BollingerBand::PercentBand => {
                    let width = upper - lower;
                    if width == 0.0 {
                        f64::NAN
                    } else {
                        (bars[i].close - lower) / width
                    }
                }
            };
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3, 2.0).compute(&bars).unwrap();

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        // SMA[2] = mean(10,11,12) = 11.0
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        // SMA[3] = mean(11,12,13) = 12.0
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars).unwrap();
        let middle = Bollinger::middle(3, 2.0).compute(&bars).unwrap();
        let lower = Bollinger::lower(3, 2.0).compute(&bars).unwrap();

        for i in 2..5 {
            let half_width = upper[i] - middle[i];
            assert_approx(middle[i] - lower[i], half_width, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_pband_position_in_band() {
        // Window [10, 11, 12]: mean 11, population stddev sqrt(2/3)
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let pband = Bollinger::pband(3, 1.775);
        let err = pband.compute(&bars).unwrap_err();
        assert!(matches!(err, IndicatorError::InsufficientHistory { .. }));

        let bars = make_bars(&[10.0, 11.0, 12.0, 12.0]);
        let result = pband.compute(&bars).unwrap();
        let sd = (2.0_f64 / 3.0).sqrt();
        let lower = 11.0 - 1.775 * sd;
        let upper = 11.0 + 1.775 * sd;
        assert_approx(result[2], (12.0 - lower) / (upper - lower), DEFAULT_EPSILON);
        // Close at the mean sits in the middle of the band
        let middle_bars = make_bars(&[10.0, 12.0, 11.0, 11.0]);
        let middle = pband.compute(&middle_bars).unwrap();
        assert_approx(middle[2], 0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars).unwrap();
        let lower = Bollinger::lower(3, 2.0).compute(&bars).unwrap();
        let pband = Bollinger::pband(3, 2.0).compute(&bars).unwrap();

        // Constant price → stddev = 0 → bands collapse to SMA
        assert_approx(upper[2], 100.0, DEFAULT_EPSILON);
        assert_approx(lower[2], 100.0, DEFAULT_EPSILON);
        assert!(pband[2].is_nan());
    }

    #[test]
    fn bollinger_nan_propagation() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        bars[2].close = f64::NAN;
        let result = Bollinger::upper(3, 2.0).compute(&bars).unwrap();
        assert!(result[2].is_nan());
        assert!(result[3].is_nan()); // window includes NaN bar 2
    }

    #[test]
    fn bollinger_rejects_negative_multiplier() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        assert!(matches!(
            Bollinger::pband(3, -1.0).compute(&bars),
            Err(IndicatorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn bollinger_lookback() {
        assert_eq!(Bollinger::upper(20, 2.0).lookback(), 19);
        assert_eq!(Bollinger::pband(3, 1.775).lookback(), 2);
    }
}
