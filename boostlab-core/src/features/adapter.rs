//! Indicator adapter: maps a layout preset to one indicator output column.

use crate::domain::Bar;
use crate::features::layout::{AdxOutput, BollingerOutput, FeatureSource, StochRsiOutput};
use crate::features::FeatureError;
use crate::indicators::{Adx, Bollinger, Indicator, StochRsi};
use serde::{Deserialize, Serialize};

/// How warm-up values of indicator columns are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupPolicy {
    /// Non-finite values take the indicator's fill value (constant or backfill).
    #[default]
    LibraryFill,
    /// Warm-up values stay NaN; rows holding them never reach the classifier.
    Undefined,
}

enum Fill {
    Constant(f64),
    Backfill,
}

/// Indicator instance for a preset, or `None` for price-derived sources.
pub fn indicator_for(source: &FeatureSource) -> Option<Box<dyn Indicator>> {
    let indicator: Box<dyn Indicator> = match *source {
        FeatureSource::Bollinger {
            window,
            std_dev,
            output,
        } => Box::new(match output {
            BollingerOutput::Hband => Bollinger::upper(window, std_dev),
            BollingerOutput::Mavg => Bollinger::middle(window, std_dev),
            BollingerOutput::Lband => Bollinger::lower(window, std_dev),
            BollingerOutput::Pband => Bollinger::pband(window, std_dev),
        }),
        FeatureSource::Adx { window, output } => Box::new(match output {
            AdxOutput::AdxPos => Adx::positive(window),
            AdxOutput::AdxNeg => Adx::negative(window),
        }),
        FeatureSource::StochRsi {
            window,
            smooth1,
            smooth2,
            output,
        } => Box::new(match output {
            StochRsiOutput::K => StochRsi::k(window, smooth1, smooth2),
            StochRsiOutput::D => StochRsi::d(window, smooth1, smooth2),
        }),
        _ => return None,
    };
    Some(indicator)
}

fn fill_for(source: &FeatureSource) -> Option<Fill> {
    match source {
        FeatureSource::Bollinger { output, .. } => Some(match output {
            BollingerOutput::Pband => Fill::Constant(0.0),
            _ => Fill::Backfill,
        }),
        FeatureSource::Adx { .. } => Some(Fill::Constant(20.0)),
        FeatureSource::StochRsi { .. } => Some(Fill::Constant(0.0)),
        _ => None,
    }
}

/// Compute the indicator column a preset names.
///
/// Returns `Ok(None)` for price-derived sources, which the assembler builds
/// itself. Indicator errors propagate unchanged.
pub fn indicator_column(
    bars: &[Bar],
    source: &FeatureSource,
    policy: WarmupPolicy,
) -> Result<Option<Vec<f64>>, FeatureError> {
    let Some(indicator) = indicator_for(source) else {
        return Ok(None);
    };
    let mut values = indicator.compute(bars)?;
    if policy == WarmupPolicy::LibraryFill {
        match fill_for(source) {
            Some(Fill::Constant(c)) => {
                for v in values.iter_mut().filter(|v| !v.is_finite()) {
                    *v = c;
                }
            }
            Some(Fill::Backfill) => backfill(&mut values),
            None => {}
        }
    }
    Ok(Some(values))
}

/// Replace each non-finite value by the next finite one, if any.
fn backfill(values: &mut [f64]) {
    let mut next = f64::NAN;
    for v in values.iter_mut().rev() {
        if v.is_finite() {
            next = *v;
        } else {
            *v = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, IndicatorError};

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.5).sin() * 4.0).collect()
    }

    #[test]
    fn derived_sources_have_no_indicator() {
        let bars = make_bars(&closes(10));
        for source in [
            FeatureSource::ReturnInterday,
            FeatureSource::ReturnOpen,
            FeatureSource::ReturnIntraday,
            FeatureSource::Volume,
        ] {
            assert!(indicator_for(&source).is_none());
            assert_eq!(
                indicator_column(&bars, &source, WarmupPolicy::Undefined).unwrap(),
                None
            );
        }
    }

    #[test]
    fn undefined_policy_keeps_warmup_nan() {
        let bars = make_bars(&closes(20));
        let source = FeatureSource::Adx {
            window: 6,
            output: AdxOutput::AdxPos,
        };
        let column = indicator_column(&bars, &source, WarmupPolicy::Undefined)
            .unwrap()
            .unwrap();
        assert_eq!(column.len(), 20);
        assert!(column[..7].iter().all(|v| v.is_nan()));
        assert!(column[7..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn library_fill_uses_indicator_constants() {
        let bars = make_bars(&closes(20));
        let adx = FeatureSource::Adx {
            window: 6,
            output: AdxOutput::AdxNeg,
        };
        let column = indicator_column(&bars, &adx, WarmupPolicy::LibraryFill)
            .unwrap()
            .unwrap();
        assert!(column[..7].iter().all(|&v| v == 20.0));

        let pband = FeatureSource::Bollinger {
            window: 3,
            std_dev: 1.775,
            output: BollingerOutput::Pband,
        };
        let column = indicator_column(&bars, &pband, WarmupPolicy::LibraryFill)
            .unwrap()
            .unwrap();
        assert_eq!(&column[..2], &[0.0, 0.0]);
    }

    #[test]
    fn library_fill_backfills_bands() {
        let bars = make_bars(&closes(10));
        let mavg = FeatureSource::Bollinger {
            window: 3,
            std_dev: 2.0,
            output: BollingerOutput::Mavg,
        };
        let column = indicator_column(&bars, &mavg, WarmupPolicy::LibraryFill)
            .unwrap()
            .unwrap();
        assert_eq!(column[0], column[2]);
        assert_eq!(column[1], column[2]);
    }

    #[test]
    fn indicator_errors_propagate() {
        let bars = make_bars(&closes(30));
        let source = FeatureSource::StochRsi {
            window: 47,
            smooth1: 43,
            smooth2: 12,
            output: StochRsiOutput::K,
        };
        let err = indicator_column(&bars, &source, WarmupPolicy::LibraryFill).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Indicator(IndicatorError::InsufficientHistory { window: 47, .. })
        ));
    }

    #[test]
    fn default_policy_fills_warmup() {
        assert_eq!(WarmupPolicy::default(), WarmupPolicy::LibraryFill);
        let bars = make_bars(&closes(20));
        let source = FeatureSource::Adx {
            window: 6,
            output: AdxOutput::AdxPos,
        };
        let column = indicator_column(&bars, &source, WarmupPolicy::default())
            .unwrap()
            .unwrap();
        assert!(column.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn stoch_rsi_d_preset_reports_smoothed_line() {
        let bars = make_bars(&closes(60));
        let preset = |output| FeatureSource::StochRsi {
            window: 5,
            smooth1: 3,
            smooth2: 4,
            output,
        };
        let k = indicator_column(&bars, &preset(StochRsiOutput::K), WarmupPolicy::Undefined)
            .unwrap()
            .unwrap();
        let d = indicator_column(&bars, &preset(StochRsiOutput::D), WarmupPolicy::Undefined)
            .unwrap()
            .unwrap();
        let lookback = indicator_for(&preset(StochRsiOutput::D)).unwrap().lookback();
        assert_eq!(lookback, 13);
        assert!(d[..lookback].iter().all(|v| v.is_nan()));
        let expected = k[lookback - 3..=lookback].iter().sum::<f64>() / 4.0;
        assert!((d[lookback] - expected).abs() < 1e-12);

        let filled = indicator_column(&bars, &preset(StochRsiOutput::D), WarmupPolicy::LibraryFill)
            .unwrap()
            .unwrap();
        assert!(filled[..lookback].iter().all(|&v| v == 0.0));
        assert_eq!(filled[lookback], d[lookback]);
    }

    #[test]
    fn backfill_leaves_trailing_gaps() {
        let mut values = vec![f64::NAN, 1.0, f64::NAN, 2.0, f64::NAN];
        backfill(&mut values);
        assert_eq!(&values[..4], &[1.0, 1.0, 2.0, 2.0]);
        assert!(values[4].is_nan());
    }
}
