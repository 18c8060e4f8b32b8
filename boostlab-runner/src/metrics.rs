//! Performance metrics — pure functions over a daily value curve.
//!
//! The curve starts with the initial investment followed by the end-of-day
//! total value of every simulated day.

use serde::{Deserialize, Serialize};

/// Trading days per year used for annualisation.
const TRADING_DAYS: f64 = 252.0;

/// Aggregate performance metrics for a single ledger run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    /// Days with money in the market after the morning session.
    pub invested_days: usize,
    pub trading_days: usize,
}

impl PerformanceMetrics {
    pub fn compute(value_curve: &[f64], invested_days: usize) -> Self {
        let trading_days = value_curve.len().saturating_sub(1);
        Self {
            total_return: total_return(value_curve),
            cagr: cagr(value_curve, trading_days),
            sharpe: sharpe_ratio(value_curve, 0.0),
            max_drawdown: max_drawdown(value_curve),
            invested_days,
            trading_days,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn endpoints(curve: &[f64]) -> Option<(f64, f64)> {
    match (curve.first(), curve.last()) {
        (Some(&first), Some(&last)) if curve.len() >= 2 => Some((first, last)),
        _ => None,
    }
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(curve: &[f64]) -> f64 {
    match endpoints(curve) {
        Some((initial, final_value)) if initial > 0.0 => (final_value - initial) / initial,
        _ => 0.0,
    }
}

/// Compound annual growth rate over `trading_days`.
pub fn cagr(curve: &[f64], trading_days: usize) -> f64 {
    let Some((initial, final_value)) = endpoints(curve) else {
        return 0.0;
    };
    if trading_days < 2 || initial <= 0.0 || final_value <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS;
    (final_value / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio from daily returns.
///
/// Returns 0.0 if variance is zero or there are fewer than 2 returns.
pub fn sharpe_ratio(curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&excess) / std * TRADING_DAYS.sqrt()
}

/// Largest peak-to-trough decline as a negative fraction (0.0 if none).
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &value in curve {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min((value - peak) / peak);
        }
    }
    worst
}

/// Simple day-over-day returns.
pub fn daily_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
