//! Windowed lag expansion.
//!
//! `expand(frame, W)` keeps every original column and appends, for each lag
//! `k in 1..=W`, a copy of every column shifted forward by `k` rows. Rows
//! before the start of history are zero, not NaN. Column order is
//! originals, then all lag-1 columns, then all lag-2 columns, and so on, each
//! group in the original order. The classifier reads columns positionally,
//! so this order is part of the model contract.

use crate::features::frame::{FeatureFrame, FeatureSchema};
use crate::features::FeatureError;

/// Name of the copy of `name` lagged by `lag` rows.
pub fn lag_column_name(name: &str, lag: usize) -> String {
    format!("{name}_-{lag}")
}

/// Schema produced by expanding a frame with schema `base`.
pub fn expanded_schema(base: &FeatureSchema, window: usize) -> FeatureSchema {
    let mut columns = base.columns().to_vec();
    for lag in 1..=window {
        columns.extend(base.columns().iter().map(|name| lag_column_name(name, lag)));
    }
    FeatureSchema::new(columns)
}

/// Append `window` zero-filled lagged copies of every column.
pub fn expand(frame: &FeatureFrame, window: usize) -> Result<FeatureFrame, FeatureError> {
    let n = frame.n_rows();
    let mut out = frame.clone();
    for lag in 1..=window {
        for (name, values) in frame.columns() {
            let fill = lag.min(n);
            let mut shifted = vec![0.0; fill];
            shifted.extend_from_slice(&values[..n - fill]);
            out.push_column(lag_column_name(name, lag), shifted)?;
        }
    }
    Ok(out)
}
