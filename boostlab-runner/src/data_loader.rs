//! Price loading: CSV files and the synthetic fallback.
//!
//! CSV input needs a `Date,Open,High,Low,Close,Volume` header. Other columns
//! (`Adj Close`, dividends, ...) are ignored. Rows with an empty price field
//! are skipped with a warning; anything else malformed is an error.

use boostlab_core::domain::{Bar, PriceSeries, SeriesError};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("no usable bars in input")]
    Empty,

    #[error("invalid price series: {0}")]
    Series(#[from] SeriesError),
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date", alias = "date")]
    date: NaiveDate,
    #[serde(rename = "Open", alias = "open")]
    open: Option<f64>,
    #[serde(rename = "High", alias = "high")]
    high: Option<f64>,
    #[serde(rename = "Low", alias = "low")]
    low: Option<f64>,
    #[serde(rename = "Close", alias = "close")]
    close: Option<f64>,
    #[serde(rename = "Volume", alias = "volume")]
    volume: Option<f64>,
}

impl PriceRow {
    fn into_bar(self, row: usize) -> Result<Option<Bar>, LoadError> {
        let (Some(open), Some(high), Some(low), Some(close)) = (self.open, self.high, self.low, self.close)
        else {
            return Ok(None);
        };
        let volume = self.volume.unwrap_or(0.0);
        if !volume.is_finite() || volume < 0.0 {
            return Err(LoadError::InvalidRow {
                row,
                message: format!("volume {volume} is not a non-negative number"),
            });
        }
        Ok(Some(Bar {
            date: self.date,
            open,
            high,
            low,
            close,
            volume: volume.round() as u64,
        }))
    }
}

/// Load a CSV price file into a validated series.
pub fn load_csv(path: &Path) -> Result<PriceSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = read_prices(file)?;
    tracing::info!(
        "loaded {} bars from {} ({:?} to {:?})",
        series.len(),
        path.display(),
        series.first_date(),
        series.last_date()
    );
    Ok(series)
}

/// Parse CSV price data from any reader.
pub fn read_prices<R: Read>(reader: R) -> Result<PriceSeries, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for (i, record) in csv_reader.deserialize::<PriceRow>().enumerate() {
        // Data rows are 1-based after the header line.
        let row = i + 1;
        match record?.into_bar(row)? {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!("skipped {skipped} rows with missing prices");
    }
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(PriceSeries::new(bars)?)
}

/// Deterministic random-walk bars on weekdays between `start` and `end`.
///
/// The RNG is seeded from the BLAKE3 hash of `seed`, so the same label always
/// yields the same series.
pub fn generate_synthetic_bars(seed: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(seed.as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        // Overnight gap, then the intraday move.
        let open = price * (1.0 + rng.gen_range(-0.005..0.005));
        let close = open * (1.0 + rng.gen_range(-0.03..0.03));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Synthetic series for development runs without a price file.
pub fn synthetic_series(seed: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, LoadError> {
    tracing::warn!("using SYNTHETIC prices (seed '{seed}'); results are not market data");
    let bars = generate_synthetic_bars(seed, start, end);
    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(PriceSeries::new(bars)?)
}

/// BLAKE3 hash over every bar, for run summaries.
pub fn dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in series.bars() {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,100.0,102.0,99.0,101.0,100.5,120000
2024-01-03,101.0,103.0,100.0,102.5,102.0,98000
2024-01-04,102.5,104.0,101.5,103.0,102.4,101000
";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_yahoo_style_csv() {
        let series = read_prices(SAMPLE.as_bytes()).unwrap();
        assert_eq!(series.len(), 3);
        let first = &series.bars()[0];
        assert_eq!(first.date, d(2024, 1, 2));
        assert_eq!(first.open, 100.0);
        assert_eq!(first.close, 101.0);
        assert_eq!(first.volume, 120_000);
    }

    #[test]
    fn skips_rows_with_missing_prices() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-02,100.0,102.0,99.0,101.0,1000
2024-01-03,,,,,
2024-01-04,102.5,104.0,101.5,103.0,1000
";
        let series = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-03,100.0,102.0,99.0,101.0,1000
2024-01-02,100.0,102.0,99.0,101.0,1000
";
        let err = read_prices(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Series(SeriesError::OutOfOrder { .. })));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,abc,102.0,99.0,101.0,1000\n";
        assert!(matches!(read_prices(csv.as_bytes()), Err(LoadError::Csv(_))));
    }

    #[test]
    fn rejects_negative_volume() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,100.0,102.0,99.0,101.0,-5\n";
        assert!(matches!(
            read_prices(csv.as_bytes()),
            Err(LoadError::InvalidRow { row: 1, .. })
        ));
    }

    #[test]
    fn header_only_is_empty() {
        let csv = "Date,Open,High,Low,Close,Volume\n";
        assert!(matches!(read_prices(csv.as_bytes()), Err(LoadError::Empty)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv(Path::new("/nonexistent/prices.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn synthetic_bars_are_deterministic_weekdays() {
        let a = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 1, 31));
        let b = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(a, b);
        assert_eq!(a.len(), 23);
        assert!(a.iter().all(|bar| bar.date.weekday().number_from_monday() <= 5));
        assert!(a.iter().all(Bar::is_sane));
    }

    #[test]
    fn synthetic_seed_changes_series() {
        let a = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 1, 31));
        let b = generate_synthetic_bars("QQQ", d(2024, 1, 1), d(2024, 1, 31));
        assert_ne!(a, b);
    }

    #[test]
    fn synthetic_series_validates() {
        let series = synthetic_series("SPY", d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        assert!(!series.is_empty());
        assert!(matches!(
            synthetic_series("SPY", d(2024, 1, 6), d(2024, 1, 7)),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let a = read_prices(SAMPLE.as_bytes()).unwrap();
        let mut bars = a.bars().to_vec();
        bars[1].close = 102.6;
        let b = PriceSeries::new(bars).unwrap();
        assert_eq!(dataset_hash(&a), dataset_hash(&a.clone()));
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
    }
}
