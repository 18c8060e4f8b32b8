//! PriceSeries — validated, date-ordered daily bars.

use super::bar::Bar;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating a price series.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("duplicate date {date} at row {index}")]
    DuplicateDate { date: NaiveDate, index: usize },

    #[error("dates out of order at row {index}: {date} follows {previous}")]
    OutOfOrder {
        previous: NaiveDate,
        date: NaiveDate,
        index: usize,
    },

    #[error("bar for {date} failed OHLC sanity checks")]
    InsaneBar { date: NaiveDate },
}

/// Daily bars strictly increasing by date.
///
/// Gaps (weekends, holidays) are allowed; duplicates are not. The series is
/// immutable once built: strategies only ever borrow prefixes of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(SeriesError::InsaneBar { date: bar.date });
            }
            if index == 0 {
                continue;
            }
            let previous = bars[index - 1].date;
            if bar.date == previous {
                return Err(SeriesError::DuplicateDate {
                    date: bar.date,
                    index,
                });
            }
            if bar.date < previous {
                return Err(SeriesError::OutOfOrder {
                    previous,
                    date: bar.date,
                    index,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Bars a strategy may see on day `index`: everything up to and including it.
    pub fn visible_through(&self, index: usize) -> &[Bar] {
        let end = (index + 1).min(self.bars.len());
        &self.bars[..end]
    }

    /// Index of the first bar on or after `date`.
    pub fn index_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.bars.partition_point(|b| b.date < date);
        (idx < self.bars.len()).then_some(idx)
    }

    /// Index of the last bar on or before `date`.
    pub fn index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.bars.partition_point(|b| b.date <= date);
        idx.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn accepts_increasing_dates_with_gaps() {
        let series = PriceSeries::new(vec![bar(2, 100.0), bar(3, 101.0), bar(8, 99.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 1, 8));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new(vec![bar(2, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateDate { index: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let err = PriceSeries::new(vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn rejects_insane_bars() {
        let mut bad = bar(2, 100.0);
        bad.high = 50.0;
        assert!(matches!(
            PriceSeries::new(vec![bad]),
            Err(SeriesError::InsaneBar { .. })
        ));
    }

    #[test]
    fn visible_through_includes_today() {
        let series = PriceSeries::new(vec![bar(2, 100.0), bar(3, 101.0), bar(4, 102.0)]).unwrap();
        assert_eq!(series.visible_through(1).len(), 2);
        assert_eq!(series.visible_through(10).len(), 3);
    }

    #[test]
    fn date_lookups() {
        let series = PriceSeries::new(vec![bar(2, 100.0), bar(4, 101.0), bar(8, 102.0)]).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert_eq!(series.index_on_or_after(d(3)), Some(1));
        assert_eq!(series.index_on_or_after(d(9)), None);
        assert_eq!(series.index_on_or_before(d(7)), Some(1));
        assert_eq!(series.index_on_or_before(d(1)), None);
    }
}
