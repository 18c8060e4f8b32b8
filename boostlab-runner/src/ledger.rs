//! Portfolio ledger: drives an investor through a date range.
//!
//! Per trading day:
//! 1. morning decision, executed at the open
//! 2. mark to the close
//! 3. afternoon decision, executed at the close
//! 4. mark to the next open
//!
//! One `LedgerRecord` is appended after the afternoon session.

use crate::investor::{BrokerUpdate, DayData, Investor, InvestorError, Session};
use crate::metrics::PerformanceMetrics;
use boostlab_core::domain::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("no trading days between {start:?} and {end:?}")]
    EmptyRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },

    #[error("investor failed on {date}: {source}")]
    Investor {
        date: NaiveDate,
        #[source]
        source: InvestorError,
    },
}

/// Inclusive date bounds; `None` means the series edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// First and last bar index inside the range.
    pub fn resolve(&self, series: &PriceSeries) -> Result<(usize, usize), LedgerError> {
        if series.is_empty() {
            return Err(LedgerError::EmptySeries);
        }
        let empty = || LedgerError::EmptyRange {
            start: self.start,
            end: self.end,
        };
        let first = match self.start {
            Some(date) => series.index_on_or_after(date).ok_or_else(empty)?,
            None => 0,
        };
        let last = match self.end {
            Some(date) => series.index_on_or_before(date).ok_or_else(empty)?,
            None => series.len() - 1,
        };
        if first > last {
            return Err(empty());
        }
        Ok((first, last))
    }
}

/// End-of-day account snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub date: NaiveDate,
    /// Money moved into the market at the open.
    pub money_invested_today: f64,
    pub money_invested: f64,
    pub money_not_invested: f64,
    pub total_value: f64,
}

/// A broker confirmation tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub session: Session,
    pub update: BrokerUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub investor: String,
    pub initial_investment: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub records: Vec<LedgerRecord>,
    pub broker_updates: Vec<SessionUpdate>,
    pub metrics: PerformanceMetrics,
}

impl LedgerReport {
    pub fn final_value(&self) -> f64 {
        self.records
            .last()
            .map_or(self.initial_investment, |r| r.total_value)
    }

    /// Initial investment followed by every end-of-day total value.
    pub fn value_curve(&self) -> Vec<f64> {
        std::iter::once(self.initial_investment)
            .chain(self.records.iter().map(|r| r.total_value))
            .collect()
    }
}

pub struct Ledger;

impl Ledger {
    /// Run `investor` over every trading day of `series` inside `range`.
    pub fn run<I: Investor + ?Sized>(
        series: &PriceSeries,
        investor: &mut I,
        range: DateRange,
    ) -> Result<LedgerReport, LedgerError> {
        let (first, last) = range.resolve(series)?;
        let initial_investment = investor.account().initial_investment();
        let mut records = Vec::with_capacity(last - first + 1);
        let mut broker_updates = Vec::with_capacity(2 * (last - first + 1));
        let mut invested_days = 0usize;

        for index in first..=last {
            let Some(day) = DayData::new(series, index) else {
                break;
            };
            let bar = day.today();
            let failed = |source| LedgerError::Investor {
                date: bar.date,
                source,
            };

            investor.possibly_invest_morning(&day).map_err(failed)?;
            let morning = investor.account_mut().broker(Session::Morning, &day);
            broker_updates.push(SessionUpdate {
                session: Session::Morning,
                update: investor.return_broker_update(morning, &day),
            });
            if investor.account().invested_money() > 0.0 {
                invested_days += 1;
            }

            investor.account_mut().mark_to_market(bar.open, bar.close);

            investor.possibly_invest_afternoon(&day).map_err(failed)?;
            let afternoon = investor.account_mut().broker(Session::Afternoon, &day);
            broker_updates.push(SessionUpdate {
                session: Session::Afternoon,
                update: investor.return_broker_update(afternoon, &day),
            });

            let account = investor.account();
            let record = LedgerRecord {
                date: bar.date,
                money_invested_today: morning,
                money_invested: account.invested_money(),
                money_not_invested: account.non_invested_money(),
                total_value: account.total_value(),
            };
            investor.account_mut().push_record(record.clone());
            records.push(record);

            if let Some(next) = day.next() {
                investor.account_mut().mark_to_market(bar.close, next.open);
            }
        }

        let value_curve: Vec<f64> = std::iter::once(initial_investment)
            .chain(records.iter().map(|r: &LedgerRecord| r.total_value))
            .collect();
        let report = LedgerReport {
            investor: investor.name().to_string(),
            initial_investment,
            start_date: series.bars()[first].date,
            end_date: series.bars()[last].date,
            records,
            broker_updates,
            metrics: PerformanceMetrics::compute(&value_curve, invested_days),
        };

        tracing::info!(
            "ledger '{}' {} to {}: {} days, final value {:.2} ({:+.2}%), invested {} days, max drawdown {:.2}%",
            report.investor,
            report.start_date,
            report.end_date,
            report.records.len(),
            report.final_value(),
            report.metrics.total_return * 100.0,
            report.metrics.invested_days,
            report.metrics.max_drawdown * 100.0
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investor::{CashInvestor, IntradayInvestor};
    use boostlab_core::domain::Bar;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(day: u32, open: f64, close: f64) -> Bar {
        Bar {
            date: d(day),
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
            volume: 1_000,
        }
    }

    fn series() -> PriceSeries {
        PriceSeries::new(vec![
            bar(2, 100.0, 110.0),
            bar(3, 105.0, 100.0),
            bar(4, 100.0, 120.0),
        ])
        .unwrap()
    }

    #[test]
    fn cash_investor_keeps_capital() {
        let series = series();
        let mut investor = CashInvestor::new(1_000.0).unwrap();
        let report = Ledger::run(&series, &mut investor, DateRange::default()).unwrap();
        assert_eq!(report.records.len(), 3);
        assert!(report.records.iter().all(|r| r.total_value == 1_000.0));
        assert_eq!(report.final_value(), 1_000.0);
        assert_eq!(report.metrics.total_return, 0.0);
        assert_eq!(report.metrics.invested_days, 0);
        assert_eq!(report.broker_updates.len(), 6);
    }

    #[test]
    fn intraday_investor_compounds_open_to_close() {
        let series = series();
        let mut investor = IntradayInvestor::new(1_000.0).unwrap();
        let report = Ledger::run(&series, &mut investor, DateRange::default()).unwrap();

        let expected = 1_000.0 * (110.0 / 100.0) * (100.0 / 105.0) * (120.0 / 100.0);
        assert!((report.final_value() - expected).abs() < 1e-9);
        assert_eq!(report.metrics.invested_days, 3);
        assert_eq!(report.records[0].money_invested_today, 1_000.0);
        assert_eq!(report.records[0].money_invested, 0.0);
        assert!((report.records[0].total_value - 1_100.0).abs() < 1e-9);

        let afternoon = &report.broker_updates[1];
        assert_eq!(afternoon.session, Session::Afternoon);
        assert!((afternoon.update.money_to_invest + 1_100.0).abs() < 1e-9);
    }

    #[test]
    fn value_is_conserved() {
        let series = series();
        let mut investor = IntradayInvestor::new(500.0).unwrap();
        let report = Ledger::run(&series, &mut investor, DateRange::default()).unwrap();
        for record in &report.records {
            assert!((record.money_invested + record.money_not_invested - record.total_value).abs() < 1e-9);
        }
        assert_eq!(investor.account().record(), &report.records[..]);
    }

    #[test]
    fn range_selects_days() {
        let series = series();
        let mut investor = CashInvestor::new(1_000.0).unwrap();
        let report = Ledger::run(&series, &mut investor, DateRange::new(Some(d(3)), Some(d(3)))).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.start_date, d(3));
        assert_eq!(report.end_date, d(3));
    }

    #[test]
    fn range_outside_series_is_error() {
        let series = series();
        let mut investor = CashInvestor::new(1_000.0).unwrap();
        let err = Ledger::run(&series, &mut investor, DateRange::new(Some(d(10)), None)).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyRange { .. }));

        let err = DateRange::new(Some(d(4)), Some(d(3))).resolve(&series).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyRange { .. }));

        let empty = PriceSeries::new(Vec::new()).unwrap();
        assert_eq!(DateRange::default().resolve(&empty), Err(LedgerError::EmptySeries));
    }
}
