//! Property tests for the ledger and performance metrics.
//!
//! 1. Value conservation — invested + cash equals total on every record
//! 2. Intraday compounding — final value is the product of close/open moves
//! 3. Drawdown bounds — always in [-1, 0] for positive curves

use boostlab_core::domain::{Bar, PriceSeries};
use boostlab_runner::investor::{CashInvestor, IntradayInvestor, Session};
use boostlab_runner::ledger::{DateRange, Ledger};
use boostlab_runner::metrics::max_drawdown;
use chrono::NaiveDate;
use proptest::prelude::*;

fn arb_series() -> impl Strategy<Value = PriceSeries> {
    prop::collection::vec((1.0..500.0_f64, 1.0..500.0_f64), 1..40).prop_map(|rows| {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = rows
            .into_iter()
            .enumerate()
            .map(|(i, (open, close))| Bar {
                date: start + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) * 0.9,
                close,
                volume: 1_000,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    })
}

proptest! {
    #[test]
    fn intraday_value_compounds_open_to_close(series in arb_series(), initial in 100.0..1e6_f64) {
        let mut investor = IntradayInvestor::new(initial).unwrap();
        let report = Ledger::run(&series, &mut investor, DateRange::default()).unwrap();

        let expected = series
            .bars()
            .iter()
            .fold(initial, |value, bar| value * bar.close / bar.open);
        prop_assert!((report.final_value() - expected).abs() <= 1e-9 * expected.max(1.0));
        prop_assert_eq!(report.records.len(), series.len());
        prop_assert_eq!(report.metrics.invested_days, series.len());

        for record in &report.records {
            let sum = record.money_invested + record.money_not_invested;
            prop_assert!((sum - record.total_value).abs() <= 1e-9 * record.total_value.max(1.0));
            prop_assert_eq!(record.money_invested, 0.0);
        }
        for update in report.broker_updates.iter().filter(|u| u.session == Session::Afternoon) {
            prop_assert_eq!(update.update.invested_money, 0.0);
        }
    }

    #[test]
    fn cash_investor_never_moves(series in arb_series(), initial in 1.0..1e6_f64) {
        let mut investor = CashInvestor::new(initial).unwrap();
        let report = Ledger::run(&series, &mut investor, DateRange::default()).unwrap();
        prop_assert!(report.records.iter().all(|r| r.total_value == initial));
        prop_assert_eq!(report.metrics.invested_days, 0);
        prop_assert_eq!(report.metrics.max_drawdown, 0.0);
    }

    #[test]
    fn drawdown_is_bounded(curve in prop::collection::vec(0.01..1e6_f64, 0..100)) {
        let dd = max_drawdown(&curve);
        prop_assert!((-1.0..=0.0).contains(&dd));
    }
}
