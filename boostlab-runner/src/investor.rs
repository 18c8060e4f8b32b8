//! Investor abstraction: the per-day decision hooks and the cash/market account.
//!
//! Each trading day has two sessions. In the morning (at the open) and in the
//! afternoon (at the close) the investor sets `percentage_to_invest`; the
//! broker then rebalances the invested amount to that fraction of the total
//! account value.

use crate::ledger::LedgerRecord;
use boostlab_core::domain::{Bar, PriceSeries};
use boostlab_core::PipelineError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InvestorError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("percentage to invest must be within [0, 1], got {0}")]
    InvalidPercentage(f64),

    #[error("initial investment must be positive, got {0}")]
    InvalidInvestment(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Morning,
    Afternoon,
}

impl Session {
    /// Execution price of this session.
    pub fn price(self, bar: &Bar) -> f64 {
        match self {
            Session::Morning => bar.open,
            Session::Afternoon => bar.close,
        }
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Morning => write!(f, "morning"),
            Session::Afternoon => write!(f, "afternoon"),
        }
    }
}

/// What an investor may look at on one trading day.
///
/// The visible history runs through today's bar. Strategies that act at the
/// open must not read today's close; the direction model guarantees this by
/// dropping the final assembled row.
#[derive(Debug, Clone, Copy)]
pub struct DayData<'a> {
    series: &'a PriceSeries,
    index: usize,
}

impl<'a> DayData<'a> {
    pub fn new(series: &'a PriceSeries, index: usize) -> Option<Self> {
        (index < series.len()).then_some(Self { series, index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn today(&self) -> &'a Bar {
        &self.series.bars()[self.index]
    }

    pub fn date(&self) -> NaiveDate {
        self.today().date
    }

    /// All bars up to and including today.
    pub fn visible(&self) -> &'a [Bar] {
        self.series.visible_through(self.index)
    }

    /// The next trading day's bar, if any. Only the ledger uses this, to mark
    /// positions overnight.
    pub(crate) fn next(&self) -> Option<&'a Bar> {
        self.series.bars().get(self.index + 1)
    }
}

/// Broker confirmation returned after a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerUpdate {
    pub date: NaiveDate,
    /// Money moved into the market in this session (negative when selling).
    pub money_to_invest: f64,
    pub invested_money: f64,
    pub non_invested_money: f64,
}

/// Cash and market value of one investor.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestorAccount {
    initial_investment: f64,
    invested_money: f64,
    non_invested_money: f64,
    percentage_to_invest: f64,
    record: Vec<LedgerRecord>,
}

impl InvestorAccount {
    pub fn new(initial_investment: f64) -> Result<Self, InvestorError> {
        if !initial_investment.is_finite() || initial_investment <= 0.0 {
            return Err(InvestorError::InvalidInvestment(initial_investment));
        }
        Ok(Self {
            initial_investment,
            invested_money: 0.0,
            non_invested_money: initial_investment,
            percentage_to_invest: 0.0,
            record: Vec::new(),
        })
    }

    pub fn initial_investment(&self) -> f64 {
        self.initial_investment
    }

    pub fn invested_money(&self) -> f64 {
        self.invested_money
    }

    pub fn non_invested_money(&self) -> f64 {
        self.non_invested_money
    }

    pub fn total_value(&self) -> f64 {
        self.invested_money + self.non_invested_money
    }

    pub fn percentage_to_invest(&self) -> f64 {
        self.percentage_to_invest
    }

    pub fn set_percentage_to_invest(&mut self, percentage: f64) -> Result<(), InvestorError> {
        if !(0.0..=1.0).contains(&percentage) {
            return Err(InvestorError::InvalidPercentage(percentage));
        }
        self.percentage_to_invest = percentage;
        Ok(())
    }

    /// Daily records appended by the ledger.
    pub fn record(&self) -> &[LedgerRecord] {
        &self.record
    }

    pub(crate) fn push_record(&mut self, record: LedgerRecord) {
        self.record.push(record);
    }

    /// Rebalance to `percentage_to_invest` of the total value at the session
    /// price. Returns the money moved into the market.
    pub fn broker(&mut self, session: Session, day: &DayData<'_>) -> f64 {
        let total = self.total_value();
        let target = self.percentage_to_invest * total;
        let moved = target - self.invested_money;
        self.invested_money = target;
        self.non_invested_money = total - target;
        tracing::debug!(
            "{} {}: {:.0}% at {:.4}, moved {:.2}, invested {:.2}, cash {:.2}",
            day.date(),
            session,
            self.percentage_to_invest * 100.0,
            session.price(day.today()),
            moved,
            self.invested_money,
            self.non_invested_money
        );
        moved
    }

    /// Revalue the invested amount for a price move from `from` to `to`.
    pub fn mark_to_market(&mut self, from: f64, to: f64) {
        if self.invested_money != 0.0 && from > 0.0 {
            self.invested_money *= to / from;
        }
    }
}

/// A strategy driven by the ledger, one morning and one afternoon per day.
pub trait Investor {
    /// Display name used in logs and summaries.
    fn name(&self) -> &str;

    fn account(&self) -> &InvestorAccount;

    fn account_mut(&mut self) -> &mut InvestorAccount;

    /// Decide `percentage_to_invest` before the open.
    fn possibly_invest_morning(&mut self, data: &DayData<'_>) -> Result<(), InvestorError>;

    /// Decide `percentage_to_invest` before the close.
    fn possibly_invest_afternoon(&mut self, data: &DayData<'_>) -> Result<(), InvestorError>;

    /// Broker confirmation for the session just executed.
    fn return_broker_update(&self, money_invested_today: f64, data: &DayData<'_>) -> BrokerUpdate {
        let account = self.account();
        BrokerUpdate {
            date: data.date(),
            money_to_invest: money_invested_today,
            invested_money: account.invested_money(),
            non_invested_money: account.non_invested_money(),
        }
    }
}

/// Keeps everything in cash. Baseline for comparisons and ledger tests.
#[derive(Debug, Clone)]
pub struct CashInvestor {
    account: InvestorAccount,
}

impl CashInvestor {
    pub fn new(initial_investment: f64) -> Result<Self, InvestorError> {
        Ok(Self {
            account: InvestorAccount::new(initial_investment)?,
        })
    }
}

impl Investor for CashInvestor {
    fn name(&self) -> &str {
        "cash"
    }

    fn account(&self) -> &InvestorAccount {
        &self.account
    }

    fn account_mut(&mut self) -> &mut InvestorAccount {
        &mut self.account
    }

    fn possibly_invest_morning(&mut self, _data: &DayData<'_>) -> Result<(), InvestorError> {
        self.account.set_percentage_to_invest(0.0)
    }

    fn possibly_invest_afternoon(&mut self, _data: &DayData<'_>) -> Result<(), InvestorError> {
        self.account.set_percentage_to_invest(0.0)
    }
}

/// Fully invested at every open, flat at every close.
#[derive(Debug, Clone)]
pub struct IntradayInvestor {
    account: InvestorAccount,
}

impl IntradayInvestor {
    pub fn new(initial_investment: f64) -> Result<Self, InvestorError> {
        Ok(Self {
            account: InvestorAccount::new(initial_investment)?,
        })
    }
}

impl Investor for IntradayInvestor {
    fn name(&self) -> &str {
        "intraday"
    }

    fn account(&self) -> &InvestorAccount {
        &self.account
    }

    fn account_mut(&mut self) -> &mut InvestorAccount {
        &mut self.account
    }

    fn possibly_invest_morning(&mut self, _data: &DayData<'_>) -> Result<(), InvestorError> {
        self.account.set_percentage_to_invest(1.0)
    }

    fn possibly_invest_afternoon(&mut self, _data: &DayData<'_>) -> Result<(), InvestorError> {
        self.account.set_percentage_to_invest(0.0)
    }
}
