//! Transactions of one security in one investment account

use super::data::{LedgerTxn, LedgerTxnKind};
use crate::month::YearMonth;
use crate::valuation::{CalcTxn, ExternalCashFlowProvider};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A security's transactions in an investment account, indexed by date
#[derive(Debug, Clone, Default)]
pub struct InvestTxnList {
    account: String,
    ticker: String,
    by_date: BTreeMap<NaiveDate, Vec<LedgerTxn>>,
}

impl InvestTxnList {
    pub fn new<I>(account: &str, ticker: &str, txns: I) -> Self
    where
        I: IntoIterator<Item = LedgerTxn>,
    {
        let mut by_date: BTreeMap<NaiveDate, Vec<LedgerTxn>> = BTreeMap::new();
        for txn in txns {
            by_date.entry(txn.date).or_default().push(txn);
        }

        Self {
            account: account.to_string(),
            ticker: ticker.to_string(),
            by_date,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Deposits and redemptions dated in the month
    pub fn changes_for_month(&self, month: YearMonth) -> impl Iterator<Item = &LedgerTxn> {
        self.by_date
            .range(month.first_day()..=month.last_day())
            .flat_map(|(_, txns)| txns)
            .filter(|txn| txn.kind.is_external_change())
    }

    /// Net deposits and redemptions in the month
    pub fn change_for_month(&self, month: YearMonth) -> Decimal {
        let changes: Vec<_> = self.changes_for_month(month).collect();
        let total: Decimal = changes.iter().map(|txn| txn.amount).sum();

        if !changes.is_empty() {
            let detail: Vec<_> = changes
                .iter()
                .map(|txn| format!("{} on {}", txn.amount, txn.date))
                .collect();
            log::debug!(
                "From {}:{} add {} => {} for the month",
                self.account,
                self.ticker,
                detail.join("; "),
                total
            );
        }

        total
    }

    /// First reinvested interest transaction on the payment date whose memo
    /// matches, ignoring case
    pub fn matching_interest_txn(&self, calc_txn: &CalcTxn) -> Option<&LedgerTxn> {
        self.by_date.get(&calc_txn.pay_date())?.iter().find(|txn| {
            txn.kind == LedgerTxnKind::DividendReinvest
                && txn.memo.eq_ignore_ascii_case(calc_txn.memo())
        })
    }

    /// Value held at the end of the date
    pub fn balance_as_of(&self, date: NaiveDate) -> Decimal {
        self.by_date
            .range(..=date)
            .flat_map(|(_, txns)| txns)
            .map(|txn| txn.amount)
            .sum()
    }
}

impl ExternalCashFlowProvider for InvestTxnList {
    fn net_change(&mut self, month: YearMonth) -> Decimal {
        self.change_for_month(month)
    }
}
