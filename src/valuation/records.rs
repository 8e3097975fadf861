//! Output records produced by the valuation engine

use crate::month::YearMonth;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound::{Excluded, Unbounded};

/// A calculated interest payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcTxn {
    pay_month: YearMonth,
    pay_date: NaiveDate,
    pay_amount: Decimal,
    memo: String,
    /// Month the interest was credited, before any deferral
    accrual_month: YearMonth,
    /// Balance at the end of the payment month, filled in once that month's cash flow is known
    ending_bal: Decimal,
}

impl CalcTxn {
    pub fn new(
        accrual_month: YearMonth,
        pay_month: YearMonth,
        pay_amount: Decimal,
        memo: String,
    ) -> Self {
        Self {
            pay_month,
            pay_date: pay_month.first_day(),
            pay_amount,
            memo,
            accrual_month,
            ending_bal: Decimal::ZERO,
        }
    }

    pub fn pay_month(&self) -> YearMonth {
        self.pay_month
    }

    /// First day of the payment month
    pub fn pay_date(&self) -> NaiveDate {
        self.pay_date
    }

    pub fn pay_amount(&self) -> Decimal {
        self.pay_amount
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn accrual_month(&self) -> YearMonth {
        self.accrual_month
    }

    pub fn ending_bal(&self) -> Decimal {
        self.ending_bal
    }

    pub fn set_ending_bal(&mut self, ending_bal: Decimal) {
        self.ending_bal = ending_bal;
    }

    /// Whether the payment was pushed past the month it was credited
    pub fn is_deferred(&self) -> bool {
        self.pay_month > self.accrual_month
    }
}

impl fmt::Display for CalcTxn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pay {} for {}", self.pay_date, self.pay_amount, self.memo)
    }
}

/// Calculated interest payments indexed by payment month.
/// A month can hold several payments: when a bond turns 5 years old it
/// receives the interest of the prior 3 months, which is no longer lost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcTxnList {
    by_month: BTreeMap<YearMonth, Vec<CalcTxn>>,
}

impl CalcTxnList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payment to the end of its payment month's list
    pub fn add(&mut self, txn: CalcTxn) {
        self.by_month.entry(txn.pay_month()).or_default().push(txn);
    }

    /// Payments for a month, in the order they were added
    pub fn for_month(&self, month: YearMonth) -> Option<&[CalcTxn]> {
        self.by_month.get(&month).map(Vec::as_slice)
    }

    pub(crate) fn for_month_mut(&mut self, month: YearMonth) -> Option<&mut Vec<CalcTxn>> {
        self.by_month.get_mut(&month)
    }

    /// Payment months strictly after the given month, in order
    pub fn tail_keys(&self, after: YearMonth) -> impl Iterator<Item = YearMonth> + '_ {
        self.by_month.range((Excluded(after), Unbounded)).map(|(month, _)| *month)
    }

    /// Sum of the payments made strictly after the given month
    pub fn total_paid_after(&self, after: YearMonth) -> Decimal {
        self.by_month
            .range((Excluded(after), Unbounded))
            .flat_map(|(_, txns)| txns)
            .map(CalcTxn::pay_amount)
            .sum()
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.by_month.keys().copied()
    }

    pub fn last_month(&self) -> Option<YearMonth> {
        self.by_month.keys().next_back().copied()
    }

    /// All payments in payment month order
    pub fn iter(&self) -> impl Iterator<Item = &CalcTxn> {
        self.by_month.values().flatten()
    }

    /// Remove every payment matching the predicate
    pub fn remove_if<P: FnMut(&CalcTxn) -> bool>(&mut self, mut filter: P) {
        for txns in self.by_month.values_mut() {
            txns.retain(|txn| !filter(txn));
        }
        self.by_month.retain(|_, txns| !txns.is_empty());
    }

    /// Discard payments after the given month; they would change if redemptions occur
    pub fn discard_after(&mut self, month: YearMonth) {
        self.remove_if(|txn| txn.pay_month() > month);
    }

    pub fn len(&self) -> usize {
        self.by_month.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_month.is_empty()
    }
}

impl<'a> IntoIterator for &'a CalcTxnList {
    type Item = &'a CalcTxn;
    type IntoIter = std::iter::Flatten<std::collections::btree_map::Values<'a, YearMonth, Vec<CalcTxn>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.by_month.values().flatten()
    }
}

/// A share price in effect on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRec {
    share_price: Decimal,
    date: NaiveDate,
}

impl PriceRec {
    pub fn new(share_price: Decimal, date: NaiveDate) -> Self {
        Self { share_price, date }
    }

    pub fn share_price(&self) -> Decimal {
        self.share_price
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub(crate) fn set_share_price(&mut self, share_price: Decimal) {
        self.share_price = share_price;
    }
}
