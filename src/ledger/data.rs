//! Ledger data structures for security holdings in investment accounts

use crate::month::YearMonth;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::invest::InvestTxnList;

/// Kind of investment transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerTxnKind {
    /// Purchase paid from the investment account
    Buy,
    /// Purchase paid by transfer from another account
    BuyXfer,
    /// Redemption into the investment account
    Sell,
    /// Redemption transferred to another account
    SellXfer,
    /// Interest or dividend reinvested in the security
    DividendReinvest,
    /// Anything else that changes the holding
    Other,
}

impl LedgerTxnKind {
    /// Whether this kind removes value from the holding
    pub fn is_redemption(&self) -> bool {
        matches!(self, LedgerTxnKind::Sell | LedgerTxnKind::SellXfer)
    }

    /// Whether the value comes from outside the bond: everything except
    /// reinvested interest
    pub fn is_external_change(&self) -> bool {
        !matches!(self, LedgerTxnKind::DividendReinvest)
    }
}

impl FromStr for LedgerTxnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().replace(['_', ' '], "").as_str() {
            "buy" => LedgerTxnKind::Buy,
            "buyxfer" => LedgerTxnKind::BuyXfer,
            "sell" => LedgerTxnKind::Sell,
            "sellxfer" => LedgerTxnKind::SellXfer,
            "divreinvest" | "dividendreinvest" => LedgerTxnKind::DividendReinvest,
            "other" => LedgerTxnKind::Other,
            other => return Err(format!("Unknown transaction kind: {}", other)),
        };
        Ok(kind)
    }
}

impl fmt::Display for LedgerTxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LedgerTxnKind::Buy => "Buy",
            LedgerTxnKind::BuyXfer => "BuyXfer",
            LedgerTxnKind::Sell => "Sell",
            LedgerTxnKind::SellXfer => "SellXfer",
            LedgerTxnKind::DividendReinvest => "DividendReinvest",
            LedgerTxnKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// A single security transaction in an investment account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTxn {
    pub date: NaiveDate,
    /// Investment account holding the security
    pub account: String,
    pub ticker: String,
    pub kind: LedgerTxnKind,
    /// Signed change in the security's value; bond shares are priced at 1.00
    pub amount: Decimal,
    pub memo: String,
    pub payee: String,
    pub category: String,
}

impl LedgerTxn {
    /// Create a transaction, fixing the amount's sign from its kind
    pub fn new(
        date: NaiveDate,
        account: &str,
        ticker: &str,
        kind: LedgerTxnKind,
        amount: Decimal,
        memo: &str,
    ) -> Self {
        let amount = match kind {
            LedgerTxnKind::Sell | LedgerTxnKind::SellXfer => -amount.abs(),
            LedgerTxnKind::Buy | LedgerTxnKind::BuyXfer | LedgerTxnKind::DividendReinvest => {
                amount.abs()
            }
            LedgerTxnKind::Other => amount,
        };

        Self {
            date,
            account: account.to_string(),
            ticker: ticker.to_string(),
            kind,
            amount,
            memo: memo.to_string(),
            payee: String::new(),
            category: String::new(),
        }
    }

    pub fn with_payee(mut self, payee: &str, category: &str) -> Self {
        self.payee = payee.to_string();
        self.category = category.to_string();
        self
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// In-memory ledger of security transactions, in the order they were recorded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    txns: Vec<LedgerTxn>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_txns(txns: Vec<LedgerTxn>) -> Self {
        Self { txns }
    }

    pub fn push(&mut self, txn: LedgerTxn) {
        self.txns.push(txn);
    }

    pub fn txns(&self) -> &[LedgerTxn] {
        &self.txns
    }

    pub fn len(&self) -> usize {
        self.txns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    /// Distinct ticker symbols, sorted
    pub fn tickers(&self) -> BTreeSet<&str> {
        self.txns.iter().map(|t| t.ticker.as_str()).collect()
    }

    /// Distinct investment accounts holding the ticker at any time, sorted
    pub fn accounts_for(&self, ticker: &str) -> BTreeSet<&str> {
        self.txns
            .iter()
            .filter(|t| t.ticker == ticker)
            .map(|t| t.account.as_str())
            .collect()
    }

    /// Transactions of one security in one investment account
    pub fn invest_txns(&self, account: &str, ticker: &str) -> InvestTxnList {
        InvestTxnList::new(
            account,
            ticker,
            self.txns
                .iter()
                .filter(|t| t.account == account && t.ticker == ticker)
                .cloned(),
        )
    }
}
