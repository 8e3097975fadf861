//! Reconcile calculated I bond interest against a ledger
//!
//! Loads rates once, then for every ledger holding of an I bond ticker runs the
//! valuation engine and stages the interest payments the ledger does not have yet.
//!
//! # Example
//! ```ignore
//! let worker = IBondWorker::from_config(&IBondConfig::default(), YearMonth::now())?;
//! let cancel = AtomicBool::new(false);
//!
//! if let Some(outcome) = worker.run(&ledger, &cancel, &mut LogSink)? {
//!     println!("{}", outcome.commit(&mut ledger));
//! }
//! ```

use crate::config::IBondConfig;
use crate::error::IBondResult;
use crate::ledger::{InvestTxnList, Ledger, LedgerTxn, LedgerTxnKind};
use crate::month::YearMonth;
use crate::rates::load_rate_history;
use crate::sink::{LogSink, NullSink, RateMessageSink};
use crate::ticker::is_ibond_ticker;
use crate::valuation::{CalcTxn, ValuationConfig, ValuationEngine};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};

/// A calculated interest payment missing from the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPayment {
    pub account: String,
    pub ticker: String,
    pub txn: CalcTxn,
}

/// Interest payments found by a refresh, ready to be recorded
#[derive(Debug, Clone, Default)]
pub struct RefreshOutcome {
    staged: Vec<StagedPayment>,
    payee: String,
    category: String,
}

impl RefreshOutcome {
    pub fn staged(&self) -> &[StagedPayment] {
        &self.staged
    }

    /// True when there are uncommitted payments
    pub fn is_modified(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Record every staged payment as reinvested interest. Returns a summary.
    pub fn commit(self, ledger: &mut Ledger) -> String {
        let count = self.staged.len();

        for payment in self.staged {
            let txn = &payment.txn;
            ledger.push(
                LedgerTxn::new(
                    txn.pay_date(),
                    &payment.account,
                    &payment.ticker,
                    LedgerTxnKind::DividendReinvest,
                    txn.pay_amount(),
                    txn.memo(),
                )
                .with_payee(&self.payee, &self.category),
            );
        }
        log::info!("Committed {} interest payments", count);

        format!(
            "Recorded {} interest payment transaction{}",
            count,
            if count == 1 { "" } else { "s" }
        )
    }
}

/// Finds new I bond interest payments for a ledger
#[derive(Debug, Clone)]
pub struct IBondWorker {
    engine: ValuationEngine,
    payee: String,
    category: String,
}

impl IBondWorker {
    pub fn new(engine: ValuationEngine, config: &IBondConfig) -> Self {
        Self {
            engine,
            payee: config.payee.clone(),
            category: config.interest_category.clone(),
        }
    }

    /// Create a worker by loading the configured rate history
    pub fn from_config(config: &IBondConfig, today: YearMonth) -> IBondResult<Self> {
        let rates = load_rate_history(&config.rate_history_path, &config.columns)?;
        let engine = ValuationEngine::new(
            rates,
            ValuationConfig {
                today,
                ticker_prefix: config.ticker_prefix.clone(),
            },
        );
        Ok(Self::new(engine, config))
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Check every security in the ledger. Returns `None` when cancelled; the
    /// flag is checked between securities.
    pub fn run<S>(
        &self,
        ledger: &Ledger,
        cancel: &AtomicBool,
        messages: &mut S,
    ) -> IBondResult<Option<RefreshOutcome>>
    where
        S: RateMessageSink + ?Sized,
    {
        let prefix = self.engine.config().ticker_prefix.as_str();
        let mut outcome = RefreshOutcome {
            staged: Vec::new(),
            payee: self.payee.clone(),
            category: self.category.clone(),
        };
        let mut have_ibonds = false;

        for ticker in ledger.tickers() {
            if cancel.load(Ordering::Relaxed) {
                log::warn!("I bond refresh cancelled before {}", ticker);
                return Ok(None);
            }
            if !is_ibond_ticker(ticker, prefix) {
                continue;
            }

            match self.store_new_txns(ticker, ledger, &mut outcome, messages) {
                Ok(found) => have_ibonds |= found,
                Err(e) if e.is_recoverable() => {
                    log::warn!("Skipping {}: {}", ticker, e);
                    messages.display(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        if !have_ibonds {
            messages.display("Unable to locate any security with an I bond ticker symbol".to_string());
            messages.display(format!(
                "Such ticker symbols should start with '{prefix}' (in any case) followed by the \
                 year followed by a 2 digit month number in the format {prefix}YYYYMM"
            ));
            messages.display(format!(
                "Examples: {}201901, {}202212, {}202304",
                prefix,
                prefix.to_uppercase(),
                prefix.to_lowercase()
            ));
        } else if !outcome.is_modified() {
            messages.display("No new interest payment data found".to_string());
        }

        log::info!("I bond refresh found {} new interest payments", outcome.staged.len());
        Ok(Some(outcome))
    }

    /// Stage new payments for every account holding the ticker at the end of its
    /// issue month. Returns whether any such holding exists.
    fn store_new_txns<S>(
        &self,
        ticker: &str,
        ledger: &Ledger,
        outcome: &mut RefreshOutcome,
        messages: &mut S,
    ) -> IBondResult<bool>
    where
        S: RateMessageSink + ?Sized,
    {
        let end_of_issue_month = self.engine.issue_month(ticker)?.last_day();
        let mut found = false;

        for account in ledger.accounts_for(ticker) {
            let mut txn_list = ledger.invest_txns(account, ticker);

            if txn_list.balance_as_of(end_of_issue_month) > Decimal::ZERO {
                // rates only need showing once per security
                let calc_txns = if found {
                    self.engine.interest_txns(ticker, &mut txn_list, &mut NullSink)?
                } else {
                    self.engine.interest_txns(ticker, &mut txn_list, &mut LogSink)?
                };
                found = true;

                for txn in &calc_txns {
                    self.store_txn_if_diff(txn, &txn_list, outcome, messages);
                }
            }
        }

        Ok(found)
    }

    /// Stage a payment the ledger lacks, or report how a recorded one differs
    fn store_txn_if_diff<S>(
        &self,
        txn: &CalcTxn,
        txn_list: &InvestTxnList,
        outcome: &mut RefreshOutcome,
        messages: &mut S,
    ) where
        S: RateMessageSink + ?Sized,
    {
        let account = txn_list.account();
        let ticker = txn_list.ticker();

        match txn_list.matching_interest_txn(txn) {
            None => {
                if !outcome.is_modified() {
                    messages.display(format!(
                        "Will use category {} (the default) for new interest payments in {}",
                        self.category, account
                    ));
                }
                messages.display(format!(
                    "On {} {}:{} pay {} for {}, bal {}",
                    txn.pay_date(),
                    account,
                    ticker,
                    txn.pay_amount(),
                    txn.memo(),
                    txn.ending_bal().round_dp(2)
                ));

                outcome.staged.push(StagedPayment {
                    account: account.to_string(),
                    ticker: ticker.to_string(),
                    txn: txn.clone(),
                });
            }
            Some(recorded) => {
                if recorded.amount != txn.pay_amount() {
                    messages.display(format!(
                        "Found a different interest amount on {} {}:{}: have {}, calculate {} for {}",
                        txn.pay_date(),
                        account,
                        ticker,
                        recorded.amount,
                        txn.pay_amount(),
                        txn.memo()
                    ));
                }

                let recorded_bal = txn_list.balance_as_of(txn.pay_month().last_day());
                if recorded_bal != txn.ending_bal() {
                    messages.display(format!(
                        "Found a different ending balance for {} in {}:{}: have {}, calculate {}",
                        txn.pay_month(),
                        account,
                        ticker,
                        recorded_bal,
                        txn.ending_bal()
                    ));
                }
            }
        }
    }
}
