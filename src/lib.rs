//! I bond values - valuation engine for U.S. Series I savings bonds
//!
//! This library provides:
//! - Published rate history loading and composite rate calculation
//! - Monthly redemption price curves with early redemption penalties
//! - Monthly interest payment transactions under deposits and redemptions
//! - Reconciliation of calculated interest against a ledger of holdings
//! - Background refresh runs that can be cancelled and restarted

pub mod config;
pub mod error;
pub mod ledger;
pub mod month;
pub mod rates;
pub mod runner;
pub mod sink;
pub mod ticker;
pub mod valuation;
pub mod worker;

// Re-export commonly used types
pub use config::IBondConfig;
pub use error::{IBondError, IBondResult};
pub use ledger::{Ledger, LedgerTxn, LedgerTxnKind};
pub use month::YearMonth;
pub use rates::{compose, RateRecord, RateTable};
pub use runner::RefreshRunner;
pub use sink::{CollectSink, LogSink, NullSink, RateMessageSink};
pub use valuation::{CalcTxn, CalcTxnList, ExternalCashFlowProvider, PriceRec, ValuationConfig, ValuationEngine};
pub use worker::{IBondWorker, RefreshOutcome, StagedPayment};
