//! Bond valuation: semiannual epochs, monthly accrual and early redemption penalties

pub mod engine;
pub mod provider;
pub mod records;
pub mod state;

pub use engine::{Epoch, ValuationConfig, ValuationEngine};
pub use provider::{ExternalCashFlowProvider, SinglePurchase};
pub use records::{CalcTxn, CalcTxnList, PriceRec};
pub use state::BalanceRec;
