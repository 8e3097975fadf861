//! Ledger of security transactions in investment accounts

mod data;
mod invest;
pub mod loader;

pub use data::{Ledger, LedgerTxn, LedgerTxnKind};
pub use invest::InvestTxnList;
pub use loader::{load_ledger, load_ledger_from_reader, write_ledger_rows};
