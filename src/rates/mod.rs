//! I bond rate history and the composite rate rule

mod composer;
mod table;
pub mod loader;

pub use composer::{clean_rate, compose, INTEREST_RATE_DIGITS};
pub use loader::{load_rate_history, load_rate_history_from_reader, ColumnRole, HeaderMap};
pub use table::{RateRecord, RateTable};
