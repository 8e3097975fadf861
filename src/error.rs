//! Error types for I bond valuation and reconciliation

use crate::month::YearMonth;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type IBondResult<T> = Result<T, IBondError>;

/// Errors raised while loading inputs or valuing a bond
#[derive(Error, Debug)]
pub enum IBondError {
    /// A file could not be read
    #[error("Problem accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited input could not be read
    #[error("Problem reading CSV data: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration text is not valid
    #[error("Problem parsing configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The rate history is missing one or more required columns
    #[error("Unable to locate column headers {expected:?} in {source_name}")]
    MissingColumns {
        expected: Vec<String>,
        source_name: String,
    },

    /// The rate history holds no usable rows
    #[error("No I bond interest rates found in {source_name}")]
    EmptyRateTable { source_name: String },

    /// A ledger row could not be interpreted
    #[error("Problem interpreting ledger row {line}: {reason}")]
    LedgerRow { line: u64, reason: String },

    /// No rate is in effect at or before the month
    #[error("No I bond interest rate known at or before {month}")]
    RateNotFound { month: YearMonth },

    /// The bond was issued before the earliest known rate
    #[error("No interest rates for I bonds issued as early as {month} ({ticker})")]
    NoRatesThatFarBack { ticker: String, month: YearMonth },

    /// The ticker symbol does not carry an issue month
    #[error("Problem parsing date from ticker symbol {ticker}: {reason}")]
    TickerParse { ticker: String, reason: String },

    /// A background refresh stopped abnormally
    #[error("Problem running I bond refresh: {0}")]
    Refresh(#[from] tokio::task::JoinError),
}

impl IBondError {
    /// Per-bond input problems that are reported while processing continues
    /// for other bonds. Everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IBondError::TickerParse { .. } | IBondError::NoRatesThatFarBack { .. }
        )
    }
}
