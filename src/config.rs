//! Run configuration loaded from JSON

use crate::error::{IBondError, IBondResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the rate history
pub const DEFAULT_RATE_HISTORY_PATH: &str = "data/ibond_rates.csv";

/// Prefix identifying I bond ticker symbols
pub const DEFAULT_TICKER_PREFIX: &str = "IBond";

/// Header names identifying the rate history columns we use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeaders {
    /// Column of semiannual inflation rates
    #[serde(default = "default_inflation_header")]
    pub inflation_rate: String,

    /// Column of fixed rates
    #[serde(default = "default_fixed_header")]
    pub fixed_rate: String,

    /// Column of dates the rates take effect
    #[serde(default = "default_effective_date_header")]
    pub effective_date: String,
}

fn default_inflation_header() -> String { "Semiannual Inflation Rate".to_string() }
fn default_fixed_header() -> String { "Fixed Rate".to_string() }
fn default_effective_date_header() -> String { "Effective Date".to_string() }

impl Default for ColumnHeaders {
    fn default() -> Self {
        Self {
            inflation_rate: default_inflation_header(),
            fixed_rate: default_fixed_header(),
            effective_date: default_effective_date_header(),
        }
    }
}

/// Settings for a valuation or refresh run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IBondConfig {
    /// Rate history file (CSV)
    #[serde(default = "default_rate_history_path")]
    pub rate_history_path: PathBuf,

    /// Ticker symbol prefix, matched ignoring case
    #[serde(default = "default_ticker_prefix")]
    pub ticker_prefix: String,

    /// Rate history header names
    #[serde(default)]
    pub columns: ColumnHeaders,

    /// Payee recorded on new interest payments
    #[serde(default = "default_payee")]
    pub payee: String,

    /// Category recorded on new interest payments
    #[serde(default = "default_interest_category")]
    pub interest_category: String,
}

fn default_rate_history_path() -> PathBuf { PathBuf::from(DEFAULT_RATE_HISTORY_PATH) }
fn default_ticker_prefix() -> String { DEFAULT_TICKER_PREFIX.to_string() }
fn default_payee() -> String { "US Dept. of the Treasury".to_string() }
fn default_interest_category() -> String { "Interest Income".to_string() }

impl Default for IBondConfig {
    fn default() -> Self {
        Self {
            rate_history_path: default_rate_history_path(),
            ticker_prefix: default_ticker_prefix(),
            columns: ColumnHeaders::default(),
            payee: default_payee(),
            interest_category: default_interest_category(),
        }
    }
}

impl IBondConfig {
    /// Parse configuration from JSON text; absent fields take their defaults
    pub fn from_json(text: &str) -> IBondResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> IBondResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| IBondError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = IBondConfig::from_json("{}").unwrap();
        assert_eq!(config.ticker_prefix, "IBond");
        assert_eq!(config.rate_history_path, PathBuf::from(DEFAULT_RATE_HISTORY_PATH));
        assert_eq!(config.columns, ColumnHeaders::default());
        assert_eq!(config.payee, "US Dept. of the Treasury");
    }

    #[test]
    fn test_partial_column_override() {
        let config = IBondConfig::from_json(
            r#"{"ticker_prefix": "IB", "columns": {"fixed_rate": "Fixed"}}"#,
        )
        .unwrap();
        assert_eq!(config.ticker_prefix, "IB");
        assert_eq!(config.columns.fixed_rate, "Fixed");
        assert_eq!(config.columns.inflation_rate, "Semiannual Inflation Rate");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = IBondConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, IBondError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = IBondConfig::load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, IBondError::Io { .. }));
    }
}
