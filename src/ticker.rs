//! I bond ticker symbols of the form `<prefix><YYYY><MM>`

use crate::error::{IBondError, IBondResult};
use crate::month::YearMonth;

/// Whether the ticker starts with the I bond prefix, ignoring case
pub fn is_ibond_ticker(ticker: &str, prefix: &str) -> bool {
    ticker.len() >= prefix.len()
        && ticker.is_char_boundary(prefix.len())
        && ticker[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Determine the issue month carried by a ticker symbol such as `IBond202312`
pub fn parse_issue_month(ticker: &str, prefix: &str) -> IBondResult<YearMonth> {
    let fail = |reason: String| IBondError::TickerParse {
        ticker: ticker.to_string(),
        reason,
    };

    if !is_ibond_ticker(ticker, prefix) {
        return Err(fail(format!("expected prefix '{}'", prefix)));
    }
    let digits = &ticker[prefix.len()..];

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail(format!(
            "expected a 4 digit year and 2 digit month after '{}', found '{}'",
            prefix, digits
        )));
    }
    let year: i32 = digits[..4]
        .parse()
        .map_err(|_| fail(format!("invalid year '{}'", &digits[..4])))?;
    let month: u32 = digits[4..]
        .parse()
        .map_err(|_| fail(format!("invalid month '{}'", &digits[4..])))?;

    YearMonth::new(year, month).ok_or_else(|| fail(format!("month {} out of range", month)))
}

/// Ticker symbol for bonds issued in the given month
pub fn ticker_for(issue_month: YearMonth, prefix: &str) -> String {
    format!("{}{:04}{:02}", prefix, issue_month.year(), issue_month.month())
}
