//! Load ledger transactions from CSV exports
//!
//! Columns: `Date,Account,Ticker,Kind,Amount,Memo`, with optional `Payee` and
//! `Category` columns.

use super::data::{Ledger, LedgerTxn, LedgerTxnKind};
use crate::error::{IBondError, IBondResult};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Writer};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Raw CSV row matching the ledger export columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Account")]
    account: String,
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Kind")]
    kind: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Memo", default)]
    memo: String,
    #[serde(rename = "Payee", default)]
    payee: String,
    #[serde(rename = "Category", default)]
    category: String,
}

impl CsvRow {
    fn to_txn(self, line: u64) -> IBondResult<LedgerTxn> {
        let date = parse_date(&self.date).ok_or_else(|| IBondError::LedgerRow {
            line,
            reason: format!("Unknown date: {}", self.date),
        })?;
        let kind: LedgerTxnKind = self
            .kind
            .parse()
            .map_err(|reason| IBondError::LedgerRow { line, reason })?;
        let cleaned = self.amount.trim().trim_start_matches('$').replace(',', "");
        let amount = Decimal::from_str(&cleaned).map_err(|_| IBondError::LedgerRow {
            line,
            reason: format!("Unknown amount: {}", self.amount),
        })?;

        if self.ticker.trim().is_empty() {
            return Err(IBondError::LedgerRow {
                line,
                reason: "Missing ticker symbol".to_string(),
            });
        }

        Ok(
            LedgerTxn::new(date, self.account.trim(), self.ticker.trim(), kind, amount, &self.memo)
                .with_payee(&self.payee, &self.category),
        )
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%m/%d/%Y"))
        .ok()
}

/// Load a ledger from a CSV file
pub fn load_ledger(path: &Path) -> IBondResult<Ledger> {
    let file = File::open(path).map_err(|source| IBondError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ledger = load_ledger_from_reader(file)?;

    log::info!("Loaded {} ledger transactions from {}", ledger.len(), path.display());
    Ok(ledger)
}

/// Load a ledger from any reader (e.g., string buffer)
pub fn load_ledger_from_reader<R: Read>(reader: R) -> IBondResult<Ledger> {
    let mut csv_reader = ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut ledger = Ledger::new();

    for result in csv_reader.records() {
        let record = result?;
        // first line of the record, which may span several
        let line = record.position().map_or(0, |pos| pos.line());
        let row: CsvRow = record.deserialize(Some(&headers))?;
        ledger.push(row.to_txn(line)?);
    }

    Ok(ledger)
}

/// Write transactions as ledger CSV rows, header included
pub fn write_ledger_rows<W: Write>(writer: W, txns: &[LedgerTxn]) -> IBondResult<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(["Date", "Account", "Ticker", "Kind", "Amount", "Memo", "Payee", "Category"])?;

    for txn in txns {
        csv_writer.write_record([
            txn.date.to_string(),
            txn.account.clone(),
            txn.ticker.clone(),
            txn.kind.to_string(),
            txn.amount.to_string(),
            txn.memo.clone(),
            txn.payee.clone(),
            txn.category.clone(),
        ])?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
