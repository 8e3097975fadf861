//! CSV-based rate history loader
//!
//! Columns are located by matching the header row against the configured
//! header names; other columns are ignored.

use super::composer::clean_rate;
use super::table::{RateRecord, RateTable};
use crate::config::ColumnHeaders;
use crate::error::{IBondError, IBondResult};
use crate::month::YearMonth;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// The rate history columns we reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Semiannual inflation rates
    InflationRate,
    /// Fixed rates
    FixedRate,
    /// Dates the rates take effect
    EffectiveDate,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 3] = [
        ColumnRole::InflationRate,
        ColumnRole::FixedRate,
        ColumnRole::EffectiveDate,
    ];
}

/// Lookup from header text to column role, built once from configuration
#[derive(Debug, Clone)]
pub struct HeaderMap {
    roles: HashMap<String, ColumnRole>,
}

/// Positions of the role columns within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndexes {
    inflation_rate: usize,
    fixed_rate: usize,
    effective_date: usize,
}

impl HeaderMap {
    pub fn new(headers: &ColumnHeaders) -> Self {
        let roles = HashMap::from([
            (headers.inflation_rate.trim().to_string(), ColumnRole::InflationRate),
            (headers.fixed_rate.trim().to_string(), ColumnRole::FixedRate),
            (headers.effective_date.trim().to_string(), ColumnRole::EffectiveDate),
        ]);
        Self { roles }
    }

    /// Role of a header cell, `None` for columns we do not use
    pub fn role(&self, header: &str) -> Option<ColumnRole> {
        self.roles.get(header.trim()).copied()
    }

    /// Configured header names, in role order
    pub fn expected_headers(&self) -> Vec<String> {
        ColumnRole::ALL
            .iter()
            .filter_map(|role| {
                self.roles
                    .iter()
                    .find(|(_, r)| *r == role)
                    .map(|(name, _)| name.clone())
            })
            .collect()
    }

    fn locate(&self, header_row: &StringRecord) -> Option<ColumnIndexes> {
        let mut inflation_rate = None;
        let mut fixed_rate = None;
        let mut effective_date = None;

        for (index, cell) in header_row.iter().enumerate() {
            match self.role(cell) {
                Some(ColumnRole::InflationRate) => inflation_rate = Some(index),
                Some(ColumnRole::FixedRate) => fixed_rate = Some(index),
                Some(ColumnRole::EffectiveDate) => effective_date = Some(index),
                None => {}
            }
        }

        Some(ColumnIndexes {
            inflation_rate: inflation_rate?,
            fixed_rate: fixed_rate?,
            effective_date: effective_date?,
        })
    }
}

/// Load the rate history from a CSV file
pub fn load_rate_history(path: &Path, headers: &ColumnHeaders) -> IBondResult<RateTable> {
    let file = File::open(path).map_err(|source| IBondError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    load_rate_history_from_reader(file, headers, &path.display().to_string())
}

/// Load the rate history from any reader (e.g., string buffer, network stream)
pub fn load_rate_history_from_reader<R: Read>(
    reader: R,
    headers: &ColumnHeaders,
    source_name: &str,
) -> IBondResult<RateTable> {
    let header_map = HeaderMap::new(headers);
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = csv_reader.records();

    let missing = || IBondError::MissingColumns {
        expected: header_map.expected_headers(),
        source_name: source_name.to_string(),
    };
    let header_row = records.next().transpose()?.ok_or_else(missing)?;
    let columns = header_map.locate(&header_row).ok_or_else(missing)?;

    let mut rates = Vec::new();

    for result in records {
        let row = result?;

        match parse_row(&row, columns) {
            Some(rec) => rates.push(rec),
            None => log::debug!(
                "Skipping rate history line {} of {}: {:?}",
                row.position().map(|p| p.line()).unwrap_or_default(),
                source_name,
                row
            ),
        }
    }

    let table = RateTable::from_records(rates, source_name)?;
    log::info!(
        "Loaded {} I bond rate records from {} ({} through {})",
        table.len(),
        source_name,
        table.first_known_month(),
        table.last_known_month()
    );

    Ok(table)
}

fn parse_row(row: &StringRecord, columns: ColumnIndexes) -> Option<RateRecord> {
    let inflation_rate = parse_rate(row.get(columns.inflation_rate)?)?;
    let fixed_rate = parse_rate(row.get(columns.fixed_rate)?)?;
    let effective_month = parse_effective_month(row.get(columns.effective_date)?)?;

    Some(RateRecord::new(inflation_rate, fixed_rate, effective_month))
}

/// Parse a rate cell holding a fraction (`0.0197`) or a percentage (`1.97%`)
fn parse_rate(cell: &str) -> Option<Decimal> {
    let cell = cell.trim();

    let rate = match cell.strip_suffix('%') {
        Some(percent) => Decimal::from_str(percent.trim()).ok()? / Decimal::ONE_HUNDRED,
        None => Decimal::from_str(cell).ok()?,
    };

    Some(clean_rate(rate))
}

/// Parse an effective date cell into its month
fn parse_effective_month(cell: &str) -> Option<YearMonth> {
    let cell = cell.trim();

    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
        .map(YearMonth::from_date)
        .or_else(|| cell.parse().ok())
}
