//! Historical I bond rates keyed by the month they take effect

use crate::error::{IBondError, IBondResult};
use crate::month::YearMonth;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rates announced by the Treasury for one semiannual period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRecord {
    /// Semiannual (1/2 year) inflation rate
    pub inflation_rate: Decimal,

    /// Fixed rate for bonds issued while this record is in effect
    pub fixed_rate: Decimal,

    /// Month the rates took effect
    pub effective_month: YearMonth,
}

impl RateRecord {
    pub fn new(inflation_rate: Decimal, fixed_rate: Decimal, effective_month: YearMonth) -> Self {
        Self {
            inflation_rate,
            fixed_rate,
            effective_month,
        }
    }
}

/// Ordered, non-empty rate history
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<YearMonth, RateRecord>,
}

impl RateTable {
    /// Build a table from records; later duplicates of a month replace earlier ones
    pub fn from_records<I>(records: I, source_name: &str) -> IBondResult<Self>
    where
        I: IntoIterator<Item = RateRecord>,
    {
        let rates: BTreeMap<YearMonth, RateRecord> = records
            .into_iter()
            .map(|rec| (rec.effective_month, rec))
            .collect();

        if rates.is_empty() {
            return Err(IBondError::EmptyRateTable {
                source_name: source_name.to_string(),
            });
        }

        Ok(Self { rates })
    }

    /// The record in effect for a month: greatest effective month at or before it
    pub fn rate_for(&self, month: YearMonth) -> IBondResult<&RateRecord> {
        self.rates
            .range(..=month)
            .next_back()
            .map(|(_, rec)| rec)
            .ok_or(IBondError::RateNotFound { month })
    }

    /// Earliest month with a known rate
    pub fn first_known_month(&self) -> YearMonth {
        *self.rates.keys().next().expect("rate table is never empty")
    }

    /// Latest month with a known rate
    pub fn last_known_month(&self) -> YearMonth {
        *self.rates.keys().next_back().expect("rate table is never empty")
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Always false, since construction rejects an empty history
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Records in effective-month order
    pub fn iter(&self) -> impl Iterator<Item = &RateRecord> {
        self.rates.values()
    }
}
