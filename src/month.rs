//! Calendar year-month values used to key rates, epochs and payments

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month of a specific year (e.g. 2023-12)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    /// Month of year (1-12)
    month: u32,
}

impl YearMonth {
    /// Create a year-month, `None` when the month is outside 1-12 or the year is unsupported
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return None;
        }
        Some(Self { year, month })
    }

    /// Year-month containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month in local time
    pub fn now() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Shift by a (possibly negative) number of months
    pub fn plus_months(&self, months: i32) -> Self {
        let index = self.index() + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Shift by a number of years
    pub fn plus_years(&self, years: i32) -> Self {
        self.plus_months(years * 12)
    }

    /// Signed number of months from `self` to `later`
    pub fn months_until(&self, later: YearMonth) -> i32 {
        later.index() - self.index()
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("year-month holds a valid calendar month")
    }

    /// Last day of the month
    pub fn last_day(&self) -> NaiveDate {
        self.plus_months(1).first_day() - Days::new(1)
    }

    /// Whether the date falls in this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Short name used in payment memos, e.g. "Dec 2023"
    pub fn short_name(&self) -> String {
        self.first_day().format("%b %Y").to_string()
    }

    fn index(&self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Expected YYYY-MM, found [{}]", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in [{}]", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in [{}]", s))?;

        YearMonth::new(year, month).ok_or_else(|| format!("Month out of range in [{}]", s))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
