//! Half-open date ranges used to filter the daily reanalysis collection.

use crate::types::error::ParameterError;
use chrono::NaiveDate;
use std::fmt;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar year, usable as a [`DatePeriod`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Year(pub i32);

impl Year {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Dates from `start` (inclusive) to `end` (exclusive). Never empty.
///
/// # Examples
///
/// ```
/// use era5_basin::DateRange;
///
/// let range = DateRange::parse("2020-01-01", "2020-01-03").unwrap();
/// assert_eq!(range.num_days(), 2);
/// assert_eq!(range.to_string(), "[2020-01-01, 2020-01-03)");
/// assert!(DateRange::parse("2020-01-03", "2020-01-03").is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ParameterError> {
        if start >= end {
            return Err(ParameterError::EmptyDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses two `YYYY-MM-DD` strings, start inclusive and end exclusive.
    pub fn parse(start: &str, end: &str) -> Result<Self, ParameterError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ParameterError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| ParameterError::DateParse(s.to_string(), e))
}

/// Anything that resolves to a half-open [`DateRange`].
pub trait DatePeriod {
    fn date_range(self) -> Option<DateRange>;
}

impl DatePeriod for DateRange {
    fn date_range(self) -> Option<DateRange> {
        Some(self)
    }
}

impl DatePeriod for Year {
    fn date_range(self) -> Option<DateRange> {
        (self, self).date_range()
    }
}

/// Whole years from the first to the last, both included.
impl DatePeriod for (Year, Year) {
    fn date_range(self) -> Option<DateRange> {
        let start = NaiveDate::from_ymd_opt(self.0.get(), 1, 1)?;
        let end = NaiveDate::from_ymd_opt(self.1.get() + 1, 1, 1)?;
        DateRange::new(start, end).ok()
    }
}
