//! Date window covering an import batch

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Format used on the wire and in output
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar date range, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting reversed bounds
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::validation(format!(
                "Window start {} is after end {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// Number of calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_str(), self.end_str())
    }
}

/// A sub-transaction date parsed for ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerDate {
    /// Point in time used for ordering; naive inputs are read as UTC
    pub instant: DateTime<FixedOffset>,
    /// Calendar date as written, time of day dropped
    pub date: NaiveDate,
}

impl LedgerDate {
    /// Parse the date forms the mapping pipeline emits
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD[T| ]HH:MM:SS[.fff][offset]` and plain
    /// `YYYY-MM-DD`.
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self::from_offset(dt));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
            if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
                return Ok(Self::from_offset(dt));
            }
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
                return Ok(Self::from_naive(naive));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Self::from_naive(naive));
            }
        }

        Err(Error::validation(format!("Unparsable transaction date: \"{}\"", raw)))
    }

    fn from_offset(dt: DateTime<FixedOffset>) -> Self {
        Self {
            instant: dt,
            date: dt.date_naive(),
        }
    }

    fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            instant: naive.and_utc().fixed_offset(),
            date: naive.date(),
        }
    }
}
