//! Calendar and time-window types
//!
//! Reconciliation windows are expressed in calendar dates (claim dates and
//! deduction dates carry no time of day), while "now" is an instant. The
//! [`Timezone`] decides which calendar date an instant falls on for a tenant.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper for tenant reporting calendars
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s)
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(s.to_string()))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// Returns the calendar date an instant falls on in this timezone
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        self.to_local(utc).date_naive()
    }

    /// Number of calendar days from `date` to the local date of `as_of`
    ///
    /// Negative when `date` lies after `as_of`.
    pub fn calendar_days_since(&self, date: NaiveDate, as_of: DateTime<Utc>) -> i64 {
        (self.local_date(as_of) - date).num_days()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name())
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// An inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range covering `start..=end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Checks whether the date falls inside the range (both ends inclusive)
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, counting both ends
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let result = DateRange::new(date(2024, 2, 1), date(2024, 1, 1));
        assert!(matches!(result, Err(TemporalError::InvalidRange { .. })));
    }

    #[test]
    fn test_range_contains_both_ends() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert!(range.contains(date(2024, 1, 1)));
        assert!(range.contains(date(2024, 1, 31)));
        assert!(!range.contains(date(2024, 2, 1)));
        assert_eq!(range.len_days(), 31);
    }

    #[test]
    fn test_calendar_days_follow_local_date() {
        let tz: Timezone = "America/New_York".parse().unwrap();
        // 03:00 UTC on Mar 2 is still Mar 1 in New York
        let as_of = Utc.with_ymd_and_hms(2024, 3, 2, 3, 0, 0).unwrap();
        assert_eq!(tz.local_date(as_of), date(2024, 3, 1));
        assert_eq!(tz.calendar_days_since(date(2024, 1, 31), as_of), 30);

        let utc = Timezone::default();
        assert_eq!(utc.calendar_days_since(date(2024, 1, 31), as_of), 31);
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            "Mars/Olympus".parse::<Timezone>(),
            Err(TemporalError::UnknownTimezone(_))
        ));
    }
}
