//! Day counts until recurring calendar dates.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Longest gap between two Feb 29s (e.g. 1896 to 1904).
const MAX_YEARS_AHEAD: i32 = 8;

/// A named month/day that recurs every year (e.g. Halloween on 10-31).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualEvent {
    name: String,
    month: u32,
    day: u32,
}

/// Error returned when parsing an invalid event spec.
#[derive(Debug, Clone)]
pub struct ParseEventError(String);

impl fmt::Display for ParseEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseEventError {}

impl AnnualEvent {
    /// Creates an event, rejecting month/day pairs that never occur.
    pub fn new(name: &str, month: u32, day: u32) -> Result<Self, ParseEventError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseEventError("event name cannot be empty".to_string()));
        }
        // 2000 is a leap year, so Feb 29 passes here.
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(ParseEventError(format!(
                "invalid date for '{}': {:02}-{:02}",
                name, month, day
            )));
        }
        Ok(Self {
            name: name.to_string(),
            month,
            day,
        })
    }

    pub fn halloween() -> Self {
        Self {
            name: "Halloween".to_string(),
            month: 10,
            day: 31,
        }
    }

    pub fn new_years_eve() -> Self {
        Self {
            name: "New Year's Eve".to_string(),
            month: 12,
            day: 31,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the next occurrence of this event on or after `today`.
    ///
    /// Feb 29 can be up to eight years away. `None` only when that window
    /// runs past the last representable date.
    pub fn next_occurrence(&self, today: NaiveDate) -> Option<NaiveDate> {
        let first = today.year();
        let last = first.checked_add(MAX_YEARS_AHEAD)?;
        (first..=last)
            .filter_map(|year| NaiveDate::from_ymd_opt(year, self.month, self.day))
            .find(|date| *date >= today)
    }

    /// Computes the countdown to the next occurrence.
    pub fn countdown(&self, today: NaiveDate) -> Option<Countdown> {
        let date = self.next_occurrence(today)?;
        Some(Countdown {
            name: self.name.clone(),
            date,
            year: date.year(),
            days: (date - today).num_days(),
        })
    }
}

/// Parses `"Name=MM-DD"`.
impl FromStr for AnnualEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, date) = s.rsplit_once('=').ok_or_else(|| {
            ParseEventError(format!("invalid event '{}': expected NAME=MM-DD", s))
        })?;
        let (month, day) = date
            .trim()
            .split_once('-')
            .and_then(|(m, d)| Some((m.parse().ok()?, d.parse().ok()?)))
            .ok_or_else(|| {
                ParseEventError(format!("invalid event date '{}': expected MM-DD", date))
            })?;
        Self::new(name, month, day)
    }
}

/// Days remaining until one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub name: String,
    pub date: NaiveDate,
    pub year: i32,
    pub days: i64,
}

impl Countdown {
    pub fn is_today(&self) -> bool {
        self.days == 0
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_today() {
            write!(f, "It's {} today!", self.name)
        } else {
            write!(f, "Days until {} ({}): {}", self.name, self.year, self.days)
        }
    }
}
