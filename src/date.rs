//! Date normalization into the canonical 14-digit statement timestamp.
//!
//! Three historical shapes are accepted, checked in this order:
//!
//! 1. `YYYYMMDDHHMMSS[-3:GMT]` (canonical value with an offset annotation)
//! 2. `YYYYMMDDHHMMSS`
//! 3. `YYYY-MM-DD`, placed at 12:00:00 so a later offset annotation cannot
//!    move it to another day
//!
//! Anything else is rejected with [`ExportError::InvalidDateFormat`].

use crate::error::{ExportError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static ANNOTATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{14})\[[+-]?[0-9]{1,2}(?:\.[0-9]+)?:[A-Za-z]{1,8}\]$").expect("valid regex")
});

static CANONICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{14}$").expect("valid regex"));

static CALENDAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid regex"));

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Canonical `YYYYMMDDHHMMSS` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Timestamp(value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The timestamp followed by an offset annotation such as `[-3:GMT]`.
    pub fn annotated(&self, offset: &str) -> String {
        format!("{}{}", self.0, offset)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recognized shape of a textual date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateShape {
    /// Canonical digits that carried an offset annotation.
    Annotated(String),
    /// Bare canonical digits.
    Canonical(String),
    /// Calendar date without a time of day.
    Calendar(NaiveDate),
}

impl DateShape {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();

        if let Some(caps) = ANNOTATED.captures(value) {
            return Ok(DateShape::Annotated(caps[1].to_string()));
        }
        if CANONICAL.is_match(value) {
            return Ok(DateShape::Canonical(value.to_string()));
        }
        if CALENDAR.is_match(value) {
            if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                return Ok(DateShape::Calendar(date));
            }
        }

        Err(ExportError::InvalidDateFormat {
            value: value.to_string(),
        })
    }

    pub fn into_timestamp(self) -> Timestamp {
        match self {
            DateShape::Annotated(digits) | DateShape::Canonical(digits) => Timestamp(digits),
            DateShape::Calendar(date) => Timestamp::from_datetime(date.and_time(noon())),
        }
    }
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

/// Normalizes any accepted date shape to a canonical timestamp.
pub fn normalize(value: &str) -> Result<Timestamp> {
    DateShape::parse(value).map(DateShape::into_timestamp)
}
