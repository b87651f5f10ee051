//! Data models for scraped announcements and the requested date window.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Summary`]: One entry of a listing page (title, link, publication date)
//! - [`Announcement`]: A summary completed with the body text of its detail page
//! - [`DateRange`]: The inclusive window of publication dates to keep
//!
//! Only [`Announcement`] is serialized; its JSON field names (`title`, `url`,
//! `date`, `body`) are the output format.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Format accepted on the command line for range boundaries.
pub const CLI_DATE_FORMAT: &str = "%Y-%m-%d";

/// One announcement as listed on a paginated listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Announcement headline, whitespace-trimmed.
    pub title: String,
    /// Absolute URL of the detail page.
    pub url: String,
    /// Publication timestamp parsed from the listing's date text.
    pub date: DateTime<Utc>,
}

/// A fully scraped announcement, as written to the output file.
///
/// # JSON Schema
///
/// ```json
/// {
///     "title": "OKX to list XYZ",
///     "url": "https://www.okx.com/help/okx-to-list-xyz",
///     "date": "2024-01-15T00:00:00Z",
///     "body": "First paragraph\nSecond paragraph"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Announcement {
    pub title: String,
    pub url: String,
    pub date: DateTime<Utc>,
    /// Plain text, one paragraph per line. Empty when the detail page
    /// could not be fetched or had no content region.
    pub body: String,
}

impl Announcement {
    /// Complete a listing entry with the body text fetched from its detail page.
    pub fn from_summary(summary: Summary, body: String) -> Self {
        Self {
            title: summary.title,
            url: summary.url,
            date: summary.date,
            body,
        }
    }
}

/// Errors raised while validating the requested date window.
#[derive(Debug, Error)]
pub enum DateRangeError {
    #[error("invalid date '{input}': expected YYYY-MM-DD ({source})")]
    BadFormat {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("start date {start} must be on or before end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Where a publication date falls relative to a [`DateRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCheck {
    /// Published before the start day.
    TooOld,
    /// Published on or between the start and end days.
    Within,
    /// Published after the end day.
    TooNew,
}

/// Inclusive window of publication days. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_cli_date(start)?, parse_cli_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Compare the UTC calendar day of `date` against both boundaries.
    pub fn classify(&self, date: &DateTime<Utc>) -> RangeCheck {
        let day = date.date_naive();
        if day < self.start {
            RangeCheck::TooOld
        } else if day > self.end {
            RangeCheck::TooNew
        } else {
            RangeCheck::Within
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

fn parse_cli_date(input: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(input.trim(), CLI_DATE_FORMAT).map_err(|source| {
        DateRangeError::BadFormat {
            input: input.to_string(),
            source,
        }
    })
}
