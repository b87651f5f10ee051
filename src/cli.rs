//! Command-line interface definitions.
//!
//! Dates are taken as plain strings and validated by [`Cli::date_range`], so
//! a malformed date is reported by the application (exit code 1) rather than
//! by the argument parser.

use crate::config::DEFAULT_BASE_URL;
use crate::models::{DateRange, DateRangeError};
use clap::Parser;
use std::path::PathBuf;

/// Scrape OKX announcements between dates and save as JSON.
///
/// # Examples
///
/// ```sh
/// okx_announcements --start 2024-01-01 --end 2024-01-31 --folder ./out
/// okx_announcements -s 2024-01-01 -e 2024-01-31 -f ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Start date (inclusive), format YYYY-MM-DD
    #[arg(short, long)]
    pub start: String,

    /// End date (inclusive), format YYYY-MM-DD
    #[arg(short, long)]
    pub end: String,

    /// Output folder for JSON files
    #[arg(short, long)]
    pub folder: PathBuf,

    /// Site root the announcement pages are fetched from
    #[arg(long, env = "OKX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

impl Cli {
    /// Validated date window; start must not be after end.
    pub fn date_range(&self) -> Result<DateRange, DateRangeError> {
        DateRange::parse(&self.start, &self.end)
    }
}
