//! # OKX Announcements
//!
//! Scrapes the OKX "new listings" announcement section for everything
//! published within a date range and saves title, URL, publication date, and
//! body text of each announcement as JSON.
//!
//! ## Usage
//!
//! ```sh
//! okx_announcements --start 2024-01-01 --end 2024-01-31 --folder ./out
//! ```
//!
//! ## Architecture
//!
//! Everything runs sequentially on one task:
//! 1. **Validation**: Parse and check the date range (no network on failure)
//! 2. **Crawling**: Walk listing pages newest first, fetching each in-range
//!    announcement's detail page, until an entry predates the range
//! 3. **Output**: Write all collected announcements to one JSON file
//!
//! ## Exit Codes
//!
//! - `0`: success
//! - `1`: invalid date or start after end
//! - `2`: unexpected failure (unwritable folder, bad base URL, write error)

use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawl;
mod http;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::ScraperConfig;
use http::{HttpClient, RetryFetch};
use models::DateRange;
use outputs::json;
use scrapers::okx::OkxSource;
use utils::ensure_writable_dir;

const EXIT_BAD_INPUT: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let range = match args.date_range() {
        Ok(range) => range,
        Err(e) => {
            error!(error = %e, "Invalid date range");
            return ExitCode::from(EXIT_BAD_INPUT);
        }
    };

    let config = ScraperConfig::with_base_url(args.base_url.clone());

    let start_time = std::time::Instant::now();
    info!(%range, folder = %args.folder.display(), "Starting OKX announcements scraper");

    match run(&config, &range, &args.folder).await {
        Ok(path) => {
            let elapsed = start_time.elapsed();
            info!(path = %path.display(), secs = elapsed.as_secs(), "Scraping completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, source = ?e.source(), "Unexpected error");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Crawl `range` and write the results into `folder`.
async fn run(
    config: &ScraperConfig,
    range: &DateRange,
    folder: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    // Early check: a bad folder should fail before the crawl, not after it
    ensure_writable_dir(folder).await?;

    let client = RetryFetch::from_config(HttpClient::new(config)?, config);
    let source = OkxSource::new(client, config)?;

    let outcome = crawl::crawl(&source, range, &config.throttle()).await;
    info!(
        count = outcome.announcements.len(),
        pages = outcome.pages_visited,
        reason = %outcome.stop_reason,
        "Crawl summary"
    );

    json::write_announcements(&outcome.announcements, range, folder).await
}
