//! Pagination and date-window filtering.
//!
//! The listing is newest first, so the loop walks forward page by page and
//! stops at the first entry published before the window: everything after it
//! is older still. Entries newer than the window are skipped.
//!
//! ```text
//! FETCHING(page) ──ok, non-empty──▶ FILTERING(page) ──page done──▶ FETCHING(page + 1)
//!      │  empty / error                   │  entry older than start
//!      ▼                                  ▼
//!    DONE ◀──────────────────────────── DONE
//! ```

use crate::models::{Announcement, DateRange, RangeCheck};
use crate::scrapers::AnnouncementSource;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

/// Politeness delays between outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Pause after each detail fetch.
    pub detail_delay: Duration,
    /// Pause after each listing page.
    pub page_delay: Duration,
}


/// Why pagination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back with no entries.
    Exhausted,
    /// An entry older than the window start was reached on this page.
    ReachedStart { page: u32 },
    /// A listing page could not be fetched.
    FetchFailed { page: u32, error: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "listing exhausted"),
            StopReason::ReachedStart { page } => {
                write!(f, "reached range start on page {page}")
            }
            StopReason::FetchFailed { page, error } => {
                write!(f, "page {page} failed: {error}")
            }
        }
    }
}

/// Result of one crawl.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// In-window announcements, in the order they were listed.
    pub announcements: Vec<Announcement>,
    /// Listing pages requested, including the one that ended the crawl.
    pub pages_visited: u32,
    pub stop_reason: StopReason,
}

/// Collect every announcement of `source` published within `range`.
///
/// Listing fetch failures end the crawl without an error; whatever was
/// collected up to that point is returned.
#[instrument(level = "info", skip_all, fields(%range))]
pub async fn crawl<S>(source: &S, range: &DateRange, throttle: &Throttle) -> CrawlOutcome
where
    S: AnnouncementSource,
{
    let mut announcements = Vec::new();
    let mut page = 1u32;

    let stop_reason = loop {
        info!(page, "Processing page");
        let entries = match source.fetch_listing(page).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(page, error = %e, "Failed to fetch listing page");
                break StopReason::FetchFailed {
                    page,
                    error: e.to_string(),
                };
            }
        };
        if entries.is_empty() {
            info!(page, "Listing page is empty; no more announcements");
            break StopReason::Exhausted;
        }

        let mut reached_start = false;
        for summary in entries {
            match range.classify(&summary.date) {
                RangeCheck::TooOld => {
                    debug!(page, title = %summary.title, date = %summary.date, "Older than range start");
                    reached_start = true;
                    break;
                }
                RangeCheck::TooNew => {
                    debug!(page, title = %summary.title, date = %summary.date, "Newer than range end; skipping");
                }
                RangeCheck::Within => {
                    let body = source.fetch_detail(&summary.url).await;
                    debug!(page, title = %summary.title, body_bytes = body.len(), "Collected announcement");
                    announcements.push(Announcement::from_summary(summary, body));
                    sleep(throttle.detail_delay).await;
                }
            }
        }
        if reached_start {
            break StopReason::ReachedStart { page };
        }

        page += 1;
        sleep(throttle.page_delay).await;
    };

    info!(
        count = announcements.len(),
        pages = page,
        reason = %stop_reason,
        "Crawl finished"
    );
    CrawlOutcome {
        announcements,
        pages_visited: page,
        stop_reason,
    }
}
