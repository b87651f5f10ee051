//! Announcement sources.
//!
//! A source knows how to read one site: how its listing is paginated, and how
//! to pull summaries and body text out of its HTML. The crawl loop only talks
//! to the [`AnnouncementSource`] trait, so tests can drive it with in-memory
//! listings instead of a live site.
//!
//! # Supported Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | OKX new-listing announcements | [`okx`] | HTML scraping |

use crate::http::FetchError;
use crate::models::Summary;

pub mod okx;

/// A paginated, newest-first listing of announcements.
pub trait AnnouncementSource {
    /// Fetch and parse listing page `page` (1-based).
    ///
    /// Entries come back sorted by publication date, newest first. An empty
    /// vector means the listing has no more pages.
    async fn fetch_listing(&self, page: u32) -> Result<Vec<Summary>, FetchError>;

    /// Fetch the body text of one announcement.
    ///
    /// Failures are absorbed: the result is an empty string.
    async fn fetch_detail(&self, url: &str) -> String;
}
