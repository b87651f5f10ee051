//! Runtime settings shared by the HTTP client, the OKX source, and the crawl loop.
//!
//! A single [`ScraperConfig`] is built at startup and passed down explicitly;
//! nothing reads process-wide state after that.

use crate::crawl::Throttle;
use std::time::Duration;

/// Site root used when `--base-url` is not given.
pub const DEFAULT_BASE_URL: &str = "https://www.okx.com/";

/// Listing section holding the new-listing announcements.
pub const DEFAULT_SECTION_PATH: &str = "/help/section/announcements-new-listings";

/// Browser-like User-Agent; the site serves a reduced page to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Settings for one scraping run.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Site root that listing paths and relative detail links resolve against.
    pub base_url: String,
    /// Path of the paginated announcement section.
    pub section_path: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
    /// Retries after the first attempt for transient failures.
    pub max_retries: usize,
    /// First backoff delay; doubles on each retry.
    pub backoff_base: Duration,
    /// Upper bound on random jitter added to each backoff delay.
    pub backoff_jitter: Duration,
    /// Pause after each detail fetch.
    pub detail_delay: Duration,
    /// Pause after each listing page.
    pub page_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            section_path: DEFAULT_SECTION_PATH.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            backoff_jitter: Duration::from_millis(250),
            detail_delay: Duration::from_millis(500),
            page_delay: Duration::from_secs(1),
        }
    }
}

impl ScraperConfig {
    /// Default settings pointed at another site root.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Politeness delays for the crawl loop.
    pub fn throttle(&self) -> Throttle {
        Throttle {
            detail_delay: self.detail_delay,
            page_delay: self.page_delay,
        }
    }
}
