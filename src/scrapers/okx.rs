//! OKX new-listing announcements scraper.
//!
//! This module scrapes the [OKX announcements](https://www.okx.com/help/section/announcements-new-listings)
//! section. The listing is paginated and ordered newest first.
//!
//! # URL Pattern
//!
//! Listing pages live at `<section>/page/<n>`; entries link to detail pages
//! with site-relative URLs such as `/help/okx-to-list-xyz`, which are resolved
//! against the configured site root.
//!
//! # Markup
//!
//! The site uses CSS-module class names with a build hash suffix
//! (`index_articleItem__3Wg1f`), so selectors match on the stable prefix only.

use crate::config::ScraperConfig;
use crate::http::{FetchError, FetchText};
use crate::models::Summary;
use crate::scrapers::AnnouncementSource;
use crate::utils::truncate_for_log;
use chrono::{DateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li[class^='index_articleItem__']").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[class*='index_articleTitle__']").unwrap());
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[data-testid='DateDisplay']").unwrap());
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[class*='index_richTextContent__']").unwrap());

/// Label the site puts in front of the date, e.g. "Published on Jan 15, 2024".
static DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(published|updated)\s+on\s+").unwrap());

/// Date text on a listing entry that no supported format matches.
#[derive(Debug, Error)]
#[error("unrecognised date '{input}': {reason}")]
pub struct DateParseError {
    pub input: String,
    pub reason: String,
}

/// Parse the free-text date shown on a listing entry.
///
/// Date-only text is taken as midnight UTC.
pub fn parse_listing_date(text: &str) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = text.trim();
    let cleaned = DATE_PREFIX.replace(trimmed, "");
    dateparser::parse_with(cleaned.trim(), &Utc, NaiveTime::MIN).map_err(|e| DateParseError {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })
}

fn squash_whitespace(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the entries of one listing page, newest first.
///
/// Entries missing a link, title, or parseable date are skipped one by one.
pub fn parse_listing_page(html: &str, base: &Url) -> Vec<Summary> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for (index, item) in document.select(&ITEM_SELECTOR).enumerate() {
        let Some(link) = item.select(&LINK_SELECTOR).next() else {
            debug!(index, "Listing entry without link; skipping");
            continue;
        };
        let title_el = link.select(&TITLE_SELECTOR).next();
        let date_el = link.select(&DATE_SELECTOR).next();
        let (Some(title_el), Some(date_el)) = (title_el, date_el) else {
            debug!(index, "Listing entry without title or date; skipping");
            continue;
        };

        let title = squash_whitespace(title_el);
        if title.is_empty() {
            debug!(index, "Listing entry with blank title; skipping");
            continue;
        }

        let href = link.value().attr("href").unwrap_or_default();
        let url = match base.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(index, href, error = %e, "Unresolvable link; skipping");
                continue;
            }
        };

        let date_text = squash_whitespace(date_el);
        let date = match parse_listing_date(&date_text) {
            Ok(date) => date,
            Err(e) => {
                warn!(index, %title, error = %e, "Failed to parse date; skipping announcement");
                continue;
            }
        };

        items.push(Summary { title, url, date });
    }

    // stable: same-day entries keep page order
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items
}

/// Extract the body text of a detail page: one trimmed text node per line.
///
/// Returns an empty string when the content region is absent.
pub fn parse_detail_page(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| {
            body.text()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// OKX announcement source over any [`FetchText`] implementation.
#[derive(Debug)]
pub struct OkxSource<F> {
    fetcher: F,
    base: Url,
    section: Url,
}

impl<F> OkxSource<F>
where
    F: FetchText,
{
    pub fn new(fetcher: F, config: &ScraperConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.base_url).map_err(|source| FetchError::BadUrl {
            input: config.base_url.clone(),
            source,
        })?;
        let section = base
            .join(&config.section_path)
            .map_err(|source| FetchError::BadUrl {
                input: config.section_path.clone(),
                source,
            })?;
        Ok(Self {
            fetcher,
            base,
            section,
        })
    }

    /// URL of listing page `page` (1-based).
    pub fn listing_url(&self, page: u32) -> String {
        format!("{}/page/{}", self.section.as_str().trim_end_matches('/'), page)
    }
}

impl<F> AnnouncementSource for OkxSource<F>
where
    F: FetchText,
{
    #[instrument(level = "info", skip(self))]
    async fn fetch_listing(&self, page: u32) -> Result<Vec<Summary>, FetchError> {
        let url = self.listing_url(page);
        let html = self.fetcher.get_text(&url).await?;
        let items = parse_listing_page(&html, &self.base);
        info!(count = items.len(), %url, "Parsed listing page");
        Ok(items)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_detail(&self, url: &str) -> String {
        match self.fetcher.get_text(url).await {
            Ok(html) => {
                let body = parse_detail_page(&html);
                if body.is_empty() {
                    warn!("Detail page has no content region");
                } else {
                    debug!(bytes = body.len(), preview = %truncate_for_log(&body, 80), "Parsed detail page");
                }
                body
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch detail; leaving body empty");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const LISTING_HTML: &str = r#"
        <html><body><ul>
          <li class="index_articleItem__3Wg1f">
            <a href="/help/okx-to-list-aaa">
              <div class="index_articleTitle__x1Y2z">OKX to list AAA</div>
              <span data-testid="DateDisplay">Published on Jan 10, 2024</span>
            </a>
          </li>
          <li class="index_articleItem__3Wg1f">
            <a href="/help/okx-to-list-ccc">
              <div class="index_articleTitle__x1Y2z">
                OKX to list
                <b>CCC</b>
              </div>
              <span data-testid="DateDisplay">Published on Jan 20, 2024</span>
            </a>
          </li>
          <li class="index_articleItem__3Wg1f">
            <a href="/help/no-date">
              <div class="index_articleTitle__x1Y2z">Entry without a date</div>
            </a>
          </li>
          <li class="index_articleItem__3Wg1f">
            <div class="index_articleTitle__x1Y2z">Entry without a link</div>
          </li>
          <li class="index_articleItem__3Wg1f">
            <a href="/help/bad-date">
              <div class="index_articleTitle__x1Y2z">Entry with a broken date</div>
              <span data-testid="DateDisplay">Published on sometime soon</span>
            </a>
          </li>
          <li class="index_articleItem__3Wg1f">
            <a href="https://www.okx.com/help/okx-to-list-bbb">
              <div class="index_articleTitle__x1Y2z">OKX to list BBB</div>
              <span data-testid="DateDisplay">2024-01-15</span>
            </a>
          </li>
          <li class="sidebar_item">
            <a href="/help/unrelated">
              <div class="index_articleTitle__x1Y2z">Not an announcement</div>
              <span data-testid="DateDisplay">Jan 30, 2024</span>
            </a>
          </li>
        </ul></body></html>
    "#;

    const DETAIL_HTML: &str = r#"
        <html><body>
          <h1>OKX to list AAA</h1>
          <div class="index_richTextContent__9aB8c">
            <p>Dear OKX users,</p>
            <p>  We will list <strong>AAA</strong> for spot trading.  </p>
            <p>   </p>
            <ul><li>Deposits: open</li><li>Trading: 10:00 UTC</li></ul>
          </div>
          <footer>Footer text</footer>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://www.okx.com/").unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    /// Serves canned pages by URL; unknown URLs are 404s.
    #[derive(Debug, Default)]
    struct CannedSite {
        pages: HashMap<String, Result<String, StatusCode>>,
        requested: RefCell<Vec<String>>,
    }

    impl CannedSite {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(html.to_string()));
            self
        }

        fn failing(mut self, url: &str, status: StatusCode) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }
    }

    impl FetchText for CannedSite {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            self.requested.borrow_mut().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(html)) => Ok(html.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: StatusCode::NOT_FOUND,
                }),
            }
        }
    }

    #[test]
    fn test_parse_listing_date_formats() {
        assert_eq!(
            parse_listing_date("Published on Jan 15, 2024").unwrap(),
            midnight(2024, 1, 15)
        );
        assert_eq!(
            parse_listing_date("  updated on Feb 3, 2024 ").unwrap(),
            midnight(2024, 2, 3)
        );
        assert_eq!(parse_listing_date("2024-01-15").unwrap(), midnight(2024, 1, 15));
    }

    #[test]
    fn test_parse_listing_date_rejects_garbage() {
        let err = parse_listing_date("Published on sometime soon").unwrap_err();
        assert_eq!(err.input, "Published on sometime soon");
        assert!(parse_listing_date("").is_err());
    }

    #[test]
    fn test_parse_listing_page_skips_malformed_and_sorts() {
        let items = parse_listing_page(LISTING_HTML, &base());

        let titles: Vec<_> = items.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["OKX to list CCC", "OKX to list BBB", "OKX to list AAA"]);

        assert_eq!(items[0].url, "https://www.okx.com/help/okx-to-list-ccc");
        assert_eq!(items[0].date, midnight(2024, 1, 20));
        assert_eq!(items[1].url, "https://www.okx.com/help/okx-to-list-bbb");
        assert_eq!(items[2].date, midnight(2024, 1, 10));
    }

    #[test]
    fn test_parse_listing_page_empty() {
        assert!(parse_listing_page("<html><body><p>No results</p></body></html>", &base()).is_empty());
        assert!(parse_listing_page("", &base()).is_empty());
    }

    #[test]
    fn test_parse_listing_page_keeps_order_for_same_day() {
        let html = r#"
            <li class="index_articleItem__a"><a href="/help/first">
              <div class="index_articleTitle__b">First</div>
              <span data-testid="DateDisplay">Mar 1, 2024</span></a></li>
            <li class="index_articleItem__a"><a href="/help/second">
              <div class="index_articleTitle__b">Second</div>
              <span data-testid="DateDisplay">Mar 1, 2024</span></a></li>
        "#;
        let items = parse_listing_page(html, &base());
        assert_eq!(items[0].title, "First");
        assert_eq!(items[1].title, "Second");
    }

    #[test]
    fn test_parse_detail_page() {
        let body = parse_detail_page(DETAIL_HTML);
        assert_eq!(
            body,
            "Dear OKX users,\nWe will list\nAAA\nfor spot trading.\nDeposits: open\nTrading: 10:00 UTC"
        );
        assert!(!body.contains("Footer"));
    }

    #[test]
    fn test_parse_detail_page_without_content_region() {
        assert_eq!(parse_detail_page("<html><body><p>Moved</p></body></html>"), "");
    }

    #[test]
    fn test_listing_url() {
        let source = OkxSource::new(CannedSite::default(), &ScraperConfig::default()).unwrap();
        assert_eq!(
            source.listing_url(1),
            "https://www.okx.com/help/section/announcements-new-listings/page/1"
        );
        assert_eq!(
            source.listing_url(12),
            "https://www.okx.com/help/section/announcements-new-listings/page/12"
        );
    }

    #[test]
    fn test_source_rejects_bad_base_url() {
        let config = ScraperConfig::with_base_url("not a url");
        let err = OkxSource::new(CannedSite::default(), &config).unwrap_err();
        assert!(matches!(err, FetchError::BadUrl { .. }));
    }

    #[tokio::test]
    async fn test_fetch_listing_requests_page_url() {
        let site = CannedSite::default().page(
            "https://www.okx.com/help/section/announcements-new-listings/page/2",
            LISTING_HTML,
        );
        let source = OkxSource::new(site, &ScraperConfig::default()).unwrap();

        let items = source.fetch_listing(2).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(source.fetcher.requested.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_listing_propagates_http_errors() {
        let site = CannedSite::default().failing(
            "https://www.okx.com/help/section/announcements-new-listings/page/1",
            StatusCode::FORBIDDEN,
        );
        let source = OkxSource::new(site, &ScraperConfig::default()).unwrap();

        assert!(source.fetch_listing(1).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_detail_falls_back_to_empty_body() {
        let site = CannedSite::default()
            .page("https://www.okx.com/help/okx-to-list-aaa", DETAIL_HTML)
            .failing("https://www.okx.com/help/slow", StatusCode::GATEWAY_TIMEOUT);
        let source = OkxSource::new(site, &ScraperConfig::default()).unwrap();

        let body = source.fetch_detail("https://www.okx.com/help/okx-to-list-aaa").await;
        assert!(body.starts_with("Dear OKX users,"));
        assert_eq!(source.fetch_detail("https://www.okx.com/help/slow").await, "");
        assert_eq!(source.fetch_detail("https://www.okx.com/help/missing").await, "");
    }
}
