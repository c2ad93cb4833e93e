//! Pagination - walk one search query page by page.
//!
//! Each iteration fetches the page at the current offset and harvests it.
//! The loop stops, in this order of precedence, on a fetch error (records
//! gathered so far are kept), on a page that yields zero records, or when
//! the page ceiling is reached.

use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::pipeline::harvest::PageHarvester;
use crate::pipeline::pacing::Pacer;
use crate::traits::browser::BrowserSession;
use crate::types::config::ScrapeSettings;
use crate::types::report::{QueryHarvest, StopReason};

/// Query parameter carrying the result offset.
const OFFSET_PARAM: &str = "start";

/// URL of the results page at `offset`.
///
/// Any `start` parameter already present is replaced, so exactly one
/// offset is sent.
pub fn page_url(query_url: &str, offset: usize) -> String {
    match Url::parse(query_url) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| key != OFFSET_PARAM)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair(OFFSET_PARAM, &offset.to_string());
            url.into()
        }
        Err(_) => {
            let separator = if query_url.contains('?') { '&' } else { '?' };
            format!("{}{}{}={}", query_url, separator, OFFSET_PARAM, offset)
        }
    }
}

/// Drives the page loop of a single query.
#[derive(Debug, Clone)]
pub struct Paginator {
    harvester: PageHarvester,
    pacer: Pacer,
    page_increment: usize,
    max_pages: usize,
    page_timeout: Duration,
}

impl Paginator {
    pub fn new(harvester: PageHarvester, settings: &ScrapeSettings) -> Self {
        Self {
            harvester,
            pacer: Pacer::from_settings(settings),
            page_increment: settings.page_increment,
            max_pages: settings.max_pages,
            page_timeout: settings.page_load_timeout(),
        }
    }

    /// Override the pacer (tests use [`Pacer::none`]).
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Walk every page of one query.
    ///
    /// Records are concatenated in page order without deduplication.
    pub async fn paginate<S>(&self, session: &S, query_url: &str) -> QueryHarvest
    where
        S: BrowserSession + ?Sized,
    {
        let mut harvest = QueryHarvest::new(query_url);
        harvest.stop = StopReason::PageLimit;

        for page_index in 0..self.max_pages {
            let Some(offset) = page_index.checked_mul(self.page_increment) else {
                warn!("Offset of page {} overflows, stopping {}", page_index + 1, query_url);
                break;
            };
            if page_index > 0 {
                self.pacer.between_pages().await;
            }

            let url = page_url(query_url, offset);
            let page = match session.navigate(&url, self.page_timeout).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Stopping query after fetch failure on {}: {}", url, e);
                    harvest.stop = StopReason::FetchFailed(e.to_string());
                    break;
                }
            };
            harvest.pages_fetched += 1;

            if page.is_auth_wall() {
                warn!("Redirected to {} while loading {}", page.url, url);
            }

            let page_harvest = self.harvester.harvest_rendered(&page, query_url);
            harvest.rejected += page_harvest.rejected;
            if page_harvest.is_anomaly() {
                harvest.anomalies += 1;
            }

            if page_harvest.is_end_of_results() {
                harvest.stop = StopReason::EndOfResults;
                break;
            }
            harvest.records.extend(page_harvest.records);
        }

        info!(
            "Query {} yielded {} records from {} pages ({:?})",
            query_url,
            harvest.records.len(),
            harvest.pages_fetched,
            harvest.stop
        );
        harvest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{card_html, empty_results_page, no_container_page, results_page, MockBrowser};
    use crate::traits::browser::Browser;

    const QUERY: &str = "https://www.linkedin.com/jobs/search/?keywords=rust";

    fn paginator(max_pages: usize) -> Paginator {
        let settings = ScrapeSettings::unpaced().with_max_pages(max_pages);
        Paginator::new(PageHarvester::default(), &settings).with_pacer(Pacer::none())
    }

    fn page_of(ids: &[&str]) -> String {
        let cards: Vec<String> = ids
            .iter()
            .map(|id| card_html(id, &format!("Job {}", id), "Acme", "Remote"))
            .collect();
        results_page(&cards)
    }

    #[test]
    fn test_page_url_replaces_existing_offset() {
        let url = page_url(
            "https://www.linkedin.com/jobs/search/?keywords=a&start=50",
            25,
        );
        assert_eq!(url.matches("start=").count(), 1);
        assert!(url.contains("start=25"));
        assert!(url.contains("keywords=a"));
    }

    #[test]
    fn test_page_url_includes_zero_offset() {
        assert_eq!(
            page_url("https://www.linkedin.com/jobs/search/?keywords=rust", 0),
            "https://www.linkedin.com/jobs/search/?keywords=rust&start=0"
        );
        assert_eq!(
            page_url("https://www.linkedin.com/jobs/search/", 25),
            "https://www.linkedin.com/jobs/search/?start=25"
        );
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let browser = MockBrowser::new()
            .with_page(page_url(QUERY, 0), page_of(&["1", "2"]))
            .with_page(page_url(QUERY, 25), empty_results_page());
        let session = browser.acquire().await.unwrap();

        let harvest = paginator(5).paginate(&session, QUERY).await;

        assert_eq!(browser.navigation_count(), 2);
        assert_eq!(harvest.pages_fetched, 2);
        assert_eq!(harvest.records.len(), 2);
        assert_eq!(harvest.stop, StopReason::EndOfResults);
        assert!(!harvest.is_partial());
    }

    #[tokio::test]
    async fn test_stops_at_page_limit() {
        let browser = MockBrowser::new()
            .with_page(page_url(QUERY, 0), page_of(&["1"]))
            .with_page(page_url(QUERY, 25), page_of(&["2"]))
            .with_page(page_url(QUERY, 50), page_of(&["3"]));
        let session = browser.acquire().await.unwrap();

        let harvest = paginator(2).paginate(&session, QUERY).await;

        assert_eq!(browser.navigation_count(), 2);
        assert_eq!(harvest.stop, StopReason::PageLimit);
        let ids: Vec<_> = harvest.records.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_gathered_records() {
        let browser = MockBrowser::new()
            .with_page(page_url(QUERY, 0), page_of(&["1", "2"]))
            .fail_url(page_url(QUERY, 25));
        let session = browser.acquire().await.unwrap();

        let harvest = paginator(5).paginate(&session, QUERY).await;

        assert_eq!(harvest.records.len(), 2);
        assert_eq!(harvest.pages_fetched, 1);
        assert!(matches!(harvest.stop, StopReason::FetchFailed(_)));
        assert!(harvest.is_partial());
    }

    #[tokio::test]
    async fn test_missing_container_counts_as_anomaly() {
        let browser = MockBrowser::new().with_page(page_url(QUERY, 0), no_container_page());
        let session = browser.acquire().await.unwrap();

        let harvest = paginator(3).paginate(&session, QUERY).await;

        assert!(harvest.records.is_empty());
        assert_eq!(harvest.anomalies, 1);
        assert_eq!(harvest.stop, StopReason::EndOfResults);
        assert!(harvest.is_partial());
    }

    #[tokio::test]
    async fn test_no_cross_page_dedup() {
        let browser = MockBrowser::new()
            .with_page(page_url(QUERY, 0), page_of(&["1"]))
            .with_page(page_url(QUERY, 25), page_of(&["1"]));
        let session = browser.acquire().await.unwrap();

        let harvest = paginator(2).paginate(&session, QUERY).await;
        assert_eq!(harvest.records.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_delay_between_pages_only() {
        let browser = MockBrowser::new().with_pages([
            (page_url(QUERY, 0), page_of(&["1"])),
            (page_url(QUERY, 25), page_of(&["2"])),
            (page_url(QUERY, 50), page_of(&["3"])),
        ]);
        let session = browser.acquire().await.unwrap();
        let paginator = paginator(3).with_pacer(Pacer::new(Duration::from_secs(2), Duration::ZERO));

        let started = tokio::time::Instant::now();
        let harvest = paginator.paginate(&session, QUERY).await;
        let elapsed = started.elapsed();

        assert_eq!(harvest.stop, StopReason::PageLimit);
        assert!(elapsed >= Duration::from_secs(4), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(6), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_end_of_results() {
        let browser = MockBrowser::new().with_pages([
            (page_url(QUERY, 0), page_of(&["1"])),
            (page_url(QUERY, 25), empty_results_page()),
        ]);
        let session = browser.acquire().await.unwrap();
        let paginator = paginator(5).with_pacer(Pacer::new(Duration::from_secs(2), Duration::ZERO));

        let started = tokio::time::Instant::now();
        let harvest = paginator.paginate(&session, QUERY).await;
        let elapsed = started.elapsed();

        assert_eq!(harvest.stop, StopReason::EndOfResults);
        assert!(elapsed >= Duration::from_secs(2), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(4), "{:?}", elapsed);
    }

    #[tokio::test]
    async fn test_overflowing_offset_stops_at_page_limit() {
        let settings = ScrapeSettings::unpaced()
            .with_max_pages(3)
            .with_page_increment(usize::MAX);
        let paginator =
            Paginator::new(PageHarvester::default(), &settings).with_pacer(Pacer::none());
        let browser = MockBrowser::new().with_page(page_url(QUERY, 0), page_of(&["1"]));
        let session = browser.acquire().await.unwrap();

        let harvest = paginator.paginate(&session, QUERY).await;

        assert_eq!(browser.navigations(), vec![page_url(QUERY, 0)]);
        assert_eq!(harvest.records.len(), 1);
        assert_eq!(harvest.stop, StopReason::PageLimit);
    }
}
