//! Multi-query orchestration over one browser session.

use tracing::{info, warn};

use crate::error::Result;
use crate::pipeline::paginate::Paginator;
use crate::traits::browser::Browser;
use crate::types::batch::ScrapeBatch;
use crate::types::report::QueryHarvest;

/// Everything scraped in one run.
#[derive(Debug, Clone)]
pub struct ScrapeRun {
    /// Records deduplicated by id, last occurrence wins
    pub batch: ScrapeBatch,

    /// Per-query outcomes, in query order
    pub queries: Vec<QueryHarvest>,
}

impl ScrapeRun {
    /// Whether any query may have missed live listings.
    pub fn is_partial(&self) -> bool {
        self.queries.iter().any(QueryHarvest::is_partial)
    }
}

/// Runs queries strictly sequentially through a single session.
pub struct Orchestrator<B: Browser> {
    browser: B,
    paginator: Paginator,
}

impl<B: Browser> Orchestrator<B> {
    pub fn new(browser: B, paginator: Paginator) -> Self {
        Self { browser, paginator }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Scrape every query.
    ///
    /// The session is acquired once and released on every path. A query
    /// that fails part-way keeps what it gathered and the run moves on.
    pub async fn run(&self, query_urls: &[String]) -> Result<ScrapeRun> {
        let session = self.browser.acquire().await?;
        let queries = self.run_queries(&session, query_urls).await;
        self.browser.release(session).await;

        let mut batch = ScrapeBatch::new();
        let mut scraped = 0;
        for query in &queries {
            scraped += query.records.len();
            batch.extend(query.records.iter().cloned());
        }

        info!(
            "Scraped {} records ({} unique) from {} queries",
            scraped,
            batch.len(),
            queries.len()
        );

        Ok(ScrapeRun { batch, queries })
    }

    async fn run_queries(&self, session: &B::Session, query_urls: &[String]) -> Vec<QueryHarvest> {
        let mut queries = Vec::with_capacity(query_urls.len());
        for (index, query_url) in query_urls.iter().enumerate() {
            if index > 0 {
                self.paginator.pacer().between_queries().await;
            }

            info!("Query {}/{}: {}", index + 1, query_urls.len(), query_url);
            let harvest = self.paginator.paginate(session, query_url).await;
            if harvest.is_partial() {
                warn!("Query {} may be incomplete ({:?})", query_url, harvest.stop);
            }
            queries.push(harvest);
        }
        queries
    }
}
