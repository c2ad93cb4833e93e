//! A complete harvest run: snapshot, scrape, reconcile, report.

use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{HarvestError, Result};
use crate::pipeline::harvest::PageHarvester;
use crate::pipeline::orchestrate::Orchestrator;
use crate::pipeline::paginate::Paginator;
use crate::pipeline::reconcile::Reconciler;
use crate::traits::browser::Browser;
use crate::traits::catalog::Catalog;
use crate::types::config::RunConfig;
use crate::types::report::{QuerySummary, RunReport};

/// Run every configured search and reconcile the catalog.
///
/// Uses the default page harvester; see [`run_harvest_with`] to supply
/// custom strategies.
pub async fn run_harvest<B, C>(config: &RunConfig, browser: B, catalog: &C) -> Result<RunReport>
where
    B: Browser,
    C: Catalog + ?Sized,
{
    run_harvest_with(config, browser, PageHarvester::default(), catalog).await
}

/// Run every configured search with a custom harvester.
///
/// Nothing is reconciled if the configuration is invalid or the browser
/// session cannot be acquired.
pub async fn run_harvest_with<B, C>(
    config: &RunConfig,
    browser: B,
    harvester: PageHarvester,
    catalog: &C,
) -> Result<RunReport>
where
    B: Browser,
    C: Catalog + ?Sized,
{
    let run_id = Uuid::now_v7();
    let span = info_span!("harvest_run", %run_id);

    async move {
        config.validate()?;
        let query_urls = config.query_urls()?;
        let started_at = Utc::now();
        info!("Starting harvest of {} searches", query_urls.len());

        let reconciler = Reconciler::new(catalog);
        let snapshot = reconciler.snapshot().await?;

        let paginator = Paginator::new(harvester, &config.scrape_settings);
        let orchestrator = Orchestrator::new(browser, paginator);
        let scrape = orchestrator.run(&query_urls).await?;

        let queries: Vec<QuerySummary> = scrape.queries.iter().map(QuerySummary::from).collect();
        if scrape.is_partial() {
            warn!("Some searches were incomplete; expirations in this run may be premature");
        }

        let reconcile = reconciler.reconcile(&scrape.batch, &snapshot).await?;
        let stats = catalog.stats().await?;

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            queries,
            batch_size: scrape.batch.len(),
            reconcile,
            stats,
        };

        info!(
            "Harvest finished: {} jobs scraped, catalog has {} active of {}",
            report.batch_size, report.stats.active, report.stats.total
        );
        Ok::<_, HarvestError>(report)
    }
    .instrument(span)
    .await
}
