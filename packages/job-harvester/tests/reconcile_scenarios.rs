//! End-to-end harvest and reconciliation scenarios.
//!
//! These tests drive a full run through the mock browser:
//! 1. Snapshot the active catalog
//! 2. Paginate every query
//! 3. Deduplicate the batch
//! 4. Insert, touch and expire

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

use job_harvester::{
    page_url, run_harvest,
    testing::{card_html, empty_results_page, results_page, MockBrowser},
    Catalog, JobRecord, JobStatus, MemoryCatalog, Pacer, PageHarvester, Paginator, Reconciler,
    RunConfig, ScrapeBatch, ScrapeSettings, SearchQuery,
};

const QUERY: &str = "https://www.linkedin.com/jobs/search/?keywords=data+scientist&location=Stockholm";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn record(id: &str) -> JobRecord {
    JobRecord::new(id, format!("Job {}", id), QUERY)
}

/// Helper to seed a catalog with active entries.
async fn catalog_with(ids: &[&str]) -> MemoryCatalog {
    let catalog = MemoryCatalog::new();
    for id in ids {
        catalog.insert(&record(id), day(1)).await.unwrap();
    }
    catalog
}

fn ids(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

fn config(max_pages: usize) -> RunConfig {
    RunConfig::new([SearchQuery::url(QUERY)])
        .with_settings(ScrapeSettings::unpaced().with_max_pages(max_pages))
}

fn page_with(ids: &[&str]) -> String {
    let cards: Vec<String> = ids
        .iter()
        .map(|id| card_html(id, &format!("Job {}", id), "Acme", "Stockholm"))
        .collect();
    results_page(&cards)
}

#[tokio::test]
async fn test_one_page_run_inserts_touches_and_expires() {
    let catalog = catalog_with(&["100", "200"]).await;
    let browser = MockBrowser::new()
        .with_page(page_url(QUERY, 0), page_with(&["200", "300"]))
        .with_page(page_url(QUERY, 25), empty_results_page());

    let report = run_harvest(&config(3), browser, &catalog).await.unwrap();

    assert_eq!(ids(&report.reconcile.inserted), vec!["300"]);
    assert_eq!(ids(&report.reconcile.touched), vec!["200"]);
    assert_eq!(ids(&report.reconcile.expired), vec!["100"]);

    let active = catalog.active_job_ids().await.unwrap();
    assert_eq!(
        active,
        HashSet::from(["200".to_string(), "300".to_string()])
    );
    let expired = catalog.get("100").await.unwrap().unwrap();
    assert_eq!(expired.status, JobStatus::Expired);
}

#[tokio::test]
async fn test_pagination_stops_on_first_empty_page() {
    let catalog = MemoryCatalog::new();
    let browser = MockBrowser::new()
        .with_page(page_url(QUERY, 0), page_with(&["1", "2"]))
        .with_page(page_url(QUERY, 25), empty_results_page())
        .with_page(page_url(QUERY, 50), page_with(&["3"]));

    let report = run_harvest(&config(5), browser.clone(), &catalog)
        .await
        .unwrap();

    assert_eq!(browser.navigation_count(), 2);
    assert_eq!(report.queries[0].pages_fetched, 2);
    assert_eq!(report.batch_size, 2);
}

#[tokio::test]
async fn test_expired_job_reappearing_is_reactivated() {
    let catalog = catalog_with(&["100"]).await;
    catalog.mark_expired(&["100".to_string()]).await.unwrap();

    let browser = MockBrowser::new()
        .with_page(page_url(QUERY, 0), page_with(&["100"]))
        .with_page(page_url(QUERY, 25), empty_results_page());

    let report = run_harvest(&config(3), browser, &catalog).await.unwrap();

    assert!(report.reconcile.reactivated.contains("100"));
    assert!(report.reconcile.inserted.is_empty());
    let entry = catalog.get("100").await.unwrap().unwrap();
    assert_eq!(entry.status, JobStatus::Active);
    assert_eq!(report.stats.total, 1);
}

#[tokio::test]
async fn test_session_released_once_when_every_fetch_fails() {
    let catalog = catalog_with(&["100"]).await;
    let second = "https://www.linkedin.com/jobs/search/?keywords=rust";
    let browser = MockBrowser::new()
        .fail_url(page_url(QUERY, 0))
        .fail_url(page_url(second, 0));
    let config = RunConfig::new([SearchQuery::url(QUERY), SearchQuery::url(second)])
        .with_settings(ScrapeSettings::unpaced());

    let report = run_harvest(&config, browser.clone(), &catalog)
        .await
        .unwrap();

    assert_eq!(browser.acquire_count(), 1);
    assert_eq!(browser.release_count(), 1);
    assert!(!report.is_complete());
    // Expiry still follows the batch; callers see the run was incomplete.
    assert!(report.reconcile.expired.contains("100"));
}

#[tokio::test]
async fn test_applied_date_is_never_cleared_by_runs() {
    let catalog = catalog_with(&["100", "200"]).await;
    catalog.set_applied("100", Some(day(2))).await.unwrap();
    catalog.set_applied("200", Some(day(2))).await.unwrap();

    let browser = MockBrowser::new()
        .with_page(page_url(QUERY, 0), page_with(&["200"]))
        .with_page(page_url(QUERY, 25), empty_results_page());
    run_harvest(&config(3), browser, &catalog).await.unwrap();

    for id in ["100", "200"] {
        let entry = catalog.get(id).await.unwrap().unwrap();
        assert_eq!(entry.applied_on, Some(day(2)));
    }
}

#[tokio::test]
async fn test_touch_twice_same_day_is_idempotent() {
    let catalog = catalog_with(&["100"]).await;
    catalog.touch("100", day(9)).await.unwrap();
    let once = catalog.get("100").await.unwrap().unwrap();
    catalog.touch("100", day(9)).await.unwrap();
    let twice = catalog.get("100").await.unwrap().unwrap();
    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_custom_paginator_with_orchestrator() {
    use job_harvester::Orchestrator;

    let browser = MockBrowser::new()
        .with_page(page_url(QUERY, 0), page_with(&["1"]))
        .with_page(page_url(QUERY, 10), page_with(&["1", "2"]));
    let settings = ScrapeSettings::unpaced()
        .with_max_pages(2)
        .with_page_increment(10);
    let paginator = Paginator::new(PageHarvester::default(), &settings).with_pacer(Pacer::none());

    let run = Orchestrator::new(browser, paginator)
        .run(&[QUERY.to_string()])
        .await
        .unwrap();

    assert_eq!(run.queries[0].records.len(), 3);
    assert_eq!(run.batch.len(), 2);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_scenario_against_sqlite() {
    use job_harvester::SqliteCatalog;

    let catalog = SqliteCatalog::in_memory().await.unwrap();
    catalog.insert(&record("100"), day(1)).await.unwrap();
    catalog.insert(&record("200"), day(1)).await.unwrap();

    let browser = MockBrowser::new()
        .with_page(page_url(QUERY, 0), page_with(&["200", "300"]))
        .with_page(page_url(QUERY, 25), empty_results_page());
    let report = run_harvest(&config(3), browser, &catalog).await.unwrap();

    assert!(report.reconcile.inserted.contains("300"));
    assert!(report.reconcile.expired.contains("100"));
    assert_eq!(report.stats.active, 2);
    assert_eq!(report.stats.expired, 1);
}

proptest! {
    #[test]
    fn prop_reconcile_sets_are_disjoint(
        before in prop::collection::hash_set(0u16..40, 0..20),
        scraped in prop::collection::vec(0u16..40, 0..30),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let catalog = MemoryCatalog::new();
            for id in &before {
                catalog.insert(&record(&id.to_string()), day(1)).await.unwrap();
            }

            let batch: ScrapeBatch = scraped.iter().map(|id| record(&id.to_string())).collect();
            let reconciler = Reconciler::new(&catalog);
            let snapshot = reconciler.snapshot().await.unwrap();
            let report = reconciler.reconcile_on(&batch, &snapshot, day(2)).await.unwrap();

            assert!(report.is_disjoint());
            assert!(report.reactivated.is_subset(&report.touched));
            assert_eq!(report.inserted.len() + report.touched.len(), batch.len());

            let active = catalog.active_job_ids().await.unwrap();
            assert_eq!(active, batch.ids());
        });
    }
}
