//! Job Listing Harvesting and Catalog Reconciliation
//!
//! Walks job-search result pages, extracts one record per listing, and
//! reconciles the run's results against a durable catalog of known
//! postings: new ids are inserted, known ids refreshed, and ids that were
//! active before the run but absent from it are marked expired.
//!
//! # Design
//!
//! - Site-markup tolerance lives in prioritized strategy lists, one per
//!   field; the first strategy that yields wins
//! - Missing id or title rejects a listing; other fields degrade to defaults
//! - One browser session per run, navigated strictly sequentially
//! - Catalog mutations are independent and idempotent; nothing is retried
//!
//! # Usage
//!
//! ```rust,ignore
//! use job_harvester::{run_harvest, HttpBrowser, MemoryCatalog, RunConfig};
//!
//! let config = RunConfig::load("config.json")?;
//! let catalog = MemoryCatalog::new();
//! let browser = HttpBrowser::from_settings(&config.scrape_settings);
//!
//! let report = run_harvest(&config, browser, &catalog).await?;
//! println!("{} new, {} expired", report.reconcile.inserted.len(), report.reconcile.expired.len());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (Browser, BrowserSession, Catalog)
//! - [`types`] - Records, catalog entries, configuration and reports
//! - [`pipeline`] - Resolver, extractor, harvester, paginator, orchestrator, reconciler
//! - [`browsers`] - HTML parsing and HTTP sessions
//! - [`stores`] - Catalog implementations (MemoryCatalog, SqliteCatalog)
//! - [`testing`] - Mock browser and markup fixtures

pub mod browsers;
pub mod error;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    CatalogError, ConfigError, FetchError, HarvestError, NodeError, Result,
};
pub use traits::{
    browser::{Browser, BrowserSession, CandidateNode, PageView},
    catalog::Catalog,
};
pub use types::{
    batch::ScrapeBatch,
    config::{RunConfig, ScrapeSettings, SearchQuery},
    job::{CatalogEntry, CatalogStats, EntryFilter, JobRecord, JobStatus},
    page::RenderedPage,
    report::{
        HarvestStatus, PageHarvest, QueryHarvest, QuerySummary, ReconcileReport, RunReport,
        StopReason,
    },
};

// Re-export pipeline components
pub use pipeline::{
    // Resolution and extraction
    normalize, Field, FieldResolver, RecordExtractor, Rejection, Strategy,
    // Harvesting and pagination
    page_url, ContainerStrategies, Pacer, PageHarvester, Paginator,
    // Orchestration and reconciliation
    run_harvest, run_harvest_with, ActiveSnapshot, Orchestrator, Reconciler, ScrapeRun,
};

// Re-export implementations
pub use browsers::{HtmlDocument, HttpBrowser};
pub use stores::MemoryCatalog;

#[cfg(feature = "sqlite")]
pub use stores::SqliteCatalog;
