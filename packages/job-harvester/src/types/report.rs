//! Outcomes reported by each pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::job::{CatalogStats, JobRecord};

/// How a single page harvest ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStatus {
    /// At least one record extracted
    Harvested,

    /// A result list was found and holds no listings (genuine end of results)
    Empty,

    /// No container strategy matched; possible auth wall or layout change
    NoContainer,

    /// Listings were found but every one was rejected
    AllRejected,
}

/// Result of harvesting one rendered page.
#[derive(Debug, Clone)]
pub struct PageHarvest {
    /// Extracted records, in page order
    pub records: Vec<JobRecord>,

    /// Candidate nodes found on the page
    pub candidates: usize,

    /// Candidate nodes rejected by the extractor
    pub rejected: usize,

    pub status: HarvestStatus,
}

impl PageHarvest {
    /// A page where no container strategy matched.
    pub fn no_container() -> Self {
        Self {
            records: Vec::new(),
            candidates: 0,
            rejected: 0,
            status: HarvestStatus::NoContainer,
        }
    }

    /// A page with a result list but no listings.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            candidates: 0,
            rejected: 0,
            status: HarvestStatus::Empty,
        }
    }

    /// A page whose candidates were all extracted or rejected.
    pub fn from_candidates(records: Vec<JobRecord>, candidates: usize) -> Self {
        let rejected = candidates.saturating_sub(records.len());
        let status = if records.is_empty() {
            HarvestStatus::AllRejected
        } else {
            HarvestStatus::Harvested
        };
        Self {
            records,
            candidates,
            rejected,
            status,
        }
    }

    /// Whether the page deserves operator attention.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self.status,
            HarvestStatus::NoContainer | HarvestStatus::AllRejected
        )
    }

    /// Whether pagination should stop after this page.
    ///
    /// Anomalies count as zero records for control flow.
    pub fn is_end_of_results(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why the pagination loop of one query stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum StopReason {
    /// Navigation failed; records gathered so far were kept
    FetchFailed(String),

    /// A page yielded zero records
    EndOfResults,

    /// The page-count ceiling was reached
    PageLimit,
}

/// Everything harvested for one search query.
#[derive(Debug, Clone)]
pub struct QueryHarvest {
    pub query_url: String,

    /// Records from every page, in page order, not deduplicated
    pub records: Vec<JobRecord>,

    /// Pages successfully navigated to
    pub pages_fetched: usize,

    /// Pages flagged as harvest anomalies
    pub anomalies: usize,

    /// Candidates rejected across all pages
    pub rejected: usize,

    pub stop: StopReason,
}

impl QueryHarvest {
    pub fn new(query_url: impl Into<String>) -> Self {
        Self {
            query_url: query_url.into(),
            records: Vec::new(),
            pages_fetched: 0,
            anomalies: 0,
            rejected: 0,
            stop: StopReason::EndOfResults,
        }
    }

    /// Whether this query may have missed listings that are still live.
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopReason::FetchFailed(_)) || self.anomalies > 0
    }
}

/// Per-query summary kept in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySummary {
    pub query_url: String,
    pub records: usize,
    pub pages_fetched: usize,
    pub anomalies: usize,
    pub rejected: usize,
    pub stop: StopReason,
}

impl From<&QueryHarvest> for QuerySummary {
    fn from(harvest: &QueryHarvest) -> Self {
        Self {
            query_url: harvest.query_url.clone(),
            records: harvest.records.len(),
            pages_fetched: harvest.pages_fetched,
            anomalies: harvest.anomalies,
            rejected: harvest.rejected,
            stop: harvest.stop.clone(),
        }
    }
}

/// The three disjoint id sets produced by reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Ids new to the catalog
    pub inserted: BTreeSet<String>,

    /// Ids already in the catalog whose last-seen date was refreshed
    pub touched: BTreeSet<String>,

    /// Touched ids that were not active before the run
    pub reactivated: BTreeSet<String>,

    /// Previously active ids absent from this run
    pub expired: BTreeSet<String>,
}

impl ReconcileReport {
    /// Check the disjointness invariants.
    pub fn is_disjoint(&self) -> bool {
        self.inserted.is_disjoint(&self.expired)
            && self.touched.is_disjoint(&self.expired)
            && self.inserted.is_disjoint(&self.touched)
    }
}

/// Summary of one complete harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub queries: Vec<QuerySummary>,

    /// Records in the deduplicated batch
    pub batch_size: usize,

    pub reconcile: ReconcileReport,

    /// Catalog counters after reconciliation
    pub stats: CatalogStats,
}

impl RunReport {
    /// False when a query stopped on a fetch failure or saw an anomaly.
    ///
    /// Expirations computed from an incomplete run may be premature.
    pub fn is_complete(&self) -> bool {
        self.queries.iter().all(|q| {
            !matches!(q.stop, StopReason::FetchFailed(_)) && q.anomalies == 0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_rejected_is_anomaly_but_ends_results() {
        let harvest = PageHarvest::from_candidates(Vec::new(), 4);
        assert_eq!(harvest.status, HarvestStatus::AllRejected);
        assert_eq!(harvest.rejected, 4);
        assert!(harvest.is_anomaly());
        assert!(harvest.is_end_of_results());
    }

    #[test]
    fn test_empty_is_not_anomaly() {
        let harvest = PageHarvest::empty();
        assert!(!harvest.is_anomaly());
        assert!(harvest.is_end_of_results());
        assert!(PageHarvest::no_container().is_anomaly());
    }

    #[test]
    fn test_partial_query() {
        let mut harvest = QueryHarvest::new("https://example.com");
        assert!(!harvest.is_partial());
        harvest.stop = StopReason::FetchFailed("timeout".to_string());
        assert!(harvest.is_partial());
    }
}
