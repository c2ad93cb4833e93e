//! Catalog collaborator trait.
//!
//! The catalog owns persisted [`CatalogEntry`] rows. The reconciler only
//! requests mutations through this interface. Every mutation is
//! independent and idempotent, so a partially applied reconciliation can
//! simply be re-run.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;

use crate::error::CatalogResult;
use crate::types::job::{CatalogEntry, CatalogStats, EntryFilter, JobRecord};

/// Durable job catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Whether an entry exists for this id, whatever its status.
    async fn exists(&self, job_id: &str) -> CatalogResult<bool>;

    /// Insert a new active entry first and last seen on `seen_on`.
    ///
    /// Returns false (and changes nothing) if the id already exists.
    async fn insert(&self, record: &JobRecord, seen_on: NaiveDate) -> CatalogResult<bool>;

    /// Set `last_seen` and mark the entry active.
    ///
    /// Never touches `applied_on`. Returns false if the id is unknown.
    async fn touch(&self, job_id: &str, seen_on: NaiveDate) -> CatalogResult<bool>;

    /// Mark entries expired without deleting them.
    ///
    /// Returns the number of entries updated.
    async fn mark_expired(&self, job_ids: &[String]) -> CatalogResult<usize>;

    /// Ids of all active entries.
    async fn active_job_ids(&self) -> CatalogResult<HashSet<String>>;

    /// Catalog counters.
    async fn stats(&self) -> CatalogResult<CatalogStats>;

    /// Get one entry.
    async fn get(&self, job_id: &str) -> CatalogResult<Option<CatalogEntry>>;

    /// List entries, most recently seen first.
    async fn list(&self, filter: &EntryFilter) -> CatalogResult<Vec<CatalogEntry>>;

    /// Record or clear an application date.
    ///
    /// This is the only operation allowed to clear `applied_on`.
    async fn set_applied(&self, job_id: &str, applied_on: Option<NaiveDate>)
        -> CatalogResult<bool>;
}

/// Order entries the way listings are presented: last seen desc, then id.
pub fn sort_entries(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| {
        b.last_seen
            .cmp(&a.last_seen)
            .then_with(|| a.job_id.cmp(&b.job_id))
    });
}
