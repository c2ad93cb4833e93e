//! Reconciliation - bring the catalog in line with one run's batch.
//!
//! The active-id snapshot is taken before scraping starts. A listing that
//! vanishes and reappears while the run is in flight is therefore never
//! expired by that run.

use chrono::{Local, NaiveDate};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::catalog::Catalog;
use crate::types::batch::ScrapeBatch;
use crate::types::job::JobRecord;
use crate::types::report::ReconcileReport;

/// Ids that were active before the run started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSnapshot {
    ids: HashSet<String>,
}

impl ActiveSnapshot {
    pub fn new(ids: HashSet<String>) -> Self {
        Self { ids }
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.ids.contains(job_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }

    /// Snapshot ids absent from the batch, sorted.
    pub fn missing_from(&self, batch: &ScrapeBatch) -> BTreeSet<String> {
        self.ids
            .iter()
            .filter(|id| !batch.contains(id))
            .cloned()
            .collect()
    }
}

impl FromIterator<String> for ActiveSnapshot {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Applies a batch to a catalog.
///
/// Every mutation is independent and idempotent; a failure part-way
/// leaves earlier mutations committed and the run can be repeated.
pub struct Reconciler<'c, C: Catalog + ?Sized> {
    catalog: &'c C,
}

impl<'c, C: Catalog + ?Sized> Reconciler<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        Self { catalog }
    }

    /// Take the pre-scrape snapshot of active ids.
    pub async fn snapshot(&self) -> Result<ActiveSnapshot> {
        let ids = self.catalog.active_job_ids().await?;
        debug!("Snapshot holds {} active jobs", ids.len());
        Ok(ActiveSnapshot::new(ids))
    }

    /// Reconcile using today's local date.
    pub async fn reconcile(
        &self,
        batch: &ScrapeBatch,
        snapshot: &ActiveSnapshot,
    ) -> Result<ReconcileReport> {
        self.reconcile_on(batch, snapshot, Local::now().date_naive())
            .await
    }

    /// Reconcile a batch against the catalog as of `today`.
    ///
    /// Known ids are touched (and reactivated if they had expired), new
    /// ids are inserted, and snapshot ids missing from the batch are
    /// marked expired. `applied_on` is never changed.
    pub async fn reconcile_on(
        &self,
        batch: &ScrapeBatch,
        snapshot: &ActiveSnapshot,
        today: NaiveDate,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for record in batch.records() {
            if self.catalog.exists(&record.job_id).await? {
                self.touch(record, snapshot, today, &mut report).await?;
            } else if self.catalog.insert(record, today).await? {
                report.inserted.insert(record.job_id.clone());
            } else {
                // Inserted by someone else since the existence check.
                self.touch(record, snapshot, today, &mut report).await?;
            }
        }

        report.expired = snapshot.missing_from(batch);
        if !report.expired.is_empty() {
            let ids: Vec<String> = report.expired.iter().cloned().collect();
            let updated = self.catalog.mark_expired(&ids).await?;
            if updated != ids.len() {
                warn!(
                    "Expected to expire {} jobs, catalog updated {}",
                    ids.len(),
                    updated
                );
            }
        }

        info!(
            "Reconciled: {} new, {} seen again ({} reactivated), {} expired",
            report.inserted.len(),
            report.touched.len(),
            report.reactivated.len(),
            report.expired.len()
        );

        Ok(report)
    }

    async fn touch(
        &self,
        record: &JobRecord,
        snapshot: &ActiveSnapshot,
        today: NaiveDate,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        if !self.catalog.touch(&record.job_id, today).await? {
            warn!("Job {} disappeared from the catalog during reconciliation", record.job_id);
            return Ok(());
        }
        report.touched.insert(record.job_id.clone());
        if !snapshot.contains(&record.job_id) {
            debug!("Job {} reappeared", record.job_id);
            report.reactivated.insert(record.job_id.clone());
        }
        Ok(())
    }
}
