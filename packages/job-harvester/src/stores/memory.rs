//! In-memory catalog implementation for testing and development.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::CatalogResult;
use crate::traits::catalog::{sort_entries, Catalog};
use crate::types::job::{CatalogEntry, CatalogStats, EntryFilter, JobRecord, JobStatus};

/// In-memory job catalog.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryCatalog {
    entries: RwLock<HashMap<String, CatalogEntry>>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a catalog holding existing entries.
    pub fn with_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|e| (e.job_id.clone(), e))
                    .collect(),
            ),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn exists(&self, job_id: &str) -> CatalogResult<bool> {
        Ok(self.entries.read().unwrap().contains_key(job_id))
    }

    async fn insert(&self, record: &JobRecord, seen_on: NaiveDate) -> CatalogResult<bool> {
        let mut entries = self.entries.write().unwrap();
        if entries.contains_key(&record.job_id) {
            return Ok(false);
        }
        entries.insert(
            record.job_id.clone(),
            CatalogEntry::from_record(record, seen_on),
        );
        Ok(true)
    }

    async fn touch(&self, job_id: &str, seen_on: NaiveDate) -> CatalogResult<bool> {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(job_id) {
            Some(entry) => {
                entry.last_seen = seen_on;
                entry.status = JobStatus::Active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_expired(&self, job_ids: &[String]) -> CatalogResult<usize> {
        let mut entries = self.entries.write().unwrap();
        let mut updated = 0;
        for job_id in job_ids {
            if let Some(entry) = entries.get_mut(job_id) {
                entry.status = JobStatus::Expired;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn active_job_ids(&self) -> CatalogResult<HashSet<String>> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .values()
            .filter(|e| e.is_active())
            .map(|e| e.job_id.clone())
            .collect())
    }

    async fn stats(&self) -> CatalogResult<CatalogStats> {
        Ok(CatalogStats::from_entries(
            self.entries.read().unwrap().values(),
        ))
    }

    async fn get(&self, job_id: &str) -> CatalogResult<Option<CatalogEntry>> {
        Ok(self.entries.read().unwrap().get(job_id).cloned())
    }

    async fn list(&self, filter: &EntryFilter) -> CatalogResult<Vec<CatalogEntry>> {
        let mut entries: Vec<CatalogEntry> = self
            .entries
            .read()
            .unwrap()
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        sort_entries(&mut entries);
        if let Some(limit) = filter.limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    async fn set_applied(
        &self,
        job_id: &str,
        applied_on: Option<NaiveDate>,
    ) -> CatalogResult<bool> {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(job_id) {
            Some(entry) => {
                entry.applied_on = applied_on;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
