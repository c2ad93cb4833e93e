//! Job records and catalog entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base of every canonical posting URL.
pub const JOB_VIEW_BASE: &str = "https://www.linkedin.com/jobs/view/";

/// Default for company and location when no strategy resolves them.
pub const UNKNOWN: &str = "Unknown";

/// Build the canonical posting URL for a job id.
///
/// Scraped hrefs are relative or carry tracking parameters, so the URL
/// is always derived from the id alone.
pub fn canonical_url(job_id: &str) -> String {
    format!("{}{}", JOB_VIEW_BASE, job_id)
}

/// One listing extracted from a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Canonical identifier (unique key)
    pub job_id: String,

    /// Normalized, non-empty title
    pub title: String,

    /// Company name, or [`UNKNOWN`]
    pub company: String,

    /// Location, or [`UNKNOWN`]
    pub location: String,

    /// Canonical posting URL derived from `job_id`
    pub url: String,

    /// Raw site-provided posting timestamp
    pub posted_at: Option<String>,

    /// Empty unless the detail page is fetched
    #[serde(default)]
    pub description: String,

    /// Search URL this record was harvested from
    pub source_query: String,
}

impl JobRecord {
    /// Create a record with default company/location.
    pub fn new(
        job_id: impl Into<String>,
        title: impl Into<String>,
        source_query: impl Into<String>,
    ) -> Self {
        let job_id = job_id.into();
        Self {
            url: canonical_url(&job_id),
            job_id,
            title: title.into(),
            company: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            posted_at: None,
            description: String::new(),
            source_query: source_query.into(),
        }
    }

    /// Set the company.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the posting timestamp.
    pub fn with_posted_at(mut self, posted_at: impl Into<String>) -> Self {
        self.posted_at = Some(posted_at.into());
        self
    }
}

/// Lifecycle status of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(JobStatus::Active),
            "expired" => Ok(JobStatus::Expired),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// A persisted catalog row.
///
/// Field names follow the stored record shape so existing readers keep
/// working: `link` and `date_posted` rather than `url` and `posted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub date_posted: Option<String>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub status: JobStatus,
    pub applied_on: Option<NaiveDate>,
}

impl CatalogEntry {
    /// A fresh active entry for a newly seen record.
    pub fn from_record(record: &JobRecord, seen_on: NaiveDate) -> Self {
        Self {
            job_id: record.job_id.clone(),
            title: record.title.clone(),
            company: record.company.clone(),
            location: record.location.clone(),
            link: record.url.clone(),
            date_posted: record.posted_at.clone(),
            first_seen: seen_on,
            last_seen: seen_on,
            status: JobStatus::Active,
            applied_on: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active
    }

    /// Case-insensitive keyword match over title, company and location.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.title.to_lowercase().contains(&keyword)
            || self.company.to_lowercase().contains(&keyword)
            || self.location.to_lowercase().contains(&keyword)
    }
}

/// Catalog counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub applied: usize,
    /// Active entries without an application date
    pub not_applied: usize,
}

impl CatalogStats {
    /// Compute counters from a set of entries.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a CatalogEntry>) -> Self {
        let mut stats = Self::default();
        for entry in entries {
            stats.total += 1;
            match entry.status {
                JobStatus::Active => {
                    stats.active += 1;
                    if entry.applied_on.is_none() {
                        stats.not_applied += 1;
                    }
                }
                JobStatus::Expired => stats.expired += 1,
            }
            if entry.applied_on.is_some() {
                stats.applied += 1;
            }
        }
        stats
    }
}

/// Filter for listing catalog entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Only active entries
    #[serde(default)]
    pub active_only: bool,

    /// Only entries last seen on or after this date
    pub seen_since: Option<NaiveDate>,

    /// Keyword over title, company and location
    pub keyword: Option<String>,

    /// Maximum number of entries
    pub limit: Option<usize>,
}

impl EntryFilter {
    /// Match all entries.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match active entries only.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn with_seen_since(mut self, date: NaiveDate) -> Self {
        self.seen_since = Some(date);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether an entry passes the filter (limit excluded).
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if self.active_only && !entry.is_active() {
            return false;
        }
        if let Some(since) = self.seen_since {
            if entry.last_seen < since {
                return false;
            }
        }
        match &self.keyword {
            Some(keyword) => entry.matches_keyword(keyword),
            None => true,
        }
    }
}
