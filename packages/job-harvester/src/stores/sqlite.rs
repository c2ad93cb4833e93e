//! SQLite catalog implementation.
//!
//! The `jobs` table keeps the record shape external readers expect:
//! `job_id, title, company, location, link, date_posted, first_seen,
//! last_seen, status, applied_on`, with dates stored as `YYYY-MM-DD` text.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{CatalogError, CatalogResult};
use crate::traits::catalog::Catalog;
use crate::types::job::{CatalogEntry, CatalogStats, EntryFilter, JobRecord, JobStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Substring pattern matching `keyword` literally.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// SQLite-backed job catalog.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Connect with a sqlx connection URL and create the schema.
    ///
    /// # Example URLs
    /// - `sqlite:jobs.db` - File-based database
    /// - `sqlite:jobs.db?mode=rwc` - Create if not exists
    pub async fn new(database_url: &str) -> CatalogResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(CatalogError::storage)?;
        Self::with_pool(pool).await
    }

    /// Open (or create) a database file.
    pub async fn open(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(CatalogError::storage)?;
        Self::with_pool(pool).await
    }

    /// Create an in-memory catalog (for testing).
    ///
    /// Each in-memory connection is its own database, so the pool holds
    /// exactly one connection that is never recycled.
    pub async fn in_memory() -> CatalogResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(CatalogError::storage)?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> CatalogResult<Self> {
        let catalog = Self { pool };
        catalog.run_migrations().await?;
        Ok(catalog)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> CatalogResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                job_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT NOT NULL,
                link TEXT NOT NULL,
                date_posted TEXT,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                applied_on TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(CatalogError::storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)")
            .execute(&self.pool)
            .await
            .map_err(CatalogError::storage)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    job_id: String,
    title: String,
    company: String,
    location: String,
    link: String,
    date_posted: Option<String>,
    first_seen: String,
    last_seen: String,
    status: String,
    applied_on: Option<String>,
}

impl JobRow {
    fn into_entry(self) -> CatalogResult<CatalogEntry> {
        let job_id = self.job_id;
        let corrupt = |reason: String| CatalogError::Corrupt {
            job_id: job_id.clone(),
            reason,
        };
        let parse = |value: &str| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map_err(|e| corrupt(format!("invalid date {:?}: {}", value, e)))
        };

        let first_seen = parse(&self.first_seen)?;
        let last_seen = parse(&self.last_seen)?;
        let applied_on = match self.applied_on.as_deref() {
            Some(value) if !value.is_empty() => Some(parse(value)?),
            _ => None,
        };
        let status: JobStatus = self.status.parse().map_err(corrupt)?;

        Ok(CatalogEntry {
            job_id,
            title: self.title,
            company: self.company,
            location: self.location,
            link: self.link,
            date_posted: self.date_posted,
            first_seen,
            last_seen,
            status,
            applied_on,
        })
    }
}

const SELECT_JOBS: &str = "SELECT job_id, title, company, location, link, date_posted, \
     first_seen, last_seen, status, applied_on FROM jobs";

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn exists(&self, job_id: &str) -> CatalogResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM jobs WHERE job_id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CatalogError::storage)?;
        Ok(row.is_some())
    }

    async fn insert(&self, record: &JobRecord, seen_on: NaiveDate) -> CatalogResult<bool> {
        let seen = format_date(seen_on);
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (job_id, title, company, location, link, date_posted,
                              first_seen, last_seen, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'active')
            ON CONFLICT(job_id) DO NOTHING
            "#,
        )
        .bind(&record.job_id)
        .bind(&record.title)
        .bind(&record.company)
        .bind(&record.location)
        .bind(&record.url)
        .bind(&record.posted_at)
        .bind(&seen)
        .bind(&seen)
        .execute(&self.pool)
        .await
        .map_err(CatalogError::storage)?;

        Ok(result.rows_affected() == 1)
    }

    async fn touch(&self, job_id: &str, seen_on: NaiveDate) -> CatalogResult<bool> {
        let result =
            sqlx::query("UPDATE jobs SET last_seen = ?, status = 'active' WHERE job_id = ?")
                .bind(format_date(seen_on))
                .bind(job_id)
                .execute(&self.pool)
                .await
                .map_err(CatalogError::storage)?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_expired(&self, job_ids: &[String]) -> CatalogResult<usize> {
        let mut tx = self.pool.begin().await.map_err(CatalogError::storage)?;
        let mut updated = 0;
        for job_id in job_ids {
            let result = sqlx::query("UPDATE jobs SET status = 'expired' WHERE job_id = ?")
                .bind(job_id)
                .execute(&mut *tx)
                .await
                .map_err(CatalogError::storage)?;
            updated += result.rows_affected() as usize;
        }
        tx.commit().await.map_err(CatalogError::storage)?;
        Ok(updated)
    }

    async fn active_job_ids(&self) -> CatalogResult<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT job_id FROM jobs WHERE status = 'active'")
                .fetch_all(&self.pool)
                .await
                .map_err(CatalogError::storage)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn stats(&self) -> CatalogResult<CatalogStats> {
        let (total, active, expired, applied, not_applied): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(status = 'active'), 0),
                    COALESCE(SUM(status = 'expired'), 0),
                    COALESCE(SUM(applied_on IS NOT NULL), 0),
                    COALESCE(SUM(status = 'active' AND applied_on IS NULL), 0)
                FROM jobs
                "#,
            )
            .fetch_one(&self.pool)
            .await
            .map_err(CatalogError::storage)?;

        Ok(CatalogStats {
            total: total as usize,
            active: active as usize,
            expired: expired as usize,
            applied: applied as usize,
            not_applied: not_applied as usize,
        })
    }

    async fn get(&self, job_id: &str) -> CatalogResult<Option<CatalogEntry>> {
        let row = sqlx::query_as::<_, JobRow>(&format!("{} WHERE job_id = ?", SELECT_JOBS))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CatalogError::storage)?;

        row.map(JobRow::into_entry).transpose()
    }

    async fn list(&self, filter: &EntryFilter) -> CatalogResult<Vec<CatalogEntry>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_JOBS);
        query.push(" WHERE 1 = 1");

        if filter.active_only {
            query.push(" AND status = 'active'");
        }
        if let Some(since) = filter.seen_since {
            query.push(" AND last_seen >= ").push_bind(format_date(since));
        }
        if let Some(keyword) = &filter.keyword {
            let pattern = like_pattern(keyword);
            query
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR company LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR location LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        query.push(" ORDER BY last_seen DESC, job_id ASC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = query
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(CatalogError::storage)?;

        rows.into_iter().map(JobRow::into_entry).collect()
    }

    async fn set_applied(
        &self,
        job_id: &str,
        applied_on: Option<NaiveDate>,
    ) -> CatalogResult<bool> {
        let result = sqlx::query("UPDATE jobs SET applied_on = ? WHERE job_id = ?")
            .bind(applied_on.map(format_date))
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(CatalogError::storage)?;
        Ok(result.rows_affected() == 1)
    }
}
