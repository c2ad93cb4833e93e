//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the harvesting
//! library without a real browser or network access.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult, FetchError, FetchResult};
use crate::stores::MemoryCatalog;
use crate::traits::browser::{Browser, BrowserSession};
use crate::traits::catalog::Catalog;
use crate::types::job::{CatalogEntry, CatalogStats, EntryFilter, JobRecord};
use crate::types::page::RenderedPage;

/// A mock browser serving scripted pages.
///
/// Sessions share the browser's state, so pages added after a session
/// was acquired are still served. Unknown URLs fail with a navigation
/// error.
#[derive(Default, Clone)]
pub struct MockBrowser {
    /// Predefined markup by URL
    pages: Arc<RwLock<HashMap<String, String>>>,

    /// Final URL to report for a requested URL
    redirects: Arc<RwLock<HashMap<String, String>>>,

    /// URLs that should time out
    fail_urls: Arc<RwLock<HashSet<String>>>,

    /// Refuse to open a session
    fail_acquire: bool,

    /// Navigation tracking
    navigations: Arc<RwLock<Vec<String>>>,

    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockBrowser {
    /// Create a new mock browser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve markup for a URL.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), html.into());
        self
    }

    /// Serve several pages.
    pub fn with_pages<U, H>(self, pages: impl IntoIterator<Item = (U, H)>) -> Self
    where
        U: Into<String>,
        H: Into<String>,
    {
        let mut store = self.pages.write().unwrap();
        for (url, html) in pages {
            store.insert(url.into(), html.into());
        }
        drop(store);
        self
    }

    /// Report a different final URL for a request (e.g. an auth wall).
    pub fn with_redirect(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.write().unwrap().insert(from.into(), to.into());
        self
    }

    /// Mark a URL as timing out.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().insert(url.into());
        self
    }

    /// Make `acquire` fail.
    pub fn fail_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.read().unwrap().clone()
    }

    pub fn navigation_count(&self) -> usize {
        self.navigations.read().unwrap().len()
    }

    /// Sessions handed out.
    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Sessions given back.
    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Session handed out by [`MockBrowser`].
pub struct MockSession {
    browser: MockBrowser,
}

#[async_trait]
impl Browser for MockBrowser {
    type Session = MockSession;

    async fn acquire(&self) -> FetchResult<MockSession> {
        if self.fail_acquire {
            return Err(FetchError::Session("mock browser refused to launch".into()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            browser: self.clone(),
        })
    }

    async fn release(&self, _session: MockSession) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> FetchResult<RenderedPage> {
        let browser = &self.browser;
        browser.navigations.write().unwrap().push(url.to_string());

        if browser.fail_urls.read().unwrap().contains(url) {
            return Err(FetchError::Timeout {
                url: url.to_string(),
            });
        }

        let html = browser.pages.read().unwrap().get(url).cloned().ok_or_else(|| {
            FetchError::navigation(
                url,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no scripted page"),
            )
        })?;

        let page = RenderedPage::new(url, html);
        Ok(match browser.redirects.read().unwrap().get(url) {
            Some(to) => page.with_final_url(to.clone()),
            None => page,
        })
    }
}

/// Markup for one logged-in style listing card.
pub fn card_html(job_id: &str, title: &str, company: &str, location: &str) -> String {
    format!(
        r#"<li data-occludable-job-id="{id}">
  <div class="job-card-container" data-job-id="{id}">
    <a class="job-card-list__title" href="/jobs/view/{id}/?trk=search" aria-label="{title}">
      <strong>{title}</strong>
      <span class="visually-hidden">{title}</span>
    </a>
    <div class="artdeco-entity-lockup__subtitle"><span>{company}</span></div>
    <span class="job-card-container__metadata-item">{location}</span>
  </div>
</li>"#,
        id = job_id,
        title = title,
        company = company,
        location = location,
    )
}

/// A results page holding the given cards.
pub fn results_page(cards: &[String]) -> String {
    format!(
        r#"<html><body><main>
<ul class="jobs-search__results-list">
{}
</ul>
</main></body></html>"#,
        cards.join("\n")
    )
}

/// A results page whose list holds no cards.
pub fn empty_results_page() -> String {
    results_page(&[])
}

/// A page with no recognizable results list.
pub fn no_container_page() -> String {
    "<html><body><div class=\"unexpected-layout\"><p>Something went wrong</p></div></body></html>"
        .to_string()
}

/// A catalog wrapping [`MemoryCatalog`] with scripted faults.
///
/// `fail_insert` makes inserting one id fail with a storage error.
/// `stale_exists` makes `exists` answer `false` for an id that is stored,
/// as if another writer inserted it after the check.
#[derive(Default)]
pub struct FaultyCatalog {
    inner: MemoryCatalog,
    failing_inserts: HashSet<String>,
    stale_ids: HashSet<String>,
    fail_expire: bool,
}

impl FaultyCatalog {
    pub fn new(inner: MemoryCatalog) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_insert(mut self, job_id: impl Into<String>) -> Self {
        self.failing_inserts.insert(job_id.into());
        self
    }

    pub fn stale_exists(mut self, job_id: impl Into<String>) -> Self {
        self.stale_ids.insert(job_id.into());
        self
    }

    pub fn fail_expire(mut self) -> Self {
        self.fail_expire = true;
        self
    }

    /// The wrapped catalog, for inspecting committed state.
    pub fn inner(&self) -> &MemoryCatalog {
        &self.inner
    }
}

fn injected(operation: &str) -> CatalogError {
    CatalogError::storage(format!("injected {} failure", operation))
}

#[async_trait]
impl Catalog for FaultyCatalog {
    async fn exists(&self, job_id: &str) -> CatalogResult<bool> {
        if self.stale_ids.contains(job_id) {
            return Ok(false);
        }
        self.inner.exists(job_id).await
    }

    async fn insert(&self, record: &JobRecord, seen_on: NaiveDate) -> CatalogResult<bool> {
        if self.failing_inserts.contains(&record.job_id) {
            return Err(injected("insert"));
        }
        self.inner.insert(record, seen_on).await
    }

    async fn touch(&self, job_id: &str, seen_on: NaiveDate) -> CatalogResult<bool> {
        self.inner.touch(job_id, seen_on).await
    }

    async fn mark_expired(&self, job_ids: &[String]) -> CatalogResult<usize> {
        if self.fail_expire {
            return Err(injected("expire"));
        }
        self.inner.mark_expired(job_ids).await
    }

    async fn active_job_ids(&self) -> CatalogResult<HashSet<String>> {
        self.inner.active_job_ids().await
    }

    async fn stats(&self) -> CatalogResult<CatalogStats> {
        self.inner.stats().await
    }

    async fn get(&self, job_id: &str) -> CatalogResult<Option<CatalogEntry>> {
        self.inner.get(job_id).await
    }

    async fn list(&self, filter: &EntryFilter) -> CatalogResult<Vec<CatalogEntry>> {
        self.inner.list(filter).await
    }

    async fn set_applied(
        &self,
        job_id: &str,
        applied_on: Option<NaiveDate>,
    ) -> CatalogResult<bool> {
        self.inner.set_applied(job_id, applied_on).await
    }
}
