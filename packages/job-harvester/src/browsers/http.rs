//! HTTP browser backed by `reqwest`.
//!
//! Serves the server-rendered results pages. Each session owns one client
//! with its own cookie jar, so a session cookie set at acquisition (or by
//! the site) is replayed on every navigation of that session.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::browser::{Browser, BrowserSession};
use crate::types::config::{ScrapeSettings, DEFAULT_USER_AGENT};
use crate::types::page::RenderedPage;

/// Origin cookies are scoped to.
const SITE_ROOT: &str = "https://www.linkedin.com/";

/// Opens cookie-holding HTTP sessions.
///
/// # Example
///
/// ```rust,ignore
/// use job_harvester::browsers::HttpBrowser;
///
/// let browser = HttpBrowser::new().with_cookie("li_at=...; Domain=.linkedin.com");
/// let report = run_harvest(&config, browser, &catalog).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    user_agent: String,
    cookies: Vec<String>,
    connect_timeout: Duration,
}

impl Default for HttpBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpBrowser {
    /// Create a browser with the default desktop user agent.
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookies: Vec::new(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Create a browser using the configured user agent.
    pub fn from_settings(settings: &ScrapeSettings) -> Self {
        Self::new().with_user_agent(settings.user_agent.clone())
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a cookie (in `Set-Cookie` syntax) to every new session.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.push(cookie.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers
    }
}

/// One cookie-holding HTTP client.
pub struct HttpSession {
    client: reqwest::Client,
}

#[async_trait]
impl Browser for HttpBrowser {
    type Session = HttpSession;

    async fn acquire(&self) -> FetchResult<HttpSession> {
        let jar = Arc::new(Jar::default());
        if !self.cookies.is_empty() {
            let origin = Url::parse(SITE_ROOT)
                .map_err(|e| FetchError::Session(format!("invalid cookie origin: {}", e)))?;
            for cookie in &self.cookies {
                jar.add_cookie_str(cookie, &origin);
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(Self::default_headers())
            .cookie_provider(jar)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| FetchError::Session(format!("cannot build HTTP client: {}", e)))?;

        info!(
            cookies = self.cookies.len(),
            "Opened HTTP browsing session"
        );
        Ok(HttpSession { client })
    }

    async fn release(&self, _session: HttpSession) {
        debug!("Closed HTTP browsing session");
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::navigation(url, err)
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> FetchResult<RenderedPage> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                classify(url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await.map_err(|e| classify(url, e))?;

        let page = RenderedPage::new(url, html).with_final_url(final_url);
        if page.is_auth_wall() {
            warn!(url = %url, final_url = %page.url, "Redirected to a sign-in wall");
        }
        debug!(url = %url, bytes = page.content_length(), "HTTP fetch finished");
        Ok(page)
    }
}
