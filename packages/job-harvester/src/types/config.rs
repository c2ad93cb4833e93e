//! Run configuration: search queries and scrape settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Search page that keyword queries are built against.
pub const SEARCH_BASE: &str = "https://www.linkedin.com/jobs/search/";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One configured search.
///
/// Either a keyword/location pair or a raw search URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchQuery {
    Keywords { keywords: String, location: String },
    Url(String),
}

impl SearchQuery {
    /// Create a keyword query.
    pub fn keywords(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Keywords {
            keywords: keywords.into(),
            location: location.into(),
        }
    }

    /// Create a raw URL query.
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Resolve to the search URL.
    pub fn to_url(&self) -> ConfigResult<String> {
        match self {
            SearchQuery::Keywords { keywords, location } => {
                if keywords.trim().is_empty() {
                    return Err(ConfigError::InvalidSearch(
                        "keywords must not be empty".to_string(),
                    ));
                }
                Ok(format!(
                    "{}?keywords={}&location={}",
                    SEARCH_BASE,
                    form_encode(keywords),
                    form_encode(location)
                ))
            }
            SearchQuery::Url(url) => {
                if !url.starts_with("http") {
                    return Err(ConfigError::InvalidSearch(format!("invalid URL: {}", url)));
                }
                url::Url::parse(url)
                    .map_err(|e| ConfigError::InvalidSearch(format!("{}: {}", url, e)))?;
                Ok(url.clone())
            }
        }
    }

    /// Human-readable label for logs and reports.
    pub fn label(&self) -> String {
        match self {
            SearchQuery::Keywords { keywords, location } => format!("{} in {}", keywords, location),
            SearchQuery::Url(url) => url.clone(),
        }
    }
}

fn form_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Tunables for browsing and pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    /// Safety ceiling on pages per query
    pub max_pages: usize,

    /// Offset step between result pages
    pub page_increment: usize,

    /// Navigation timeout in milliseconds
    pub page_load_timeout_ms: u64,

    /// Lazy-load scroll attempts (for scrolling browser drivers)
    pub max_scroll_attempts: u32,

    /// Delay between scrolls in milliseconds
    pub scroll_delay_ms: u64,

    /// Delay between page fetches of one query in milliseconds
    pub page_delay_ms: u64,

    /// Delay between queries in milliseconds
    pub query_delay_ms: u64,

    /// Run the browser without a window (for driving browsers)
    pub headless: bool,

    /// User agent presented to the site
    pub user_agent: String,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_increment: 25,
            page_load_timeout_ms: 30_000,
            max_scroll_attempts: 5,
            scroll_delay_ms: 2_000,
            page_delay_ms: 2_000,
            query_delay_ms: 3_000,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScrapeSettings {
    /// Settings with all pacing delays disabled (tests, replay).
    pub fn unpaced() -> Self {
        Self {
            scroll_delay_ms: 0,
            page_delay_ms: 0,
            query_delay_ms: 0,
            ..Default::default()
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_increment(mut self, increment: usize) -> Self {
        self.page_increment = increment;
        self
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn query_delay(&self) -> Duration {
        Duration::from_millis(self.query_delay_ms)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    /// Reject settings that would make pagination meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.page_increment == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "page_increment",
                reason: "must be at least 1".to_string(),
            });
        }
        if (self.max_pages - 1).checked_mul(self.page_increment).is_none() {
            return Err(ConfigError::InvalidSetting {
                name: "page_increment",
                reason: format!("offset of page {} overflows", self.max_pages),
            });
        }
        if self.page_load_timeout_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "page_load_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Searches to run, in order
    #[serde(default)]
    pub searches: Vec<SearchQuery>,

    /// Browsing and pagination settings
    #[serde(default)]
    pub scrape_settings: ScrapeSettings,
}

impl RunConfig {
    /// Create a config for a list of searches with default settings.
    pub fn new(searches: impl IntoIterator<Item = SearchQuery>) -> Self {
        Self {
            searches: searches.into_iter().collect(),
            scrape_settings: ScrapeSettings::default(),
        }
    }

    /// Replace the scrape settings.
    pub fn with_settings(mut self, settings: ScrapeSettings) -> Self {
        self.scrape_settings = settings;
        self
    }

    /// Parse a JSON config document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Validate searches and settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.searches.is_empty() {
            return Err(ConfigError::NoSearches);
        }
        for search in &self.searches {
            search.to_url()?;
        }
        self.scrape_settings.validate()
    }

    /// Resolve every search to its URL, in configured order.
    pub fn query_urls(&self) -> ConfigResult<Vec<String>> {
        self.searches.iter().map(SearchQuery::to_url).collect()
    }
}
