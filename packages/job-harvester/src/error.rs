//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! A rejected listing is not an error: see
//! [`Rejection`](crate::pipeline::extract::Rejection).

use thiserror::Error;

/// Errors that abort a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The browser session could not be acquired
    #[error("browser session failed: {0}")]
    Fetch(#[from] FetchError),

    /// A catalog mutation failed during reconciliation.
    ///
    /// Mutations committed before the failure are kept.
    #[error("reconciliation failed: {0}")]
    Reconciliation(#[from] CatalogError),

    /// The run configuration is unusable
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Transient failures while navigating to one page.
///
/// A fetch error stops the pagination loop of the current query only;
/// records gathered so far are kept.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Navigation did not complete within the timeout
    #[error("timeout loading: {url}")]
    Timeout { url: String },

    /// Navigation failed (connection, TLS, redirect loop, ...)
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The site answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The session itself is unusable
    #[error("session error: {0}")]
    Session(String),
}

impl FetchError {
    /// Wrap an arbitrary navigation failure.
    pub fn navigation(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Navigation {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Errors raised by a candidate node lookup.
///
/// The field resolver treats these exactly like a non-match.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Selector could not be parsed
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Errors from the catalog collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Storage backend failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A stored row could not be decoded
    #[error("corrupt catalog entry {job_id}: {reason}")]
    Corrupt { job_id: String, reason: String },
}

impl CatalogError {
    /// Wrap a backend error.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No search configured
    #[error("config must contain at least one search")]
    NoSearches,

    /// A search item is neither a keyword query nor an http(s) URL
    #[error("invalid search: {0}")]
    InvalidSearch(String),

    /// A scrape setting is out of range
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Config file could not be read
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for harvest operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for navigation.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for node lookups.
pub type NodeResult<T> = std::result::Result<T, NodeError>;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
