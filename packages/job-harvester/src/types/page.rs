//! Rendered pages returned by a browser session.

use chrono::{DateTime, Utc};

/// Markers in the final URL that mean the site bounced us to a login wall.
pub const AUTH_WALL_MARKERS: [&str; 3] = ["/authwall", "/login", "/checkpoint"];

/// A page after navigation and rendering.
///
/// Holds the serialized DOM rather than a parsed tree so it can cross
/// `.await` points; parse it with
/// [`HtmlDocument::parse`](crate::browsers::html::HtmlDocument::parse).
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL that was requested
    pub requested_url: String,

    /// URL after redirects
    pub url: String,

    /// Rendered markup
    pub html: String,

    /// When navigation completed
    pub fetched_at: DateTime<Utc>,
}

impl RenderedPage {
    /// Create a page that was served without redirects.
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            requested_url: url.clone(),
            url,
            html: html.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Record the URL the navigation ended on.
    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Whether navigation ended on a login or security checkpoint.
    pub fn is_auth_wall(&self) -> bool {
        AUTH_WALL_MARKERS.iter().any(|m| self.url.contains(m))
    }

    pub fn content_length(&self) -> usize {
        self.html.len()
    }
}
