//! Browser collaborator traits.
//!
//! Navigation is async and session-scoped; inspecting a rendered page is
//! synchronous and happens on a parsed document that never crosses an
//! `.await`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{FetchResult, NodeResult};
use crate::types::page::RenderedPage;

/// Hands out browser sessions.
///
/// The orchestrator acquires exactly one session per run and releases it
/// when the run ends, whatever the outcome.
#[async_trait]
pub trait Browser: Send + Sync {
    type Session: BrowserSession;

    /// Open a session (launch, restore cookies, log in, ...).
    async fn acquire(&self) -> FetchResult<Self::Session>;

    /// Close a session. Must not fail.
    async fn release(&self, session: Self::Session);
}

/// One stateful browsing context (a single tab).
///
/// Not safe for concurrent navigation: callers navigate sequentially.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to a URL and return the rendered page.
    async fn navigate(&self, url: &str, timeout: Duration) -> FetchResult<RenderedPage>;
}

/// A parsed page that candidate nodes can be selected from.
pub trait PageView {
    type Node<'a>: CandidateNode
    where
        Self: 'a;

    /// URL the page was served from.
    fn url(&self) -> &str;

    /// All elements matching a selector, in document order.
    fn find_all(&self, selector: &str) -> NodeResult<Vec<Self::Node<'_>>>;

    /// Whether any element matches a selector.
    fn exists(&self, selector: &str) -> NodeResult<bool> {
        Ok(!self.find_all(selector)?.is_empty())
    }

    /// Visible text of the whole document.
    fn body_text(&self) -> String;
}

/// One listing's sub-tree.
pub trait CandidateNode {
    /// Raw text of the first descendant matching `selector`.
    fn text(&self, selector: &str) -> NodeResult<Option<String>>;

    /// Attribute of the first descendant matching `selector`.
    fn attribute(&self, selector: &str, name: &str) -> NodeResult<Option<String>>;

    /// Attribute of the node itself.
    fn own_attribute(&self, name: &str) -> Option<String>;
}
