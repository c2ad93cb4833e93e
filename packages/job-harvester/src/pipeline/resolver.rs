//! Field resolution over prioritized strategy lists.
//!
//! Every field has an ordered list of strategies. The first strategy that
//! matches and yields non-empty normalized text wins; a strategy that
//! fails (e.g. an unparsable selector) counts as a non-match. When no
//! strategy yields, the field is absent and the caller applies its own
//! default.
//!
//! The default lists cover both the logged-in results markup
//! (`job-card-*`, `artdeco-entity-lockup__*`) and the public, logged-out
//! markup (`base-search-card__*`).

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use crate::traits::browser::CandidateNode;

static RE_URN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":jobPosting:(\d+)").unwrap());
static RE_VIEW_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/jobs/view/(?:[^/?#]*?-)?(\d+)(?:[/?#]|$)").unwrap());
static RE_CURRENT_JOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"currentJobId=(\d+)").unwrap());

/// Substrings removed from every resolved value.
pub const DEFAULT_NOISE: &[&str] = &["with verification"];

/// A field the resolver knows how to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Title,
    Company,
    Location,
    PostedAt,
    /// Id recovered from the listing's own link
    Link,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Id,
        Field::Title,
        Field::Company,
        Field::Location,
        Field::PostedAt,
        Field::Link,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Title => "title",
            Field::Company => "company",
            Field::Location => "location",
            Field::PostedAt => "posted_at",
            Field::Link => "link",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a strategy reads its raw value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Inner text of the first descendant matching the selector
    Text(String),

    /// Attribute of the first descendant matching the selector, or of the
    /// node itself when there is no selector
    Attribute {
        selector: Option<String>,
        name: String,
    },
}

/// Post-processing applied to a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Plain,

    /// Digits after `:jobPosting:` in an entity URN
    Urn,

    /// Digits from a `/jobs/view/` path or a `currentJobId` parameter
    UrlId,
}

impl Transform {
    /// Apply the transform to a normalized value.
    pub fn apply(&self, value: &str) -> Option<String> {
        match self {
            Transform::Plain => Some(value.to_string()),
            Transform::Urn => capture(&RE_URN, value),
            Transform::UrlId => {
                capture(&RE_VIEW_PATH, value).or_else(|| capture(&RE_CURRENT_JOB, value))
            }
        }
    }
}

fn capture(re: &Regex, value: &str) -> Option<String> {
    re.captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// One way of reading a field from a listing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub source: Source,
    pub transform: Transform,
}

impl Strategy {
    /// Inner text of a descendant.
    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            source: Source::Text(selector.into()),
            transform: Transform::Plain,
        }
    }

    /// Attribute of a descendant.
    pub fn attr(selector: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: Source::Attribute {
                selector: Some(selector.into()),
                name: name.into(),
            },
            transform: Transform::Plain,
        }
    }

    /// Attribute of the node itself.
    pub fn own_attr(name: impl Into<String>) -> Self {
        Self {
            source: Source::Attribute {
                selector: None,
                name: name.into(),
            },
            transform: Transform::Plain,
        }
    }

    /// Read the job id out of an entity URN.
    pub fn urn(mut self) -> Self {
        self.transform = Transform::Urn;
        self
    }

    /// Read the job id out of a posting URL.
    pub fn url_id(mut self) -> Self {
        self.transform = Transform::UrlId;
        self
    }

    /// Run the strategy against a node.
    ///
    /// `None` covers both "no match" and "matched but empty".
    pub fn apply<N: CandidateNode>(&self, node: &N, noise: &[String]) -> Option<String> {
        let raw = match &self.source {
            Source::Text(selector) => node.text(selector),
            Source::Attribute {
                selector: Some(selector),
                name,
            } => node.attribute(selector, name),
            Source::Attribute {
                selector: None,
                name,
            } => Ok(node.own_attribute(name)),
        };

        let raw = match raw {
            Ok(raw) => raw?,
            Err(e) => {
                debug!("Strategy {} failed: {}", self, e);
                return None;
            }
        };

        let value = normalize(&raw, noise);
        if value.is_empty() {
            return None;
        }
        self.transform.apply(&value)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Text(selector) => write!(f, "text({})", selector)?,
            Source::Attribute {
                selector: Some(selector),
                name,
            } => write!(f, "attr({}, {})", selector, name)?,
            Source::Attribute {
                selector: None,
                name,
            } => write!(f, "own_attr({})", name)?,
        }
        match self.transform {
            Transform::Plain => Ok(()),
            Transform::Urn => f.write_str(".urn"),
            Transform::UrlId => f.write_str(".url_id"),
        }
    }
}

/// Normalize scraped text.
///
/// Trims every line, drops blank lines, collapses consecutive duplicate
/// lines (the visible and screen-reader copies of the same label), joins
/// with single spaces, strips noise substrings and collapses whitespace.
pub fn normalize(raw: &str, noise: &[String]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if lines.last() != Some(&line) {
            lines.push(line);
        }
    }

    let mut joined = lines.join(" ");
    for needle in noise.iter().filter(|n| !n.is_empty()) {
        joined = joined.replace(needle.as_str(), " ");
    }

    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn default_strategies(field: Field) -> Vec<Strategy> {
    match field {
        Field::Id => vec![
            Strategy::own_attr("data-entity-urn").urn(),
            Strategy::attr("[data-entity-urn]", "data-entity-urn").urn(),
            Strategy::own_attr("data-occludable-job-id"),
            Strategy::own_attr("data-job-id"),
            Strategy::attr("[data-job-id]", "data-job-id"),
            Strategy::attr("a[href*='/jobs/view/']", "href").url_id(),
        ],
        Field::Title => vec![
            Strategy::attr("a.job-card-list__title", "aria-label"),
            Strategy::text("a.job-card-list__title"),
            Strategy::attr("a.job-card-container__link", "aria-label"),
            Strategy::text("a.job-card-container__link strong"),
            Strategy::text(".base-search-card__title"),
            Strategy::text(".job-card-list__title"),
        ],
        Field::Company => vec![
            Strategy::text(".artdeco-entity-lockup__subtitle"),
            Strategy::text(".base-search-card__subtitle"),
            Strategy::text(".job-card-container__primary-description"),
            Strategy::text(".job-card-container__company-name"),
            Strategy::text("a[class*='subtitle']"),
        ],
        Field::Location => vec![
            Strategy::text(".artdeco-entity-lockup__caption li"),
            Strategy::text(".job-card-container__metadata-item"),
            Strategy::text(".base-search-card__metadata"),
            Strategy::text("span[class*='metadata']"),
        ],
        Field::PostedAt => vec![
            Strategy::attr("time", "datetime"),
            Strategy::text(".job-card-container__listed-time"),
            Strategy::text("time"),
        ],
        Field::Link => vec![
            Strategy::attr("a.job-card-list__title", "href").url_id(),
            Strategy::attr("a.job-card-container__link", "href").url_id(),
            Strategy::attr("a[href*='/jobs/view/']", "href").url_id(),
            Strategy::attr("a.scaffold-layout__list-link", "href").url_id(),
            Strategy::attr("a.base-card__full-link", "href").url_id(),
        ],
    }
}

/// Resolves fields of listing nodes.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    strategies: HashMap<Field, Vec<Strategy>>,
    noise: Vec<String>,
}

impl FieldResolver {
    /// A resolver with the default strategy lists.
    pub fn new() -> Self {
        Self {
            strategies: Field::ALL
                .iter()
                .map(|f| (*f, default_strategies(*f)))
                .collect(),
            noise: DEFAULT_NOISE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the strategy list for one field.
    pub fn with_strategies(mut self, field: Field, strategies: Vec<Strategy>) -> Self {
        self.strategies.insert(field, strategies);
        self
    }

    /// Add a noise substring.
    pub fn with_noise(mut self, noise: impl Into<String>) -> Self {
        self.noise.push(noise.into());
        self
    }

    /// Strategies tried for a field, in order.
    pub fn strategies(&self, field: Field) -> &[Strategy] {
        self.strategies
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve one field: the first strategy that yields wins.
    pub fn resolve<N: CandidateNode>(&self, node: &N, field: Field) -> Option<String> {
        self.strategies(field)
            .iter()
            .find_map(|strategy| strategy.apply(node, &self.noise))
    }
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new()
    }
}
