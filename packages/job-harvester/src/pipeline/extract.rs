//! Record extraction - turn one listing node into a [`JobRecord`].

use std::fmt;

use crate::pipeline::resolver::{Field, FieldResolver};
use crate::traits::browser::CandidateNode;
use crate::types::job::{JobRecord, UNKNOWN};

/// Title some layouts render for listings that have not loaded yet.
pub const SENTINEL_TITLE: &str = "Unknown Title";

/// Why a node did not produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Neither the id strategies nor the link fallback yielded an id
    MissingId,

    /// No title strategy yielded
    MissingTitle,

    /// The title was the placeholder [`SENTINEL_TITLE`]
    SentinelTitle,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingId => f.write_str("missing id"),
            Rejection::MissingTitle => f.write_str("missing title"),
            Rejection::SentinelTitle => f.write_str("placeholder title"),
        }
    }
}

/// Builds records from listing nodes.
///
/// Id and title are mandatory; company and location degrade to
/// [`UNKNOWN`]. The record URL always comes from the id, never from a
/// scraped href.
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    resolver: FieldResolver,
}

impl RecordExtractor {
    pub fn new(resolver: FieldResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    /// Extract one record. Never mutates the node.
    pub fn extract<N: CandidateNode>(
        &self,
        node: &N,
        source_query: &str,
    ) -> Result<JobRecord, Rejection> {
        let job_id = self
            .resolver
            .resolve(node, Field::Id)
            .or_else(|| self.resolver.resolve(node, Field::Link))
            .ok_or(Rejection::MissingId)?;

        let title = self
            .resolver
            .resolve(node, Field::Title)
            .ok_or(Rejection::MissingTitle)?;
        if title == SENTINEL_TITLE {
            return Err(Rejection::SentinelTitle);
        }

        let company = self
            .resolver
            .resolve(node, Field::Company)
            .unwrap_or_else(|| UNKNOWN.to_string());
        let location = self
            .resolver
            .resolve(node, Field::Location)
            .unwrap_or_else(|| UNKNOWN.to_string());

        let mut record = JobRecord::new(job_id, title, source_query)
            .with_company(company)
            .with_location(location);
        record.posted_at = self.resolver.resolve(node, Field::PostedAt);

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browsers::html::HtmlDocument;
    use crate::pipeline::resolver::Strategy;
    use crate::traits::browser::PageView;

    const QUERY: &str = "https://www.linkedin.com/jobs/search/?keywords=rust";

    fn extract(html: &str, extractor: &RecordExtractor) -> Result<JobRecord, Rejection> {
        let doc = HtmlDocument::from_html(QUERY, html);
        let nodes = doc.find_all("li").unwrap();
        extractor.extract(&nodes[0], QUERY)
    }

    #[test]
    fn test_full_card() {
        let html = r#"<ul><li data-occludable-job-id="3812345678">
            <a class="job-card-list__title" href="/jobs/view/3812345678/?trk=abc" aria-label="Rust Engineer">Rust Engineer</a>
            <div class="artdeco-entity-lockup__subtitle">Acme</div>
            <div class="artdeco-entity-lockup__caption"><ul><li>Remote</li></ul></div>
            <time datetime="2024-05-01">1 week ago</time>
        </li></ul>"#;

        let record = extract(html, &RecordExtractor::default()).unwrap();
        assert_eq!(record.job_id, "3812345678");
        assert_eq!(record.title, "Rust Engineer");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.location, "Remote");
        assert_eq!(record.posted_at.as_deref(), Some("2024-05-01"));
        assert_eq!(record.url, "https://www.linkedin.com/jobs/view/3812345678");
        assert_eq!(record.source_query, QUERY);
        assert!(record.description.is_empty());
    }

    #[test]
    fn test_defaults_for_company_and_location() {
        let html = r#"<ul><li data-job-id="7"><a class="job-card-list__title">Analyst</a></li></ul>"#;
        let record = extract(html, &RecordExtractor::default()).unwrap();
        assert_eq!(record.company, UNKNOWN);
        assert_eq!(record.location, UNKNOWN);
        assert_eq!(record.posted_at, None);
    }

    #[test]
    fn test_link_fallback_for_id() {
        let resolver = FieldResolver::new().with_strategies(Field::Id, Vec::new());
        let html = r#"<ul><li>
            <a class="job-card-container__link" href="/jobs/view/platform-engineer-at-beta-4242/" aria-label="Platform Engineer"></a>
        </li></ul>"#;
        let record = extract(html, &RecordExtractor::new(resolver)).unwrap();
        assert_eq!(record.job_id, "4242");
        assert_eq!(record.url, "https://www.linkedin.com/jobs/view/4242");
    }

    #[test]
    fn test_rejections() {
        let extractor = RecordExtractor::default();

        let no_id = r#"<ul><li><a class="job-card-list__title">Analyst</a></li></ul>"#;
        assert_eq!(extract(no_id, &extractor), Err(Rejection::MissingId));

        let no_title = r#"<ul><li data-job-id="9"><span>nothing</span></li></ul>"#;
        assert_eq!(extract(no_title, &extractor), Err(Rejection::MissingTitle));

        let sentinel =
            r#"<ul><li data-job-id="9"><a class="job-card-list__title">Unknown Title</a></li></ul>"#;
        assert_eq!(extract(sentinel, &extractor), Err(Rejection::SentinelTitle));
    }

    #[test]
    fn test_custom_title_strategies() {
        let resolver = FieldResolver::new()
            .with_strategies(Field::Title, vec![Strategy::text("h2.headline")]);
        let html = r#"<ul><li data-job-id="12"><h2 class="headline">  Staff SRE </h2></li></ul>"#;
        let record = extract(html, &RecordExtractor::new(resolver)).unwrap();
        assert_eq!(record.title, "Staff SRE");
    }
}
