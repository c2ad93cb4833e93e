//! Page harvesting - locate listing nodes and extract a record from each.

use tracing::{debug, info, warn};

use crate::browsers::html::HtmlDocument;
use crate::pipeline::extract::RecordExtractor;
use crate::traits::browser::PageView;
use crate::types::page::{RenderedPage, AUTH_WALL_MARKERS};
use crate::types::report::{HarvestStatus, PageHarvest};

/// Selectors for listing nodes and for the list that holds them.
#[derive(Debug, Clone)]
pub struct ContainerStrategies {
    /// Result-list containers, used to tell an empty list from a missing one
    pub lists: Vec<String>,

    /// Listing cards, tried in order; the first that yields any node wins
    pub cards: Vec<String>,
}

impl ContainerStrategies {
    pub fn new(lists: Vec<String>, cards: Vec<String>) -> Self {
        Self { lists, cards }
    }
}

impl Default for ContainerStrategies {
    fn default() -> Self {
        let lists = [
            ".jobs-search__results-list",
            ".scaffold-layout__list-container",
            "ul.jobs-search-results__list",
            ".jobs-search-results-list",
            "[data-test-component='jobs-search-results-list']",
        ];
        let cards = [
            ".jobs-search__results-list > li",
            "li[data-occludable-job-id]",
            ".scaffold-layout__list-container > li",
            "li.jobs-search-results__list-item",
            "li[class*='jobs-search-results__list-item']",
            "li.scaffold-layout__list-item",
            ".job-card-container",
            "[data-job-id]",
        ];
        Self {
            lists: lists.iter().map(|s| s.to_string()).collect(),
            cards: cards.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What a page without any listing container most likely is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingContainer {
    AuthWall,
    NoMatchingJobs,
    UnknownLayout,
}

/// Harvests listing records from rendered pages.
#[derive(Debug, Clone, Default)]
pub struct PageHarvester {
    containers: ContainerStrategies,
    extractor: RecordExtractor,
}

impl PageHarvester {
    pub fn new(containers: ContainerStrategies, extractor: RecordExtractor) -> Self {
        Self {
            containers,
            extractor,
        }
    }

    pub fn with_containers(mut self, containers: ContainerStrategies) -> Self {
        self.containers = containers;
        self
    }

    pub fn with_extractor(mut self, extractor: RecordExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Parse a rendered page and harvest it in one synchronous step.
    pub fn harvest_rendered(&self, page: &RenderedPage, source_query: &str) -> PageHarvest {
        let document = HtmlDocument::parse(page);
        self.harvest(&document, source_query)
    }

    /// Harvest a parsed page.
    ///
    /// Rejected nodes are counted, never fatal. An empty result is either
    /// [`HarvestStatus::Empty`] (the list exists) or
    /// [`HarvestStatus::NoContainer`] (nothing recognizable on the page).
    pub fn harvest<P: PageView>(&self, page: &P, source_query: &str) -> PageHarvest {
        let Some(nodes) = self.find_cards(page) else {
            if self.any_list(page) {
                debug!("Result list on {} is empty", page.url());
                return PageHarvest::empty();
            }
            let diagnosis = diagnose(page);
            warn!(
                "No listing container on {} ({:?})",
                page.url(),
                diagnosis
            );
            return PageHarvest::no_container();
        };

        let candidates = nodes.len();
        let mut records = Vec::with_capacity(candidates);
        for (index, node) in nodes.iter().enumerate() {
            match self.extractor.extract(node, source_query) {
                Ok(record) => records.push(record),
                Err(rejection) => debug!("Rejected card {} on {}: {}", index, page.url(), rejection),
            }
        }

        let harvest = PageHarvest::from_candidates(records, candidates);
        if harvest.status == HarvestStatus::AllRejected {
            warn!(
                "All {} cards rejected on {}; the card markup may have changed",
                candidates,
                page.url()
            );
        } else {
            info!(
                "Harvested {} of {} cards from {}",
                harvest.records.len(),
                candidates,
                page.url()
            );
        }
        harvest
    }

    fn find_cards<'p, P: PageView>(&self, page: &'p P) -> Option<Vec<P::Node<'p>>> {
        self.containers.cards.iter().find_map(|selector| {
            match page.find_all(selector) {
                Ok(nodes) if !nodes.is_empty() => {
                    debug!("Card selector {} matched {} nodes", selector, nodes.len());
                    Some(nodes)
                }
                Ok(_) => None,
                Err(e) => {
                    debug!("Card selector failed: {}", e);
                    None
                }
            }
        })
    }

    fn any_list<P: PageView>(&self, page: &P) -> bool {
        self.containers
            .lists
            .iter()
            .any(|selector| page.exists(selector).unwrap_or(false))
    }
}

/// Guess why a page has no listing container.
pub fn diagnose<P: PageView>(page: &P) -> MissingContainer {
    let url = page.url();
    if AUTH_WALL_MARKERS.iter().any(|m| url.contains(m)) {
        return MissingContainer::AuthWall;
    }

    let body = page.body_text().to_lowercase();
    if body.contains("no matching jobs") {
        MissingContainer::NoMatchingJobs
    } else if body.contains("sign in") || body.contains("join now") {
        MissingContainer::AuthWall
    } else {
        MissingContainer::UnknownLayout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::resolver::FieldResolver;
    use crate::testing::{card_html, empty_results_page, no_container_page, results_page};

    const QUERY: &str = "https://www.linkedin.com/jobs/search/?keywords=rust";

    fn page(html: String) -> RenderedPage {
        RenderedPage::new(QUERY, html)
    }

    #[test]
    fn test_harvests_every_card() {
        let html = results_page(&[
            card_html("1", "Rust Engineer", "Acme", "Remote"),
            card_html("2", "Data Scientist", "Beta", "Berlin"),
        ]);
        let harvest = PageHarvester::default().harvest_rendered(&page(html), QUERY);

        assert_eq!(harvest.status, HarvestStatus::Harvested);
        assert_eq!(harvest.candidates, 2);
        assert_eq!(harvest.rejected, 0);
        let ids: Vec<_> = harvest.records.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_custom_extractor() {
        let resolver = FieldResolver::new().with_noise("(Hiring)");
        let harvester =
            PageHarvester::default().with_extractor(RecordExtractor::new(resolver));
        let html = results_page(&[card_html("1", "Rust Engineer", "Acme (Hiring)", "Remote")]);

        let harvest = harvester.harvest_rendered(&page(html), QUERY);

        assert_eq!(harvest.records[0].company, "Acme");
    }

    #[test]
    fn test_rejections_do_not_abort_page() {
        let html = results_page(&[
            card_html("1", "Rust Engineer", "Acme", "Remote"),
            card_html("2", "Unknown Title", "Beta", "Berlin"),
        ]);
        let harvest = PageHarvester::default().harvest_rendered(&page(html), QUERY);

        assert_eq!(harvest.status, HarvestStatus::Harvested);
        assert_eq!(harvest.records.len(), 1);
        assert_eq!(harvest.rejected, 1);
        assert!(!harvest.is_anomaly());
    }

    #[test]
    fn test_all_rejected_is_anomaly() {
        let html = results_page(&[card_html("1", "Unknown Title", "Acme", "Remote")]);
        let harvest = PageHarvester::default().harvest_rendered(&page(html), QUERY);

        assert_eq!(harvest.status, HarvestStatus::AllRejected);
        assert!(harvest.is_anomaly());
        assert!(harvest.is_end_of_results());
    }

    #[test]
    fn test_empty_list_vs_missing_container() {
        let harvester = PageHarvester::default();

        let empty = harvester.harvest_rendered(&page(empty_results_page()), QUERY);
        assert_eq!(empty.status, HarvestStatus::Empty);
        assert!(empty.records.is_empty());
        assert!(!empty.is_anomaly());

        let missing = harvester.harvest_rendered(&page(no_container_page()), QUERY);
        assert_eq!(missing.status, HarvestStatus::NoContainer);
        assert!(missing.records.is_empty());
        assert!(missing.is_anomaly());
    }

    #[test]
    fn test_invalid_card_selector_falls_through() {
        let containers = ContainerStrategies::new(
            vec![".jobs-search__results-list".to_string()],
            vec!["li[[".to_string(), "li[data-occludable-job-id]".to_string()],
        );
        let html = results_page(&[card_html("5", "SRE", "Acme", "Remote")]);
        let harvest = PageHarvester::default()
            .with_containers(containers)
            .harvest_rendered(&page(html), QUERY);
        assert_eq!(harvest.records.len(), 1);
    }

    #[test]
    fn test_diagnose() {
        let auth = HtmlDocument::from_html(
            "https://www.linkedin.com/authwall?trk=x",
            "<html><body></body></html>",
        );
        assert_eq!(diagnose(&auth), MissingContainer::AuthWall);

        let none = HtmlDocument::from_html(
            QUERY,
            "<html><body><h1>No matching jobs found.</h1></body></html>",
        );
        assert_eq!(diagnose(&none), MissingContainer::NoMatchingJobs);

        let odd = HtmlDocument::from_html(QUERY, "<html><body><div>?</div></body></html>");
        assert_eq!(diagnose(&odd), MissingContainer::UnknownLayout);
    }
}
