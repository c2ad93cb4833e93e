//! Parsed HTML documents backed by the `scraper` crate.

use scraper::{ElementRef, Html, Selector};

use crate::error::{NodeError, NodeResult};
use crate::traits::browser::{CandidateNode, PageView};
use crate::types::page::RenderedPage;

fn parse_selector(selector: &str) -> NodeResult<Selector> {
    Selector::parse(selector).map_err(|e| NodeError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Class of the off-screen copy the site renders for screen readers.
const SCREEN_READER_CLASS: &str = "visually-hidden";

/// Concatenated text of an element, as rendered.
///
/// Text inside a screen-reader-only descendant is skipped; it repeats the
/// visible text.
fn element_text(element: &ElementRef<'_>) -> String {
    let root = element.id();
    let mut text = String::new();
    for node in element.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root)
            .filter_map(ElementRef::wrap)
            .any(|ancestor| {
                ancestor
                    .value()
                    .classes()
                    .any(|class| class == SCREEN_READER_CLASS)
            });
        if !hidden {
            text.push_str(fragment);
        }
    }
    text
}

/// A parsed page.
///
/// Not `Send`: parse, inspect and drop it without awaiting in between.
pub struct HtmlDocument {
    url: String,
    document: Html,
}

impl HtmlDocument {
    /// Parse a rendered page.
    pub fn parse(page: &RenderedPage) -> Self {
        Self::from_html(&page.url, &page.html)
    }

    /// Parse raw markup.
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(html),
        }
    }
}

impl PageView for HtmlDocument {
    type Node<'a> = HtmlNode<'a>;

    fn url(&self) -> &str {
        &self.url
    }

    fn find_all(&self, selector: &str) -> NodeResult<Vec<HtmlNode<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .document
            .select(&selector)
            .map(|element| HtmlNode { element })
            .collect())
    }

    fn body_text(&self) -> String {
        match parse_selector("body")
            .ok()
            .and_then(|s| self.document.select(&s).next())
        {
            Some(body) => element_text(&body),
            None => self.document.root_element().text().collect(),
        }
    }
}

/// One element of a parsed page.
#[derive(Clone, Copy)]
pub struct HtmlNode<'a> {
    element: ElementRef<'a>,
}

impl<'a> HtmlNode<'a> {
    fn first(&self, selector: &str) -> NodeResult<Option<ElementRef<'a>>> {
        let selector = parse_selector(selector)?;
        Ok(self.element.select(&selector).next())
    }
}

impl CandidateNode for HtmlNode<'_> {
    fn text(&self, selector: &str) -> NodeResult<Option<String>> {
        Ok(self.first(selector)?.map(|e| element_text(&e)))
    }

    fn attribute(&self, selector: &str, name: &str) -> NodeResult<Option<String>> {
        Ok(self
            .first(selector)?
            .and_then(|e| e.value().attr(name).map(str::to_string)))
    }

    fn own_attribute(&self, name: &str) -> Option<String> {
        self.element.value().attr(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
        <ul class="jobs-search__results-list">
          <li data-occludable-job-id="101">
            <a class="job-card-list__title" href="/jobs/view/101/" aria-label="Data Scientist">
              <strong>Data Scientist</strong>
            </a>
            <time datetime="2024-05-01">2 weeks ago</time>
          </li>
        </ul>
    "#;

    #[test]
    fn test_find_all_and_node_lookups() {
        let doc = HtmlDocument::from_html("https://example.com", CARD);
        let cards = doc.find_all("li[data-occludable-job-id]").unwrap();
        assert_eq!(cards.len(), 1);

        let card = &cards[0];
        assert_eq!(card.own_attribute("data-occludable-job-id").as_deref(), Some("101"));
        assert_eq!(
            card.attribute("time", "datetime").unwrap().as_deref(),
            Some("2024-05-01")
        );
        assert_eq!(
            card.text("a.job-card-list__title").unwrap().map(|t| t.trim().to_string()),
            Some("Data Scientist".to_string())
        );
        assert_eq!(card.text(".missing").unwrap(), None);
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let doc = HtmlDocument::from_html("https://example.com", CARD);
        assert!(matches!(
            doc.find_all("li[["),
            Err(NodeError::InvalidSelector { .. })
        ));

        let cards = doc.find_all("li").unwrap();
        assert!(cards[0].text("a:::").is_err());
    }

    #[test]
    fn test_body_text() {
        let doc = HtmlDocument::from_html(
            "https://example.com",
            "<html><body><p>No matching jobs found.</p></body></html>",
        );
        assert!(doc.body_text().contains("No matching jobs found"));
        assert!(doc.exists("p").unwrap());
        assert!(!doc.exists("ul").unwrap());
    }

    #[test]
    fn test_inline_markup_is_not_split() {
        let doc = HtmlDocument::from_html(
            "https://example.com",
            r#"<ul><li>
                <h3 class="title">C<sup>++</sup> Developer</h3>
                <a class="link"><strong>Rust Engineer</strong><span class="visually-hidden">Rust Engineer</span></a>
            </li></ul>"#,
        );
        let cards = doc.find_all("li").unwrap();
        assert_eq!(cards[0].text(".title").unwrap().as_deref(), Some("C++ Developer"));
        assert_eq!(cards[0].text(".link").unwrap().as_deref(), Some("Rust Engineer"));
    }
}
