//! Browser implementations.
//!
//! - `HtmlDocument` / `HtmlNode` - parsed pages over the `scraper` crate
//! - `HttpBrowser` - cookie-holding HTTP sessions over `reqwest`

pub mod html;
pub mod http;

pub use html::{HtmlDocument, HtmlNode};
pub use http::{HttpBrowser, HttpSession};
