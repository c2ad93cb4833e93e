//! Harvest pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Field resolution over prioritized strategy lists
//! - Record extraction with id/title rejection
//! - Page harvesting (container location, anomaly flags)
//! - Pagination with fixed pacing
//! - Multi-query orchestration over one browser session
//! - Reconciliation against the catalog (insert, touch, expire)

pub mod extract;
pub mod harvest;
pub mod orchestrate;
pub mod pacing;
pub mod paginate;
pub mod reconcile;
pub mod resolver;
pub mod run;

pub use extract::{RecordExtractor, Rejection, SENTINEL_TITLE};
pub use harvest::{diagnose, ContainerStrategies, MissingContainer, PageHarvester};
pub use orchestrate::{Orchestrator, ScrapeRun};
pub use pacing::Pacer;
pub use paginate::{page_url, Paginator};
pub use reconcile::{ActiveSnapshot, Reconciler};
pub use resolver::{normalize, Field, FieldResolver, Source, Strategy, Transform};
pub use run::{run_harvest, run_harvest_with};
