//! Data types for harvesting and reconciliation.

pub mod batch;
pub mod config;
pub mod job;
pub mod page;
pub mod report;
