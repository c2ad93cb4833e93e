//! Collaborator trait abstractions.
//!
//! These traits define the interfaces that applications implement
//! to provide browsing and catalog storage.

pub mod browser;
pub mod catalog;
