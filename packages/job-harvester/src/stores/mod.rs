//! Catalog implementations.
//!
//! Available backends:
//! - `MemoryCatalog` - In-memory catalog (always available)
//! - `SqliteCatalog` - SQLite file-based catalog (requires `sqlite` feature)

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryCatalog;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCatalog;
