//! Repositories for the data access layer
//!
//! Each seam is a trait with a Postgres implementation and an in-memory one. The
//! in-memory implementations back tests and `CATALOG_BACKEND=memory` deployments.

pub mod catalog;
pub mod summary;

pub use catalog::{CatalogRepository, CatalogWriter, InMemoryCatalogRepository};
pub use summary::{InMemorySummaryStore, SummaryStore};
