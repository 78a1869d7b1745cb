//! Data models for the application
//!
//! `catalog` holds the persisted catalog entities, `ingest` the shapes that flow
//! through a bulk upload job.

mod catalog;
mod ingest;

pub use catalog::*;
pub use ingest::*;
