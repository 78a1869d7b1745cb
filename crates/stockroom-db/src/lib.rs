//! Stockroom persistence layer
//!
//! Catalog persistence and the per-owner bulk upload summary store.

pub mod db;

pub use db::*;
