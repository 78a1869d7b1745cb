//! Stockroom Core Library
//!
//! This crate provides the catalog and ingestion domain models, error types and
//! configuration shared by all Stockroom components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, CatalogBackend, Config, IngestServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
