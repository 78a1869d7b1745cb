//! Stockroom bulk catalog ingestion
//!
//! Turns one uploaded ZIP, CSV or spreadsheet into catalog items. Each row is
//! validated, deduplicated, has its image uploaded, and is persisted; a bad row
//! becomes an entry in the job's [`IngestSummary`](stockroom_core::models::IngestSummary)
//! and never aborts the batch. Only unreadable or unsupported files fail a job.
//!
//! The stages, leaves first:
//!
//! - [`tabular`]: CSV / spreadsheet rows as [`RawRow`](stockroom_core::models::RawRow)
//! - [`archive`]: ZIP extraction and the single embedded table
//! - [`validator`]: row normalization and field checks
//! - [`duplicate`]: per-owner SKU uniqueness
//! - [`assets`]: image lookup and upload, with [`ssrf`] checks on remote URLs
//! - [`ledger`]: per-row outcomes
//! - [`pipeline`]: the orchestrator

pub mod archive;
pub mod assets;
pub mod duplicate;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod ssrf;
pub mod tabular;
pub mod template;
pub mod validator;
pub mod workspace;

pub use assets::{AssetUploader, ImageMode, StorageAssetUploader};
pub use error::{AssetError, IngestError};
pub use ledger::{ResultLedger, RowOutcome};
pub use pipeline::{IngestPipeline, PipelineConfig, UploadJob};
pub use template::CATALOG_TEMPLATE_CSV;
