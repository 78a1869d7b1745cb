//! Application state and sub-states.

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::PgPool;
use stockroom_core::Config;
use stockroom_db::{CatalogWriter, SummaryStore};
use stockroom_ingest::IngestPipeline;
use stockroom_storage::Storage;

/// Catalog persistence; `pool` is `None` with the in-memory back end
#[derive(Clone)]
pub struct DbState {
    pub pool: Option<PgPool>,
    pub catalog: Arc<dyn CatalogWriter>,
}

/// Bulk upload pipeline and its HTTP-side limits
#[derive(Clone)]
pub struct IngestState {
    pub pipeline: Arc<IngestPipeline>,
    pub summaries: Arc<dyn SummaryStore>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub is_production: bool,
}

pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub storage: Arc<dyn Storage>,
    pub ingest: IngestState,
    pub security: SecurityConfig,
}
