//! Service initialization and application state setup

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use stockroom_core::Config;
use stockroom_db::{
    CatalogRepository, CatalogWriter, InMemoryCatalogRepository, InMemorySummaryStore,
    SummaryStore,
};
use stockroom_ingest::{IngestPipeline, PipelineConfig, StorageAssetUploader};
use stockroom_storage::Storage;

use crate::state::{AppState, DbState, IngestState, SecurityConfig};

/// Build repositories, the asset uploader and the ingest pipeline
pub async fn initialize_services(
    config: &Config,
    pool: Option<PgPool>,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let catalog: Arc<dyn CatalogWriter> = match &pool {
        Some(pool) => Arc::new(CatalogRepository::new(pool.clone())),
        None => Arc::new(InMemoryCatalogRepository::new()),
    };
    let summaries: Arc<dyn SummaryStore> = Arc::new(InMemorySummaryStore::new());

    let uploader = StorageAssetUploader::new(
        storage.clone(),
        Duration::from_secs(config.asset_upload_timeout_secs()),
        config.remote_image_max_size_bytes(),
    )?;

    tokio::fs::create_dir_all(config.upload_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_dir().display()
            )
        })?;

    let pipeline = IngestPipeline::new(
        catalog.clone(),
        Arc::new(uploader),
        summaries.clone(),
        PipelineConfig::from_config(config),
    );

    tracing::info!(
        upload_dir = %config.upload_dir().display(),
        max_upload_mb = config.bulk_upload_max_size_bytes() / 1024 / 1024,
        asset_upload_timeout_secs = config.asset_upload_timeout_secs(),
        "Bulk upload pipeline ready"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        db: DbState { pool, catalog },
        storage,
        ingest: IngestState {
            pipeline: Arc::new(pipeline),
            summaries,
            upload_dir: config.upload_dir().clone(),
            max_upload_bytes: config.bulk_upload_max_size_bytes(),
        },
        security: SecurityConfig {
            jwt_secret: config.jwt_secret().to_string(),
            is_production: config.is_production(),
        },
    }))
}
