//! Storage setup and initialization

use anyhow::Result;
use std::sync::Arc;
use stockroom_core::Config;
use stockroom_storage::{create_storage, Storage};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing asset storage...");
    let storage = create_storage(config).await?;
    tracing::info!(
        backend = %storage.backend_type(),
        "Asset storage initialized successfully"
    );
    Ok(storage)
}
