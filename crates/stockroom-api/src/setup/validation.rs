//! Startup checks on top of `Config::validate`

use anyhow::Result;
use stockroom_core::{CatalogBackend, Config};

/// Validate settings that are only unsafe in combination or in production
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if is_production && config.catalog_backend() == CatalogBackend::Memory {
        tracing::warn!("In-memory catalog selected in production - items are lost on restart");
    }

    if config.catalog_backend() == CatalogBackend::Postgres {
        if config.db_max_connections() == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }
        if config.db_timeout_seconds() == 0 {
            return Err(anyhow::anyhow!("Database timeout cannot be 0"));
        }
    }

    if config.remote_image_max_size_bytes() == 0 {
        return Err(anyhow::anyhow!("Remote image size limit cannot be 0"));
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
