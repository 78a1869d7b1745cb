//! Configuration module
//!
//! Configuration for the Stockroom API and the bulk ingestion pipeline, loaded from
//! the environment (and an optional `.env` file).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Where catalog items are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Postgres,
    Memory,
}

impl FromStr for CatalogBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(CatalogBackend::Postgres),
            "memory" => Ok(CatalogBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid catalog backend: {}", s)),
        }
    }
}

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
}

/// Ingestion service configuration
#[derive(Clone, Debug)]
pub struct IngestServiceConfig {
    pub base: BaseConfig,
    pub catalog_backend: CatalogBackend,
    pub database_url: Option<String>,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Bulk upload configuration
    pub bulk_upload_max_size_bytes: usize,
    pub upload_dir: PathBuf,
    pub asset_upload_timeout_secs: u64,
    pub remote_image_max_size_bytes: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestServiceConfig>);

impl Config {
    fn as_ingest(&self) -> &IngestServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_ingest().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ingest().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_ingest().base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_ingest().base.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_ingest().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_ingest().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_ingest().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_ingest().base.db_timeout_seconds
    }

    pub fn catalog_backend(&self) -> CatalogBackend {
        self.as_ingest().catalog_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_ingest().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_ingest().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_ingest().s3_bucket.as_deref()
    }

    /// S3 region, falling back to `AWS_REGION`
    pub fn s3_region(&self) -> Option<&str> {
        self.as_ingest()
            .s3_region
            .as_deref()
            .or(self.as_ingest().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_ingest().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_ingest().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_ingest().local_storage_base_url.as_deref()
    }

    pub fn bulk_upload_max_size_bytes(&self) -> usize {
        self.as_ingest().bulk_upload_max_size_bytes
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.as_ingest().upload_dir
    }

    pub fn asset_upload_timeout_secs(&self) -> u64 {
        self.as_ingest().asset_upload_timeout_secs
    }

    pub fn remote_image_max_size_bytes(&self) -> usize {
        self.as_ingest().remote_image_max_size_bytes
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl IngestServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const BULK_UPLOAD_MAX_SIZE_MB: usize = 50;
        const ASSET_UPLOAD_TIMEOUT_SECS: u64 = 30;
        const REMOTE_IMAGE_MAX_SIZE_MB: usize = 10;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
        };

        let catalog_backend = env::var("CATALOG_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<CatalogBackend>()?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?;

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("stockroom-uploads"));

        let config = IngestServiceConfig {
            base,
            catalog_backend,
            database_url: env::var("DATABASE_URL").ok(),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            bulk_upload_max_size_bytes: env::var("BULK_UPLOAD_MAX_SIZE_MB")
                .unwrap_or_else(|_| BULK_UPLOAD_MAX_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(BULK_UPLOAD_MAX_SIZE_MB)
                * 1024
                * 1024,
            upload_dir,
            asset_upload_timeout_secs: env::var("ASSET_UPLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| ASSET_UPLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(ASSET_UPLOAD_TIMEOUT_SECS),
            remote_image_max_size_bytes: env::var("REMOTE_IMAGE_MAX_SIZE_MB")
                .unwrap_or_else(|_| REMOTE_IMAGE_MAX_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(REMOTE_IMAGE_MAX_SIZE_MB)
                * 1024
                * 1024,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.catalog_backend == CatalogBackend::Postgres {
            match self.database_url.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when using the postgres catalog backend"
                    ));
                }
                Some(url) if !url.starts_with("postgresql://") && !url.starts_with("postgres://") => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ));
                }
                Some(_) => {}
            }
        }

        if self.bulk_upload_max_size_bytes == 0 {
            return Err(anyhow::anyhow!("BULK_UPLOAD_MAX_SIZE_MB must be greater than 0"));
        }

        if self.asset_upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "ASSET_UPLOAD_TIMEOUT_SECS must be greater than 0"
            ));
        }

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
