#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use stockroom_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.storage_backend().unwrap_or(StorageBackend::S3);

    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{BaseConfig, CatalogBackend, IngestServiceConfig};

    fn config(storage_backend: Option<StorageBackend>) -> IngestServiceConfig {
        IngestServiceConfig {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: 5,
                db_timeout_seconds: 5,
                jwt_secret: "a".repeat(32),
                environment: "development".to_string(),
            },
            catalog_backend: CatalogBackend::Memory,
            database_url: None,
            storage_backend,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: None,
            local_storage_base_url: None,
            bulk_upload_max_size_bytes: 1024,
            upload_dir: std::env::temp_dir(),
            asset_upload_timeout_secs: 5,
            remote_image_max_size_bytes: 1024,
        }
    }

    fn config_error(result: StorageResult<Arc<dyn Storage>>) -> String {
        match result {
            Err(StorageError::ConfigError(message)) => message,
            Err(other) => panic!("expected a configuration error, got {other}"),
            Ok(storage) => panic!("expected an error, got {:?}", storage.backend_type()),
        }
    }

    #[tokio::test]
    async fn test_creates_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut ingest = config(Some(StorageBackend::Local));
        ingest.local_storage_path = Some(dir.path().display().to_string());
        ingest.local_storage_base_url = Some("http://localhost:4000/media".to_string());

        let storage = create_storage(&Config(Box::new(ingest))).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_local_backend_requires_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut ingest = config(Some(StorageBackend::Local));
        ingest.local_storage_path = Some(dir.path().display().to_string());

        let message = config_error(create_storage(&Config(Box::new(ingest))).await);
        assert!(message.contains("LOCAL_STORAGE_BASE_URL"), "{message}");
    }

    #[tokio::test]
    async fn test_defaults_to_s3_and_requires_bucket() {
        let message = config_error(create_storage(&Config(Box::new(config(None)))).await);
        assert!(message.contains("S3_BUCKET"), "{message}");
    }

    #[tokio::test]
    async fn test_creates_s3_backend_for_custom_endpoint() {
        let mut ingest = config(Some(StorageBackend::S3));
        ingest.s3_bucket = Some("catalog-assets".to_string());
        ingest.s3_region = Some("us-east-1".to_string());
        ingest.s3_endpoint = Some("http://localhost:9000".to_string());

        let storage = create_storage(&Config(Box::new(ingest))).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }
}
