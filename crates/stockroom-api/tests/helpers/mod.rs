//! Test helpers: full router over the in-memory catalog and local storage.
//!
//! Run from workspace root: `cargo test -p stockroom-api --test bulk_upload_test`.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use stockroom_api::constants::API_PREFIX;
use stockroom_api::setup::{routes, services};
use stockroom_core::{BaseConfig, CatalogBackend, Config, IngestServiceConfig, StorageBackend};
use stockroom_storage::LocalStorage;
use tempfile::TempDir;
use uuid::Uuid;
use zip::write::{FileOptions, ZipWriter};

pub const JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars!";
pub const MEDIA_BASE_URL: &str = "http://localhost:4000/media";

/// Returns the versioned API path, e.g. `api_path("/catalog/bulk-upload")`.
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub struct TestApp {
    pub server: TestServer,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

fn create_test_config(temp_dir: &TempDir) -> Config {
    Config(Box::new(IngestServiceConfig {
        base: BaseConfig {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 5,
            jwt_secret: JWT_SECRET.to_string(),
            environment: "test".to_string(),
        },
        catalog_backend: CatalogBackend::Memory,
        database_url: None,
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(temp_dir.path().join("media").display().to_string()),
        local_storage_base_url: Some(MEDIA_BASE_URL.to_string()),
        bulk_upload_max_size_bytes: 1024 * 1024,
        upload_dir: temp_dir.path().join("uploads"),
        asset_upload_timeout_secs: 5,
        remote_image_max_size_bytes: 1024 * 1024,
    }))
}

/// Setup the full application router without a database
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = create_test_config(&temp_dir);

    let storage = LocalStorage::new(temp_dir.path().join("media"), MEDIA_BASE_URL.to_string())
        .await
        .expect("Failed to create local storage");

    let state = services::initialize_services(&config, None, Arc::new(storage))
        .await
        .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");

    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        _temp_dir: temp_dir,
    }
}

pub fn token_for(owner_id: Uuid) -> String {
    stockroom_api::auth::issue_token(JWT_SECRET, owner_id, chrono::Duration::hours(1))
        .expect("Failed to issue token")
}

/// Multipart form with a single `file` part
pub fn file_form(name: &str, mime: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(data).file_name(name).mime_type(mime))
}

/// ZIP bytes; names ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let mut zip = ZipWriter::new(File::create(file.path()).unwrap());
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, FileOptions::default()).unwrap();
        } else {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap();
    std::fs::read(file.path()).unwrap()
}
