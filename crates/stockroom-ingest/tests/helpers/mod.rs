//! Test helpers: pipeline wired to in-memory stores and a recording uploader.
//!
//! Run from workspace root: `cargo test -p stockroom-ingest --test pipeline_test`.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stockroom_core::models::{AssetReference, CatalogItem, CatalogItemDraft, ResolvedAsset};
use stockroom_core::AppError;
use stockroom_db::{CatalogWriter, InMemoryCatalogRepository, InMemorySummaryStore};
use stockroom_ingest::{AssetError, AssetUploader, IngestPipeline, PipelineConfig, UploadJob};
use tempfile::TempDir;
use uuid::Uuid;
use zip::write::{FileOptions, ZipWriter};

pub const HEADER: &str = "name,price,description,category,brand,quantity,sku,compatibility,image";

/// Uploader that records every call instead of storing bytes.
#[derive(Default)]
pub struct RecordingUploader {
    pub uploads: Mutex<Vec<AssetReference>>,
    pub discarded: Mutex<Vec<ResolvedAsset>>,
    pub delay: Option<Duration>,
}

impl RecordingUploader {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn discard_count(&self) -> usize {
        self.discarded.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetUploader for RecordingUploader {
    async fn upload(
        &self,
        owner_id: Uuid,
        source: &AssetReference,
    ) -> Result<ResolvedAsset, AssetError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(source.clone());
        let key = format!("catalog/{}/{}.jpg", owner_id, uploads.len());
        Ok(ResolvedAsset {
            url: format!("http://assets.test/{}", key),
            public_id: key,
            provider: "test".to_string(),
        })
    }

    async fn discard(&self, asset: &ResolvedAsset) -> Result<(), AssetError> {
        self.discarded.lock().unwrap().push(asset.clone());
        Ok(())
    }
}

/// Catalog whose lookups succeed but every write fails.
#[derive(Default)]
pub struct FailingCatalog;

#[async_trait]
impl CatalogWriter for FailingCatalog {
    async fn sku_exists(&self, _owner_id: Uuid, _sku: &str) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn create_item(
        &self,
        _owner_id: Uuid,
        _draft: CatalogItemDraft,
        _asset: ResolvedAsset,
    ) -> Result<CatalogItem, AppError> {
        Err(AppError::Internal("connection reset".to_string()))
    }
}

pub struct TestPipeline {
    pub pipeline: IngestPipeline,
    pub catalog: Arc<InMemoryCatalogRepository>,
    pub summaries: Arc<InMemorySummaryStore>,
    pub uploader: Arc<RecordingUploader>,
    pub dir: TempDir,
}

impl TestPipeline {
    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Write `contents` as an upload named `name` and build its job.
    pub fn job(&self, owner_id: Uuid, name: &str, contents: &[u8]) -> UploadJob {
        let path = self.dir.path().join(format!("{}-{}", Uuid::new_v4(), name));
        std::fs::write(&path, contents).unwrap();
        UploadJob::new(owner_id, path, name)
    }

    /// Extraction directories still present under the work dir
    pub fn leftover_extract_dirs(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.work_dir()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("stockroom-bulk-"))
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn setup() -> TestPipeline {
    setup_with(Arc::new(RecordingUploader::default()), Duration::from_secs(5))
}

pub fn setup_with(uploader: Arc<RecordingUploader>, upload_timeout: Duration) -> TestPipeline {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(InMemoryCatalogRepository::new());
    let summaries = Arc::new(InMemorySummaryStore::new());

    let pipeline = IngestPipeline::new(
        catalog.clone(),
        uploader.clone(),
        summaries.clone(),
        PipelineConfig {
            work_dir: dir.path().join("work"),
            asset_upload_timeout: upload_timeout,
        },
    );

    TestPipeline {
        pipeline,
        catalog,
        summaries,
        uploader,
        dir,
    }
}

/// CSV body with the standard header followed by `rows`
pub fn csv(rows: &[&str]) -> Vec<u8> {
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    body.into_bytes()
}

/// Build a ZIP in memory; names ending in `/` become directories.
pub fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let path = tempfile::NamedTempFile::new().unwrap();
    write_zip(path.path(), entries);
    std::fs::read(path.path()).unwrap()
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, FileOptions::default()).unwrap();
        } else {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Two-sheet workbook: "Products" (two rows around a blank row) and "Notes"
pub fn xlsx_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.xlsx")
}

pub fn row(sku: &str, image: &str) -> String {
    format!(
        "Alloy Rim,249.99,17 inch alloy rim,wheels,Forgeline,4,{},Civic,{}",
        sku, image
    )
}
