mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{csv, row, setup, setup_with, zip, FailingCatalog, RecordingUploader};
use stockroom_core::models::{AssetReference, IngestSummary, RowError};
use stockroom_db::{InMemorySummaryStore, SummaryStore};
use stockroom_ingest::{
    IngestError, IngestPipeline, PipelineConfig, StorageAssetUploader, CATALOG_TEMPLATE_CSV,
};
use stockroom_storage::LocalStorage;
use uuid::Uuid;

fn catalog_zip() -> Vec<u8> {
    zip(&[
        ("products.csv", CATALOG_TEMPLATE_CSV.as_bytes()),
        ("images/", b""),
        ("images/rim1.jpg", b"rim-jpeg"),
        ("images/spoiler.jpg", b"spoiler-jpeg"),
    ])
}

#[tokio::test]
async fn test_zip_with_bundled_images_inserts_every_row() {
    let t = setup();
    let owner = Uuid::new_v4();
    let job = t.job(owner, "catalog.zip", &catalog_zip());

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(
        summary,
        IngestSummary {
            total: 2,
            inserted: 2,
            skipped: 0,
            failed: 0,
            errors: vec![],
        }
    );

    let uploads = t.uploader.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 2);
    match &uploads[0] {
        AssetReference::Local { path } => assert!(path.ends_with("images/rim1.jpg")),
        other => panic!("expected a bundled image, got {:?}", other),
    }

    let items = t.catalog.items_for(owner).await;
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.image_provider == "test"));
    assert_eq!(t.summaries.get(owner).await, Some(summary));
}

#[tokio::test]
async fn test_standalone_csv_rejects_local_image_names() {
    let t = setup();
    let owner = Uuid::new_v4();
    let job = t.job(owner, "catalog.csv", CATALOG_TEMPLATE_CSV.as_bytes());

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.errors[0].row, 1);
    assert!(summary.errors[0].reason.contains("must be a public URL"));
    assert_eq!(t.uploader.upload_count(), 0);
    assert!(t.catalog.items_for(owner).await.is_empty());
}

#[tokio::test]
async fn test_standalone_csv_with_public_urls() {
    let t = setup();
    let owner = Uuid::new_v4();
    let body = format!(
        "name,price,description,category,brand,quantity,sku,compatibility,image_url\n{}\n",
        row("RIM001", "https://cdn.example.com/rim1.jpg")
    );
    let job = t.job(owner, "catalog.CSV", body.as_bytes());

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(
        t.uploader.uploads.lock().unwrap()[0],
        AssetReference::Remote {
            url: "https://cdn.example.com/rim1.jpg".to_string()
        }
    );
}

#[tokio::test]
async fn test_short_sku_fails_row() {
    let t = setup();
    let body = csv(&[&row("AB12", "https://cdn.example.com/rim1.jpg")]);
    let job = t.job(Uuid::new_v4(), "catalog.csv", &body);

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert!(summary.errors[0].reason.contains("sku"));
}

#[tokio::test]
async fn test_reason_lists_every_missing_field() {
    let t = setup();
    let body = csv(&[",10,,,Acme,,RIM001,,https://cdn.example.com/rim1.jpg"]);
    let job = t.job(Uuid::new_v4(), "catalog.csv", &body);

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(
        summary.errors,
        vec![RowError {
            row: 1,
            reason: "name, description, category, quantity".to_string()
        }]
    );
}

#[tokio::test]
async fn test_rows_are_reported_in_file_order() {
    let t = setup();
    let url = "https://cdn.example.com/rim.jpg";
    let body = csv(&[
        &row("BAD1", url),
        &row("RIM001", url),
        ",,,,,,,,",
        &row("RIM001", url),
        &row("RIM002", "rim.jpg"),
    ]);
    let job = t.job(Uuid::new_v4(), "catalog.csv", &body);

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.total, 4);
    assert!(summary.is_consistent());
    let rows: Vec<usize> = summary.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![1, 4, 5]);
}

#[tokio::test]
async fn test_resubmitting_the_same_file_skips_every_row() {
    let t = setup();
    let owner = Uuid::new_v4();

    let first = t.pipeline.run(t.job(owner, "catalog.zip", &catalog_zip())).await.unwrap();
    assert_eq!(first.inserted, 2);

    let second = t.pipeline.run(t.job(owner, "catalog.zip", &catalog_zip())).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.errors[0].reason, "SKU RIM001 already exists");
    assert_eq!(t.catalog.items_for(owner).await.len(), 2);
    assert_eq!(t.uploader.upload_count(), 2);
}

#[tokio::test]
async fn test_same_sku_for_another_owner_is_inserted() {
    let t = setup();

    t.pipeline
        .run(t.job(Uuid::new_v4(), "catalog.zip", &catalog_zip()))
        .await
        .unwrap();
    let other = t
        .pipeline
        .run(t.job(Uuid::new_v4(), "catalog.zip", &catalog_zip()))
        .await
        .unwrap();

    assert_eq!(other.inserted, 2);
}

#[tokio::test]
async fn test_duplicate_sku_within_one_file() {
    let t = setup();
    let url = "https://cdn.example.com/rim.jpg";
    let body = csv(&[&row("RIM001", url), &row("rim001", url)]);
    let job = t.job(Uuid::new_v4(), "catalog.csv", &body);

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        summary.errors,
        vec![RowError {
            row: 2,
            reason: "SKU RIM001 already exists".to_string()
        }]
    );
}

#[tokio::test]
async fn test_missing_bundled_image_fails_only_that_row() {
    let t = setup();
    let body = csv(&[&row("RIM001", "rim1.jpg"), &row("SPL002", "spoiler.jpg")]);
    let archive = zip(&[("products.csv", body.as_slice()), ("Images/rim1.jpg", b"rim")]);
    let job = t.job(Uuid::new_v4(), "catalog.zip", &archive);

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(
        summary.errors,
        vec![RowError {
            row: 2,
            reason: "Image file not found: spoiler.jpg".to_string()
        }]
    );
}

#[tokio::test]
async fn test_zip_job_removes_temporary_files() {
    let t = setup();
    let job = t.job(Uuid::new_v4(), "catalog.zip", &catalog_zip());
    let upload = job.file_path.clone();

    t.pipeline.run(job).await.unwrap();

    assert!(!upload.exists());
    assert!(t.leftover_extract_dirs().is_empty());
}

#[tokio::test]
async fn test_zip_without_table_is_fatal_and_cleans_up() {
    let t = setup();
    let owner = Uuid::new_v4();
    let previous = IngestSummary {
        total: 1,
        inserted: 1,
        ..Default::default()
    };
    t.summaries.put(owner, previous.clone()).await;

    let archive = zip(&[("images/rim1.jpg", b"rim"), ("notes.txt", b"hello")]);
    let job = t.job(owner, "catalog.zip", &archive);
    let upload = job.file_path.clone();

    let err = t.pipeline.run(job).await.unwrap_err();

    assert!(matches!(err, IngestError::NoTabularFile));
    assert!(!upload.exists());
    assert!(t.leftover_extract_dirs().is_empty());
    assert_eq!(t.summaries.get(owner).await, Some(previous));
}

#[tokio::test]
async fn test_corrupt_zip_is_fatal() {
    let t = setup();
    let job = t.job(Uuid::new_v4(), "catalog.zip", b"definitely not a zip");
    let upload = job.file_path.clone();

    let err = t.pipeline.run(job).await.unwrap_err();

    assert!(matches!(err, IngestError::CorruptArchive(_)));
    assert!(err.to_string().starts_with("Invalid or corrupt ZIP archive"));
    assert!(!upload.exists());
    assert!(t.leftover_extract_dirs().is_empty());
}

#[tokio::test]
async fn test_unsupported_extension_is_fatal() {
    let t = setup();
    let owner = Uuid::new_v4();
    let job = t.job(owner, "catalog.pdf", b"%PDF-1.4");
    let upload = job.file_path.clone();

    let err = t.pipeline.run(job).await.unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedFileType(ref ext) if ext == "pdf"));
    assert!(!upload.exists());
    assert!(t.summaries.get(owner).await.is_none());
}

#[tokio::test]
async fn test_slow_upload_times_out_row() {
    let uploader = Arc::new(RecordingUploader::slow(Duration::from_millis(500)));
    let t = setup_with(uploader, Duration::from_millis(20));
    let body = csv(&[&row("RIM001", "https://cdn.example.com/rim.jpg")]);
    let job = t.job(Uuid::new_v4(), "catalog.csv", &body);

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert!(summary.errors[0].reason.starts_with("Image upload timed out"));
}

#[tokio::test]
async fn test_persistence_failure_discards_uploaded_asset() {
    let dir = tempfile::tempdir().unwrap();
    let uploader = Arc::new(RecordingUploader::default());
    let summaries = Arc::new(InMemorySummaryStore::new());
    let pipeline = IngestPipeline::new(
        Arc::new(FailingCatalog),
        uploader.clone(),
        summaries,
        PipelineConfig {
            work_dir: dir.path().join("work"),
            asset_upload_timeout: Duration::from_secs(5),
        },
    );

    let upload = dir.path().join("upload.csv");
    std::fs::write(&upload, csv(&[&row("RIM001", "https://cdn.example.com/rim.jpg")])).unwrap();
    let job = stockroom_ingest::UploadJob::new(Uuid::new_v4(), upload, "catalog.csv");

    let summary = pipeline.run(job).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors[0].reason, "Internal server error");
    assert_eq!(uploader.upload_count(), 1);
    assert_eq!(uploader.discard_count(), 1);
}

#[tokio::test]
async fn test_spreadsheet_job_reads_first_sheet() {
    let t = setup();
    let owner = Uuid::new_v4();
    let workbook = std::fs::read(helpers::xlsx_fixture()).unwrap();
    let job = t.job(owner, "catalog.xlsx", &workbook);

    let summary = t.pipeline.run(job).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.inserted, 2);
    assert!(summary.errors.is_empty());

    let mut items = t.catalog.items_for(owner).await;
    items.sort_by(|a, b| a.sku.cmp(&b.sku));
    assert_eq!(items[0].sku, "123456");
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].sku, "RIM001");
    assert_eq!(items[1].category, "WHEELS");
    assert_eq!(items[1].price, 249.99);
    assert_eq!(items[1].quantity, 4);
}

#[tokio::test]
async fn test_internal_image_urls_fail_their_rows() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(
        LocalStorage::new(dir.path().join("media"), "http://pub/media".to_string())
            .await
            .unwrap(),
    );
    let uploader = StorageAssetUploader::new(storage, Duration::from_secs(5), 1024).unwrap();
    let catalog = Arc::new(stockroom_db::InMemoryCatalogRepository::new());
    let pipeline = IngestPipeline::new(
        catalog.clone(),
        Arc::new(uploader),
        Arc::new(InMemorySummaryStore::new()),
        PipelineConfig {
            work_dir: dir.path().join("work"),
            asset_upload_timeout: Duration::from_secs(5),
        },
    );

    let upload = dir.path().join("upload.csv");
    std::fs::write(
        &upload,
        csv(&[
            &row("META01", "http://169.254.169.254/latest/meta-data/"),
            &row("CACHE1", "http://localhost:6379/"),
            &row("ADMIN1", "http://10.0.0.5/admin"),
        ]),
    )
    .unwrap();
    let owner = Uuid::new_v4();
    let job = stockroom_ingest::UploadJob::new(owner, upload, "catalog.csv");

    let summary = pipeline.run(job).await.unwrap();

    assert_eq!(summary.failed, 3);
    assert!(summary
        .errors
        .iter()
        .all(|e| e.reason.starts_with("Image URL not allowed")));
    assert!(catalog.items_for(owner).await.is_empty());
}

#[tokio::test]
async fn test_latest_summary_replaces_previous() {
    let t = setup();
    let owner = Uuid::new_v4();

    t.pipeline.run(t.job(owner, "catalog.zip", &catalog_zip())).await.unwrap();
    let body = csv(&[&row("AB12", "https://cdn.example.com/rim.jpg")]);
    let latest = t.pipeline.run(t.job(owner, "catalog.csv", &body)).await.unwrap();

    assert_eq!(t.summaries.get(owner).await, Some(latest));
}
