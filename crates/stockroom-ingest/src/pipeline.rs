//! Bulk upload orchestrator.
//!
//! A job moves through `Opened -> (Extracting ->)? Parsing -> RowProcessing ->
//! Finalizing -> Closed`. Rows run strictly one after another in file order and each
//! produces exactly one ledger entry. Any error before row processing is fatal for
//! the job. Temporary files are released in `Finalizing` on every path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use stockroom_core::models::{IngestSummary, RawRow, SourceFormat};
use stockroom_core::{AppError, Config, ErrorMetadata};
use stockroom_db::{CatalogWriter, SummaryStore};
use uuid::Uuid;

use crate::archive::{extract_zip, locate_tabular_file};
use crate::assets::{resolve_reference, AssetUploader, ImageMode};
use crate::duplicate::{duplicate_reason, DuplicateGuard};
use crate::error::{AssetError, IngestError};
use crate::ledger::{ResultLedger, RowOutcome};
use crate::tabular::read_rows;
use crate::validator::{failure_reason, validate_row};
use crate::workspace::JobWorkspace;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent directory for per-job extraction directories
    pub work_dir: PathBuf,
    /// Upper bound for one image upload
    pub asset_upload_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            work_dir: config.upload_dir().clone(),
            asset_upload_timeout: Duration::from_secs(config.asset_upload_timeout_secs()),
        }
    }
}

/// One accepted upload. The pipeline takes ownership of `file_path` and deletes it.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub job_id: Uuid,
    pub owner_id: Uuid,
    pub file_path: PathBuf,
    /// Client-supplied file name, used to classify the format
    pub original_name: String,
}

impl UploadJob {
    pub fn new(owner_id: Uuid, file_path: PathBuf, original_name: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            owner_id,
            file_path,
            original_name: original_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Opened,
    Extracting,
    Parsing,
    RowProcessing,
    Finalizing,
    Closed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Opened => "opened",
            JobState::Extracting => "extracting",
            JobState::Parsing => "parsing",
            JobState::RowProcessing => "row_processing",
            JobState::Finalizing => "finalizing",
            JobState::Closed => "closed",
        };
        f.write_str(name)
    }
}

fn enter(state: JobState) {
    tracing::debug!(state = %state, "Bulk upload state change");
}

/// The table a job reads rows from, and how its image references resolve
struct TableSource {
    path: PathBuf,
    format: SourceFormat,
    mode: ImageMode,
    image_root: Option<PathBuf>,
}

async fn blocking<T, F>(task: F) -> Result<T, IngestError>
where
    F: FnOnce() -> Result<T, IngestError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        IngestError::Io(std::io::Error::other(format!(
            "bulk upload worker failed: {}",
            e
        )))
    })?
}

pub struct IngestPipeline {
    catalog: Arc<dyn CatalogWriter>,
    uploader: Arc<dyn AssetUploader>,
    summaries: Arc<dyn SummaryStore>,
    config: PipelineConfig,
}

impl IngestPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogWriter>,
        uploader: Arc<dyn AssetUploader>,
        summaries: Arc<dyn SummaryStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            catalog,
            uploader,
            summaries,
            config,
        }
    }

    /// Run a job to completion.
    ///
    /// On success the summary is also stored as the owner's latest result. Fatal
    /// errors leave the stored summary untouched.
    #[tracing::instrument(
        skip(self, job),
        fields(job_id = %job.job_id, owner_id = %job.owner_id, file = %job.original_name)
    )]
    pub async fn run(&self, job: UploadJob) -> Result<IngestSummary, IngestError> {
        let start = Instant::now();
        let mut workspace = JobWorkspace::new(job.file_path.clone());

        let result = self.execute(&job, &mut workspace).await;

        enter(JobState::Finalizing);
        workspace.release();

        match result {
            Ok(summary) => {
                self.summaries.put(job.owner_id, summary.clone()).await;
                tracing::info!(
                    state = %JobState::Closed,
                    total = summary.total,
                    inserted = summary.inserted,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Bulk upload completed"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(
                    state = %JobState::Closed,
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Bulk upload failed"
                );
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        job: &UploadJob,
        workspace: &mut JobWorkspace,
    ) -> Result<IngestSummary, IngestError> {
        enter(JobState::Opened);
        let format = classify(job)?;

        let source = match format {
            SourceFormat::Zip => {
                enter(JobState::Extracting);
                self.extract(workspace).await?
            }
            tabular => TableSource {
                path: workspace.upload_path().to_path_buf(),
                format: tabular,
                mode: ImageMode::Remote,
                image_root: None,
            },
        };

        enter(JobState::Parsing);
        let (path, table_format) = (source.path.clone(), source.format);
        let rows = blocking(move || read_rows(&path, table_format)).await?;

        enter(JobState::RowProcessing);
        tracing::info!(rows = rows.len(), format = %table_format, "Processing bulk upload rows");

        let mut ledger = ResultLedger::new();
        let mut guard = DuplicateGuard::new();
        for row in &rows {
            let outcome = self.process_row(job.owner_id, row, &source, &mut guard).await;
            tracing::debug!(row = row.index, outcome = ?outcome, "Row processed");
            ledger.record(row.index, outcome);
        }

        Ok(ledger.summary())
    }

    async fn extract(&self, workspace: &mut JobWorkspace) -> Result<TableSource, IngestError> {
        let root = workspace.create_extract_dir(&self.config.work_dir)?;
        let archive = workspace.upload_path().to_path_buf();
        let extract_root = root.clone();

        let table = blocking(move || {
            extract_zip(&archive, &extract_root)?;
            locate_tabular_file(&extract_root)
        })
        .await?;

        let format = SourceFormat::from_path(&table).ok_or(IngestError::NoTabularFile)?;
        tracing::debug!(table = %table.display(), "Catalog table located in archive");

        Ok(TableSource {
            path: table,
            format,
            mode: ImageMode::Archive,
            image_root: Some(root),
        })
    }

    /// Validate, deduplicate, upload and persist one row.
    async fn process_row(
        &self,
        owner_id: Uuid,
        row: &RawRow,
        source: &TableSource,
        guard: &mut DuplicateGuard,
    ) -> RowOutcome {
        let validated = match validate_row(row, source.mode) {
            Ok(validated) => validated,
            Err(fields) => return RowOutcome::Failed(failure_reason(&fields)),
        };
        let sku = validated.draft.sku.clone();

        match guard.check(self.catalog.as_ref(), owner_id, &sku).await {
            Ok(check) if check.is_duplicate() => {
                return RowOutcome::Skipped(duplicate_reason(&sku));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(row = row.index, sku = %sku, error = %e, "SKU lookup failed");
                return RowOutcome::Failed(e.client_message());
            }
        }

        let reference = match resolve_reference(
            &validated.image_ref,
            source.mode,
            source.image_root.as_deref(),
        ) {
            Ok(reference) => reference,
            Err(e) => return RowOutcome::Failed(e.to_string()),
        };

        let timeout = self.config.asset_upload_timeout;
        let asset = match tokio::time::timeout(timeout, self.uploader.upload(owner_id, &reference))
            .await
        {
            Ok(Ok(asset)) => asset,
            Ok(Err(e)) => return RowOutcome::Failed(e.to_string()),
            Err(_) => return RowOutcome::Failed(AssetError::Timeout(timeout).to_string()),
        };

        match self
            .catalog
            .create_item(owner_id, validated.draft, asset.clone())
            .await
        {
            Ok(item) => {
                guard.record(&sku);
                tracing::debug!(row = row.index, sku = %sku, item_id = %item.id, "Catalog item created");
                RowOutcome::Inserted
            }
            Err(e) => {
                self.discard(&asset).await;
                match e {
                    AppError::Conflict(_) => RowOutcome::Skipped(duplicate_reason(&sku)),
                    other => {
                        tracing::warn!(row = row.index, sku = %sku, error = %other, "Catalog write failed");
                        RowOutcome::Failed(other.client_message())
                    }
                }
            }
        }
    }

    async fn discard(&self, asset: &stockroom_core::models::ResolvedAsset) {
        if let Err(e) = self.uploader.discard(asset).await {
            tracing::warn!(public_id = %asset.public_id, error = %e, "Failed to discard orphaned asset");
        }
    }
}

fn classify(job: &UploadJob) -> Result<SourceFormat, IngestError> {
    let name = Path::new(&job.original_name);
    SourceFormat::from_path(name)
        .or_else(|| SourceFormat::from_path(&job.file_path))
        .ok_or_else(|| {
            let ext = name
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_lowercase();
            IngestError::UnsupportedFileType(ext)
        })
}
