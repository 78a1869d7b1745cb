//! Spooling of multipart catalog uploads to disk

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use stockroom_core::models::SourceFormat;
use stockroom_core::AppError;
use stockroom_ingest::IngestError;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::constants::UPLOAD_FIELD;

/// A file in the spool directory, deleted on drop unless handed off with
/// [`SpoolFile::persist`].
///
/// Also covers the handler future being dropped mid-stream on client disconnect.
#[derive(Debug)]
pub struct SpoolFile {
    path: PathBuf,
    armed: bool,
}

impl SpoolFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file and return its path; the caller now owns its deletion.
    pub fn persist(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove spooled upload")
            }
        }
    }
}

/// An uploaded file written to the spool directory
#[derive(Debug)]
pub struct SpooledUpload {
    pub file: SpoolFile,
    pub original_name: String,
    pub size_bytes: u64,
}

/// Strip any directory part a client put in the file name
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Accepted upload format for `filename`, by extension
pub fn validate_file_extension(filename: &str) -> Result<SourceFormat, AppError> {
    SourceFormat::from_path(Path::new(filename)).ok_or_else(|| {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("none")
            .to_lowercase();
        IngestError::UnsupportedFileType(ext).into()
    })
}

/// `<unix-millis>-<uuid>.<ext>` under `upload_dir`
pub fn spool_path(upload_dir: &Path, format: SourceFormat) -> PathBuf {
    upload_dir.join(format!(
        "{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        format.extension()
    ))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds the maximum allowed size".to_string())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Write one field to `path` chunk by chunk, enforcing `max_bytes`.
async fn write_field(
    field: &mut Field<'_>,
    spool: &SpoolFile,
    max_bytes: usize,
) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(spool.path()).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        written += chunk.len() as u64;
        if written > max_bytes as u64 {
            return Err(AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                max_bytes / 1024 / 1024
            )));
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(written)
}

/// Stream the single `file` field of `multipart` into `upload_dir`.
///
/// Exactly one `file` field is accepted. Nothing is left on disk when this fails.
pub async fn spool_multipart_file(
    mut multipart: Multipart,
    upload_dir: &Path,
    max_bytes: usize,
) -> Result<SpooledUpload, AppError> {
    let mut spooled: Option<SpooledUpload> = None;

    // Any early return drops `spooled` (and a half-written spool file) with it
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if spooled.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let original_name = sanitize_filename(field.file_name().unwrap_or_default());
        let format = validate_file_extension(&original_name)?;

        tokio::fs::create_dir_all(upload_dir).await?;
        let file = SpoolFile::new(spool_path(upload_dir, format));

        let size_bytes = write_field(&mut field, &file, max_bytes).await?;
        if size_bytes == 0 {
            return Err(AppError::InvalidInput("File is empty".to_string()));
        }

        spooled = Some(SpooledUpload {
            file,
            original_name,
            size_bytes,
        });
    }

    spooled.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))
}
