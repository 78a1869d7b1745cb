use std::time::Duration;

use stockroom_core::models::SourceFormat;
use stockroom_core::AppError;
use thiserror::Error;

/// Job-level failures. No summary is produced when a job ends with one of these.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type '{0}'. Upload a .zip, .csv, .xlsx or .xls file")]
    UnsupportedFileType(String),

    #[error("No CSV or XLSX file found inside archive")]
    NoTabularFile,

    #[error("Invalid or corrupt ZIP archive: {0}")]
    CorruptArchive(String),

    #[error("Failed to parse {format} file: {message}")]
    Parse {
        format: SourceFormat,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Io(e) => AppError::Internal(format!("Bulk upload I/O failure: {}", e)),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// Row-level image failures; the display text is the row's reason.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Image file not found: {0}")]
    LocalNotFound(String),

    #[error("image must be a public URL for standalone CSV/XLSX (or use ZIP with images)")]
    NotPublicUrl,

    #[error("Image URL not allowed: {0}")]
    UnsafeUrl(String),

    #[error("Image upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Upload(String),
}
