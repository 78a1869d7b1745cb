//! Temporary files owned by one upload job.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Owns the uploaded file and the job's extraction directory.
///
/// Both are removed by [`JobWorkspace::release`], or by `Drop` if the job future is
/// dropped before reaching it.
#[derive(Debug)]
pub struct JobWorkspace {
    upload_path: PathBuf,
    extract_dir: Option<TempDir>,
    released: bool,
}

impl JobWorkspace {
    pub fn new(upload_path: PathBuf) -> Self {
        Self {
            upload_path,
            extract_dir: None,
            released: false,
        }
    }

    pub fn upload_path(&self) -> &Path {
        &self.upload_path
    }

    /// Create a uniquely named extraction directory under `root`.
    pub fn create_extract_dir(&mut self, root: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(root)?;
        let prefix = format!("stockroom-bulk-{}-", chrono::Utc::now().timestamp_millis());
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(root)?;
        let path = dir.path().to_path_buf();
        self.extract_dir = Some(dir);
        Ok(path)
    }

    /// Delete the uploaded file and the extraction directory, logging failures.
    pub fn release(mut self) {
        self.remove_all(true);
    }

    fn remove_all(&mut self, log: bool) {
        if self.released {
            return;
        }
        self.released = true;

        match std::fs::remove_file(&self.upload_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) if log => tracing::warn!(
                path = %self.upload_path.display(),
                error = %e,
                "Failed to remove uploaded file"
            ),
            Err(_) => {}
        }

        if let Some(dir) = self.extract_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                if log {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to remove extraction directory"
                    );
                }
            }
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        self.remove_all(false);
    }
}
