//! ZIP extraction and lookup of the embedded catalog table.
//!
//! A catalog archive holds exactly one `.csv`, `.xlsx` or `.xls` file, either at the
//! top level or under `images/` / `Images/`, plus the image files its rows reference.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use stockroom_core::models::SourceFormat;
use zip::ZipArchive;

use crate::error::IngestError;

/// Subdirectories searched after the archive root, in order.
pub const IMAGE_DIRS: [&str; 2] = ["images", "Images"];

/// Extract every entry of `archive_path` into `dest`, returning the number of files written.
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize, IngestError> {
    let file = File::open(archive_path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| IngestError::CorruptArchive(e.to_string()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| IngestError::CorruptArchive(e.to_string()))?;

        let relative = match entry.enclosed_name() {
            Some(name) => name.to_path_buf(),
            None => {
                tracing::warn!(entry = %entry.name(), "Skipping archive entry outside extraction root");
                continue;
            }
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| IngestError::CorruptArchive(format!("{}: {}", relative.display(), e)))?;
        written += 1;
    }

    tracing::debug!(files = written, dest = %dest.display(), "Archive extracted");
    Ok(written)
}

/// Find the catalog table inside an extracted archive.
///
/// Searches the root, then each of [`IMAGE_DIRS`]; within a directory, names sort
/// ascending and the first match wins.
pub fn locate_tabular_file(root: &Path) -> Result<PathBuf, IngestError> {
    let mut found = Vec::new();
    for dir in std::iter::once(root.to_path_buf()).chain(IMAGE_DIRS.iter().map(|d| root.join(d))) {
        found.extend(tabular_files_in(&dir)?);
    }

    let mut found = found.into_iter();
    let first = found.next().ok_or(IngestError::NoTabularFile)?;
    let ignored: Vec<String> = found.map(|p| p.display().to_string()).collect();
    if !ignored.is_empty() {
        tracing::warn!(
            table = %first.display(),
            ignored = ?ignored,
            "Archive contains several catalog tables; using the first"
        );
    }
    Ok(first)
}

fn tabular_files_in(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden || !path.is_file() {
            continue;
        }
        if SourceFormat::from_path(&path).is_some_and(|f| f.is_tabular()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Paths tried for a local image reference, in lookup order.
///
/// Empty when the reference is absolute or climbs out of `root`.
pub fn local_image_candidates(root: &Path, reference: &str) -> Vec<PathBuf> {
    let relative = Path::new(reference);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if reference.is_empty() || !plain {
        return Vec::new();
    }

    std::iter::once(root.join(relative))
        .chain(IMAGE_DIRS.iter().map(|d| root.join(d).join(relative)))
        .collect()
}

/// First existing candidate for `reference`
pub fn find_local_image(root: &Path, reference: &str) -> Option<PathBuf> {
    local_image_candidates(root, reference)
        .into_iter()
        .find(|p| p.is_file())
}
