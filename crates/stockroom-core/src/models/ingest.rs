use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Container type of an uploaded catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Zip,
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    /// Classify by file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "zip" => Some(SourceFormat::Zip),
            "csv" => Some(SourceFormat::Csv),
            "xlsx" => Some(SourceFormat::Xlsx),
            "xls" => Some(SourceFormat::Xls),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Zip => "zip",
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
        }
    }

    /// CSV or spreadsheet, as opposed to an archive
    pub fn is_tabular(&self) -> bool {
        !matches!(self, SourceFormat::Zip)
    }
}

impl Display for SourceFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.extension())
    }
}

/// One source row keyed by normalized header name.
///
/// `index` is the 1-based data-row position in the source file, header excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub index: usize,
    values: Vec<(String, String)>,
}

impl RawRow {
    /// Pair `cells` with `headers`; missing trailing cells are left out.
    pub fn new(index: usize, headers: &[String], cells: Vec<String>) -> Self {
        let values = headers
            .iter()
            .cloned()
            .zip(cells)
            .filter(|(header, _)| !header.is_empty())
            .collect();
        RawRow { index, values }
    }

    /// Trimmed value of `field`, or `None` when absent or blank
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(header, _)| header == field)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|(_, value)| value.trim().is_empty())
    }

    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }
}

/// Normalize a header cell: trimmed, lower-cased, byte-order mark removed
pub fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Where a row's image bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetReference {
    /// File extracted from the uploaded archive
    Local { path: PathBuf },
    /// Public http(s) URL
    Remote { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Inserted,
    Skipped,
    Failed,
}

/// Outcome recorded for exactly one source row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub row_index: usize,
    pub status: RowStatus,
    pub reason: Option<String>,
}

/// A row that was not inserted, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RowError {
    pub row: usize,
    pub reason: String,
}

/// Aggregate result of one bulk upload job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngestSummary {
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

impl IngestSummary {
    pub fn is_consistent(&self) -> bool {
        self.total == self.inserted + self.skipped + self.failed
    }
}
