//! Tabular parsing: CSV and spreadsheets into [`RawRow`]s.
//!
//! Headers are trimmed and lower-cased. Rows whose every cell is blank are skipped
//! but still counted, so [`RawRow::index`] keeps pointing at the source row.

mod csv;
mod excel;

use std::path::Path;

use stockroom_core::models::{RawRow, SourceFormat};

use crate::error::IngestError;

pub use self::csv::CsvRows;
pub use self::excel::{cell_to_string, SheetRows};

/// Single-pass row reader over one tabular file.
pub enum RowReader {
    Csv(CsvRows),
    Sheet(SheetRows),
}

impl RowReader {
    pub fn open(path: &Path, format: SourceFormat) -> Result<Self, IngestError> {
        match format {
            SourceFormat::Csv => Ok(RowReader::Csv(CsvRows::open(path)?)),
            SourceFormat::Xlsx | SourceFormat::Xls => {
                Ok(RowReader::Sheet(SheetRows::open(path, format)?))
            }
            SourceFormat::Zip => Err(IngestError::Parse {
                format,
                message: "archives must be extracted before parsing".to_string(),
            }),
        }
    }

    pub fn headers(&self) -> &[String] {
        match self {
            RowReader::Csv(rows) => rows.headers(),
            RowReader::Sheet(rows) => rows.headers(),
        }
    }
}

impl Iterator for RowReader {
    type Item = Result<RawRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RowReader::Csv(rows) => rows.next(),
            RowReader::Sheet(rows) => rows.next(),
        }
    }
}

/// Read every row of `path`, failing on the first malformed record.
pub fn read_rows(path: &Path, format: SourceFormat) -> Result<Vec<RawRow>, IngestError> {
    let reader = RowReader::open(path, format)?;
    tracing::debug!(format = %format, headers = ?reader.headers(), "Table headers read");
    reader.collect()
}
