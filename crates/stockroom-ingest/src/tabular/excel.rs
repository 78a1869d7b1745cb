use std::path::Path;
use std::vec::IntoIter;

use calamine::{open_workbook_auto, DataType, Reader};
use stockroom_core::models::{normalize_header, RawRow, SourceFormat};

use crate::error::IngestError;

/// Rows of the first worksheet.
///
/// The sheet is decoded up front by calamine; rows are then handed out one at a time.
pub struct SheetRows {
    headers: Vec<String>,
    rows: IntoIter<Vec<String>>,
    position: usize,
}

impl SheetRows {
    pub fn open(path: &Path, format: SourceFormat) -> Result<Self, IngestError> {
        let parse_error = |message: String| IngestError::Parse { format, message };

        let mut workbook = open_workbook_auto(path).map_err(|e| parse_error(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| parse_error("workbook contains no worksheets".to_string()))?
            .map_err(|e| parse_error(e.to_string()))?;

        let mut rows = range.rows().map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
        let headers = rows
            .next()
            .map(|header| header.iter().map(|h| normalize_header(h)).collect())
            .unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();

        Ok(SheetRows {
            headers,
            rows: rows.into_iter(),
            position: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for SheetRows {
    type Item = Result<RawRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        for cells in self.rows.by_ref() {
            self.position += 1;
            let row = RawRow::new(self.position, &self.headers, cells);
            if !row.is_blank() {
                return Some(Ok(row));
            }
        }
        None
    }
}

/// Render a cell the way it would appear in a CSV export
pub fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) => {
            if f.fract().abs() < f64::EPSILON {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        DataType::Int(v) => v.to_string(),
        DataType::Bool(v) => v.to_string(),
        DataType::Error(_) => String::new(),
        _ => cell.to_string(),
    }
}
