use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecordsIntoIter};
use stockroom_core::models::{normalize_header, RawRow, SourceFormat};

use crate::error::IngestError;

fn parse_error(err: csv::Error) -> IngestError {
    IngestError::Parse {
        format: SourceFormat::Csv,
        message: err.to_string(),
    }
}

/// Lazily parsed CSV rows
pub struct CsvRows {
    headers: Vec<String>,
    records: StringRecordsIntoIter<File>,
    position: usize,
}

impl CsvRows {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(parse_error)?;

        let headers = reader
            .headers()
            .map_err(parse_error)?
            .iter()
            .map(normalize_header)
            .collect();

        Ok(CsvRows {
            headers,
            records: reader.into_records(),
            position: 0,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for CsvRows {
    type Item = Result<RawRow, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(parse_error(e))),
            };
            self.position += 1;

            let cells = record.iter().map(str::to_string).collect();
            let row = RawRow::new(self.position, &self.headers, cells);
            if !row.is_blank() {
                return Some(Ok(row));
            }
        }
    }
}
