//! CSV reader

use std::io::Read;

use edict_record::{Record, RecordReader, RecordStream};
use tracing::{debug, trace};

use crate::config::CsvConfig;
use crate::errors::{CsvError, CsvResult};

/// Reads a header row followed by data rows
#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    config: CsvConfig,
}

impl CsvReader {
    /// Create a new CSV reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }
}

impl RecordReader for CsvReader {
    fn read<'a>(&self, input: Box<dyn Read + 'a>) -> edict_record::Result<RecordStream<'a>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter_u8())
            .quote(self.config.quote_char_u8())
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let fields: Vec<String> = reader
            .headers()
            .map_err(CsvError::from)?
            .iter()
            .map(str::to_string)
            .collect();
        if fields.is_empty() {
            return Err(CsvError::MissingHeader.into());
        }
        debug!(?fields, "Read CSV header");

        let names = fields.clone();
        let records = reader
            .into_records()
            .map(move |row| row_to_record(&names, row).map_err(edict_record::Error::from));
        Ok(RecordStream::new(fields, records))
    }
}

/// Short rows leave trailing fields unset; long rows are rejected.
fn row_to_record(fields: &[String], row: csv::Result<csv::StringRecord>) -> CsvResult<Record> {
    let row = row?;
    if row.len() > fields.len() {
        let line = row.position().map_or(0, csv::Position::line);
        return Err(CsvError::UnnamedColumn {
            line,
            values: row.iter().skip(fields.len()).map(str::to_string).collect(),
        });
    }
    trace!(?row, "Parsed CSV row");
    Ok(fields
        .iter()
        .map(String::as_str)
        .zip(row.iter())
        .collect())
}
