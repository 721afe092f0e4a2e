//! CSV writer

use std::io::Write;

use edict_record::{Record, RecordStream, RecordWriter};
use tracing::{debug, trace};

use crate::config::CsvConfig;
use crate::errors::{CsvError, CsvResult};

/// Writes the stream's field names as a header, then one row per record
#[derive(Debug, Clone, Default)]
pub struct CsvWriter {
    config: CsvConfig,
}

impl CsvWriter {
    /// Create a new CSV writer
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

impl RecordWriter for CsvWriter {
    fn write(&self, output: &mut dyn Write, stream: RecordStream<'_>) -> edict_record::Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.config.delimiter_u8())
            .quote(self.config.quote_char_u8())
            .terminator(self.config.terminator())
            .flexible(true)
            .from_writer(output);

        csv_writer
            .write_record(&stream.fields)
            .map_err(|e| CsvError::write(e.to_string()))?;

        let mut count = 0usize;
        for record in stream.records {
            let record = record?;
            let row = record_to_row(&record, &stream.fields)?;
            csv_writer
                .write_record(&row)
                .map_err(|e| CsvError::write(e.to_string()))?;
            trace!(?row, "Wrote CSV row");
            count += 1;
        }

        csv_writer
            .flush()
            .map_err(|e| CsvError::write(e.to_string()))?;
        debug!(record_count = count, "Finished writing CSV");
        Ok(())
    }
}

/// Missing fields are written empty; fields outside the header are rejected.
fn record_to_row<'r>(record: &'r Record, fields: &[String]) -> CsvResult<Vec<&'r str>> {
    if let Some(extra) = record
        .field_names()
        .find(|name| !fields.iter().any(|field| field == name))
    {
        return Err(CsvError::write(format!(
            "record field '{extra}' is not one of the output fields {fields:?}"
        )));
    }
    Ok(fields
        .iter()
        .map(|field| record.get(field).unwrap_or_default())
        .collect())
}
