#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

//! # edict-adapter-csv
//!
//! CSV protocol for Edict record streams.
//!
//! The first row names the fields; every following row becomes a record.
//! Writing emits the stream's field names as the header row.
//!
//! ## Example Usage
//!
//! ```rust
//! use edict_adapter_csv::{CsvConfig, CsvReader, CsvWriter};
//! use edict_record::{ProtocolArgs, RecordReader, RecordWriter};
//!
//! let config = CsvConfig::from_args(&ProtocolArgs::new().with("delimiter", ";"))?;
//! let stream = CsvReader::new()
//!     .with_config(config.clone())
//!     .read(Box::new("a;b\n1;2\n".as_bytes()))?;
//!
//! let mut output = Vec::new();
//! CsvWriter::new().with_config(config).write(&mut output, stream)?;
//! assert_eq!(String::from_utf8(output)?, "a;b\n1;2\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod errors;
pub mod reader;
pub mod writer;

pub use config::{CsvConfig, RecordTerminator};
pub use errors::{CsvError, CsvResult};
pub use reader::CsvReader;
pub use writer::CsvWriter;

/// CSV protocol that combines reader and writer configuration
#[derive(Debug, Clone, Default)]
pub struct CsvAdapter {
    config: CsvConfig,
}

impl CsvAdapter {
    /// Create a new CSV adapter with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter configured from protocol arguments
    ///
    /// # Errors
    ///
    /// Returns [`CsvError::Config`] for malformed arguments.
    pub fn from_args(args: &edict_record::ProtocolArgs) -> CsvResult<Self> {
        Ok(Self::new().with_config(CsvConfig::from_args(args)?))
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Get a reader configured with this adapter's settings
    pub fn reader(&self) -> CsvReader {
        CsvReader::new().with_config(self.config.clone())
    }

    /// Get a writer configured with this adapter's settings
    pub fn writer(&self) -> CsvWriter {
        CsvWriter::new().with_config(self.config.clone())
    }
}
