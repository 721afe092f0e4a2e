//! Error types for CSV adapter with context

use thiserror::Error;

/// Errors that can occur when working with CSV
#[derive(Error, Debug, Clone)]
pub enum CsvError {
    /// CSV read error with context
    #[error("CSV read error at line {line}: {message}")]
    Read { line: u64, message: String },

    /// CSV write error
    #[error("CSV write error: {0}")]
    Write(String),

    /// Input has no header row to name its columns
    #[error("First line must contain field names")]
    MissingHeader,

    /// A row carries more values than there are named columns
    #[error("Encountered value(s) {values:?} not in a named CSV column at line {line}")]
    UnnamedColumn { line: u64, values: Vec<String> },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CsvError {
    /// Create a read error at a specific line
    pub fn read_at(line: u64, message: impl Into<String>) -> Self {
        Self::Read {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a write error
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }

    /// Get the line number if available
    pub fn line_number(&self) -> Option<u64> {
        match self {
            Self::Read { line, .. } if *line > 0 => Some(*line),
            Self::UnnamedColumn { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map_or(0, csv::Position::line);
        Self::read_at(line, e.to_string())
    }
}

impl From<CsvError> for edict_record::Error {
    fn from(e: CsvError) -> Self {
        edict_record::Error::protocol("csv", e.to_string())
    }
}

/// Result type alias for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;
