//! Compile-time and runtime errors

use std::fmt;

use edict_record::Record;
use thiserror::Error;

use crate::token::Position;

/// Errors raised while compiling or running an Edict program
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed source text
    #[error("Lex error at {position}: {message}")]
    Lex { position: Position, message: String },

    /// Token sequence does not match the grammar
    #[error("Parse error at {position}: {message}")]
    Parse { position: Position, message: String },

    /// Semantic or type error found while building the typed program
    #[error("Prepare error: {0}")]
    Prepare(String),

    /// An imported program failed to compile
    #[error("Error importing '{path}': {source}")]
    Import {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// A source file could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Evaluation failed on a specific record
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// Build a lex error at a source position.
    pub fn lex(position: Position, message: impl Into<String>) -> Self {
        Self::Lex {
            position,
            message: message.into(),
        }
    }

    /// Build a parse error at a source position.
    pub fn parse(position: Position, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Build a prepare error.
    pub fn prepare(message: impl Into<String>) -> Self {
        Self::Prepare(message.into())
    }
}

/// An error raised while evaluating a program against one record.
///
/// The message names the node that failed; the record, when attached, is
/// dumped field by field after it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    /// What went wrong and in which node
    pub message: String,
    /// The record being processed
    pub record: Option<Record>,
}

impl RuntimeError {
    /// Create a runtime error without record context
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            record: None,
        }
    }

    /// Attach the record that was being processed
    #[must_use]
    pub fn with_record(mut self, record: &Record) -> Self {
        self.record = Some(record.clone());
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(record) = &self.record {
            write!(f, "\nError occurred while processing record:")?;
            for (field, value) in record.iter() {
                write!(f, "\n\t{field}: {value}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_dumps_record() {
        let record: Record = [("a", "1"), ("b", "x")].into_iter().collect();
        let error = RuntimeError::new("Error in {a}: boom").with_record(&record);
        assert_eq!(
            error.to_string(),
            "Error in {a}: boom\nError occurred while processing record:\n\ta: 1\n\tb: x"
        );
    }

    #[test]
    fn test_runtime_error_without_record() {
        let error = RuntimeError::new("boom");
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_lex_error_reports_position() {
        let error = Error::lex(Position::new(3, 7), "bad escape");
        assert_eq!(error.to_string(), "Lex error at line 3, column 7: bad escape");
    }
}
