//! CSV configuration options

use edict_record::ProtocolArgs;

use crate::errors::{CsvError, CsvResult};

/// Configuration for CSV reading and writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvConfig {
    /// Field delimiter character (default: comma)
    pub delimiter: char,
    /// Quote character for fields containing special characters (default: double quote)
    pub quote_char: char,
    /// Record terminator used when writing (default: LF)
    pub record_terminator: RecordTerminator,
}

/// Record terminator for writing CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTerminator {
    /// CRLF (Windows-style, RFC 4180)
    CRLF,
    /// LF (Unix-style)
    LF,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            record_terminator: RecordTerminator::LF,
        }
    }
}

impl CsvConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from protocol arguments.
    ///
    /// Recognised keys: `delimiter` and `quote`, each a single ASCII character.
    ///
    /// # Errors
    ///
    /// Returns [`CsvError::Config`] when a value is not a single ASCII character.
    pub fn from_args(args: &ProtocolArgs) -> CsvResult<Self> {
        let mut config = Self::default();
        if let Some(value) = args.get("delimiter") {
            config.delimiter = single_ascii("delimiter", value)?;
        }
        if let Some(value) = args.get("quote") {
            config.quote_char = single_ascii("quote", value)?;
        }
        Ok(config)
    }

    /// Set the delimiter character
    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character
    #[must_use]
    pub fn quote_char(mut self, quote_char: char) -> Self {
        self.quote_char = quote_char;
        self
    }

    /// Set record terminator
    #[must_use]
    pub fn record_terminator(mut self, terminator: RecordTerminator) -> Self {
        self.record_terminator = terminator;
        self
    }

    /// Convert delimiter to u8 for csv crate
    pub fn delimiter_u8(&self) -> u8 {
        self.delimiter as u8
    }

    /// Convert quote char to u8 for csv crate
    pub fn quote_char_u8(&self) -> u8 {
        self.quote_char as u8
    }

    pub(crate) fn terminator(&self) -> csv::Terminator {
        match self.record_terminator {
            RecordTerminator::CRLF => csv::Terminator::CRLF,
            RecordTerminator::LF => csv::Terminator::Any(b'\n'),
        }
    }
}

fn single_ascii(key: &str, value: &str) -> CsvResult<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(CsvError::config(format!(
            "'{key}' must be a single ASCII character, got {value:?}"
        ))),
    }
}
