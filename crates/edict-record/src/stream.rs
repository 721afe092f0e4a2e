//! Record streams and protocol contracts

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};

use crate::{Error, Record, Result};

/// Lazy, single-pass sequence of records.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

/// Ordered field names plus the records that carry them.
pub struct RecordStream<'a> {
    /// Field names, in output order
    pub fields: Vec<String>,
    /// The records themselves, pulled on demand
    pub records: RecordIter<'a>,
}

impl<'a> RecordStream<'a> {
    /// Create a stream from field names and a record iterator
    pub fn new(
        fields: Vec<String>,
        records: impl Iterator<Item = Result<Record>> + 'a,
    ) -> Self {
        Self {
            fields,
            records: Box::new(records),
        }
    }

    /// Create a stream over already materialised records
    pub fn from_records(fields: Vec<String>, records: Vec<Record>) -> Self {
        Self::new(fields, records.into_iter().map(Ok))
    }

    /// Pull every record, stopping at the first error
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by the stream.
    pub fn collect_records(self) -> Result<Vec<Record>> {
        self.records.collect()
    }
}

impl fmt::Debug for RecordStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Free-form arguments handed to protocol factories (e.g. a pattern string).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolArgs {
    values: BTreeMap<String, String>,
}

impl ProtocolArgs {
    /// Create an empty argument map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace an argument
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get an argument
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get an argument the given protocol cannot work without
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] when the key is absent.
    pub fn require(&self, protocol: &str, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::MissingArgument {
            protocol: protocol.to_string(),
            key: key.to_string(),
        })
    }

    /// Iterate over arguments in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check whether no arguments were given
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProtocolArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ProtocolArgs {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Reads a record stream from raw input.
///
/// Implementations must yield an error item for any row holding a value that
/// is not associated with a named column.
pub trait RecordReader {
    /// Read the header eagerly and return a lazy stream over the rows
    ///
    /// # Errors
    ///
    /// Returns an error when the field names cannot be read.
    fn read<'a>(&self, input: Box<dyn Read + 'a>) -> Result<RecordStream<'a>>;
}

/// Serializes a record stream. Writers hold no business logic.
pub trait RecordWriter {
    /// Write every record of `stream` to `output`
    ///
    /// # Errors
    ///
    /// Returns the first stream or serialization error encountered.
    fn write(&self, output: &mut dyn Write, stream: RecordStream<'_>) -> Result<()>;
}
