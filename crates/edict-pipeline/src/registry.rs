//! Protocol registry
//!
//! Maps protocol names to reader and writer factories. Factories receive the
//! run's [`ProtocolArgs`] and are only invoked when a run starts, so a
//! misconfigured protocol that is never used never fails.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use edict_adapter_csv::CsvAdapter;
use edict_adapter_text::{BeancountWriter, HledgerWriter, PatternWriter};
use edict_record::{ProtocolArgs, RecordReader, RecordWriter};

use crate::{Error, Result};

/// Builds a reader from protocol arguments
pub type ReaderFactory =
    Arc<dyn Fn(&ProtocolArgs) -> edict_record::Result<Box<dyn RecordReader>> + Send + Sync>;

/// Builds a writer from protocol arguments
pub type WriterFactory =
    Arc<dyn Fn(&ProtocolArgs) -> edict_record::Result<Box<dyn RecordWriter>> + Send + Sync>;

/// Reader and writer factories registered under one name
#[derive(Clone, Default)]
struct Protocol {
    reader: Option<ReaderFactory>,
    writer: Option<WriterFactory>,
}

/// Named protocols available to a run
#[derive(Clone)]
pub struct ProtocolRegistry {
    protocols: BTreeMap<String, Protocol>,
}

impl ProtocolRegistry {
    /// Create a registry with no protocols
    pub fn empty() -> Self {
        Self {
            protocols: BTreeMap::new(),
        }
    }

    /// Create a registry with the built-in `csv`, `pattern`, `hledger` and
    /// `beancount` protocols
    pub fn new() -> Self {
        Self::empty()
            .with_reader("csv", |args| {
                Ok(Box::new(CsvAdapter::from_args(args)?.reader()) as Box<dyn RecordReader>)
            })
            .with_writer("csv", |args| {
                Ok(Box::new(CsvAdapter::from_args(args)?.writer()) as Box<dyn RecordWriter>)
            })
            .with_writer("pattern", |args| {
                Ok(Box::new(PatternWriter::from_args(args)?) as Box<dyn RecordWriter>)
            })
            .with_writer("hledger", |_| {
                Ok(Box::new(HledgerWriter::new()) as Box<dyn RecordWriter>)
            })
            .with_writer("beancount", |_| {
                Ok(Box::new(BeancountWriter::new()) as Box<dyn RecordWriter>)
            })
    }

    /// Register a reader factory, builder style
    #[must_use]
    pub fn with_reader<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ProtocolArgs) -> edict_record::Result<Box<dyn RecordReader>> + Send + Sync + 'static,
    {
        self.register_reader(name, factory);
        self
    }

    /// Register a writer factory, builder style
    #[must_use]
    pub fn with_writer<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ProtocolArgs) -> edict_record::Result<Box<dyn RecordWriter>> + Send + Sync + 'static,
    {
        self.register_writer(name, factory);
        self
    }

    /// Register or replace the reader factory for `name`
    pub fn register_reader<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProtocolArgs) -> edict_record::Result<Box<dyn RecordReader>> + Send + Sync + 'static,
    {
        self.protocols.entry(name.into()).or_default().reader = Some(Arc::new(factory));
    }

    /// Register or replace the writer factory for `name`
    pub fn register_writer<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProtocolArgs) -> edict_record::Result<Box<dyn RecordWriter>> + Send + Sync + 'static,
    {
        self.protocols.entry(name.into()).or_default().writer = Some(Arc::new(factory));
    }

    /// Build the reader registered as `name`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProtocol`] when no protocol has that name,
    /// [`Error::Unsupported`] when it cannot read, or the factory's error.
    pub fn reader(&self, name: &str, args: &ProtocolArgs) -> Result<Box<dyn RecordReader>> {
        let factory = self
            .lookup(name)?
            .reader
            .as_ref()
            .ok_or_else(|| Error::unsupported(name, "reading"))?;
        Ok(factory(args)?)
    }

    /// Build the writer registered as `name`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProtocol`] when no protocol has that name,
    /// [`Error::Unsupported`] when it cannot write, or the factory's error.
    pub fn writer(&self, name: &str, args: &ProtocolArgs) -> Result<Box<dyn RecordWriter>> {
        let factory = self
            .lookup(name)?
            .writer
            .as_ref()
            .ok_or_else(|| Error::unsupported(name, "writing"))?;
        Ok(factory(args)?)
    }

    /// Names of protocols that can read, sorted
    pub fn reader_names(&self) -> Vec<&str> {
        self.protocols
            .iter()
            .filter(|(_, protocol)| protocol.reader.is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Names of protocols that can write, sorted
    pub fn writer_names(&self) -> Vec<&str> {
        self.protocols
            .iter()
            .filter(|(_, protocol)| protocol.writer.is_some())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn lookup(&self, name: &str) -> Result<&Protocol> {
        self.protocols
            .get(name)
            .ok_or_else(|| Error::UnknownProtocol(name.to_string()))
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("readers", &self.reader_names())
            .field("writers", &self.writer_names())
            .finish()
    }
}
