#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

//! # edict-record
//!
//! Record model shared by Edict programs and the protocols that feed them.
//!
//! A [`Record`] is one row: an ordered mapping of field name to string value.
//! A [`RecordStream`] pairs the ordered field names of a stream with a lazy,
//! single-pass sequence of records. Protocols implement [`RecordReader`] and
//! [`RecordWriter`] over these types and never see the language itself.

/// Order-preserving set of field names.
pub mod fields;
/// Ordered field-name to value mapping for a single row.
pub mod record;
/// Lazy record streams and the reader/writer contracts.
pub mod stream;

pub use fields::FieldSet;
pub use record::Record;
pub use stream::{ProtocolArgs, RecordIter, RecordReader, RecordStream, RecordWriter};

use thiserror::Error;

/// Errors raised while producing or consuming record streams
#[derive(Error, Debug)]
pub enum Error {
    #[error("Protocol error ({protocol}): {message}")]
    Protocol { protocol: String, message: String },

    #[error("Missing protocol argument '{key}' for protocol '{protocol}'")]
    MissingArgument { protocol: String, key: String },

    #[error("{0}")]
    Transform(Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a protocol error with the protocol name as context.
    pub fn protocol(protocol: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            protocol: protocol.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised while transforming records.
    pub fn transform(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transform(Box::new(error))
    }
}

/// Crate-local result type for record stream operations.
pub type Result<T> = std::result::Result<T, Error>;
