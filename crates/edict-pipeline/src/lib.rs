#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # edict-pipeline
//!
//! Protocol registry and stream orchestration for Edict programs.
//!
//! This crate wires the language to its protocols: it resolves protocol
//! names to readers and writers, chains compiled programs over one record
//! stream and reports failures with the context needed to act on them.

pub mod edict;
pub mod registry;

pub use edict::{Edict, EdictOptions};
pub use registry::{ProtocolRegistry, ReaderFactory, WriterFactory};

use thiserror::Error;

/// Errors that can occur while running programs over a stream
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to compile '{path}': {source}")]
    Compile {
        path: String,
        #[source]
        source: edict_lang::Error,
    },

    #[error("Unknown protocol '{0}'")]
    UnknownProtocol(String),

    #[error("Protocol '{protocol}' does not support {operation}")]
    Unsupported {
        protocol: String,
        operation: &'static str,
    },

    #[error(transparent)]
    Stream(#[from] edict_record::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an error for a protocol that lacks a reader or writer.
    pub fn unsupported(protocol: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            protocol: protocol.into(),
            operation,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
