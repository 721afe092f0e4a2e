//! Stream orchestration
//!
//! An [`Edict`] runs one or more compiled programs over a single record
//! stream: reader, then each program in order (its pre-transform first),
//! then writer. Each program sees the previous program's output schema and
//! records. With no programs the stream passes through unchanged.

use std::io::{Read, Write};
use std::path::Path;

use edict_lang::{LogSink, Program, RuntimeContext};
use edict_record::{ProtocolArgs, RecordStream};
use tracing::{debug, info};

use crate::registry::ProtocolRegistry;
use crate::{Error, Result};

/// Protocol selection for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdictOptions {
    /// Protocol used to read the input (default: csv)
    pub read_protocol: String,
    /// Protocol used to write the output (default: csv)
    pub write_protocol: String,
    /// Arguments handed to both protocol factories
    pub protocol_args: ProtocolArgs,
}

impl Default for EdictOptions {
    fn default() -> Self {
        Self {
            read_protocol: "csv".to_string(),
            write_protocol: "csv".to_string(),
            protocol_args: ProtocolArgs::new(),
        }
    }
}

impl EdictOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read protocol
    #[must_use]
    pub fn read_protocol(mut self, name: impl Into<String>) -> Self {
        self.read_protocol = name.into();
        self
    }

    /// Set the write protocol
    #[must_use]
    pub fn write_protocol(mut self, name: impl Into<String>) -> Self {
        self.write_protocol = name.into();
        self
    }

    /// Set the protocol arguments
    #[must_use]
    pub fn protocol_args(mut self, args: ProtocolArgs) -> Self {
        self.protocol_args = args;
        self
    }
}

/// A chain of compiled programs plus the protocols to run them with
pub struct Edict {
    programs: Vec<Program>,
    options: EdictOptions,
    registry: ProtocolRegistry,
    log_sink: Option<LogSink>,
}

impl Edict {
    /// Chain `programs` in order, using the built-in protocols
    pub fn new(programs: Vec<Program>) -> Self {
        Self {
            programs,
            options: EdictOptions::default(),
            registry: ProtocolRegistry::default(),
            log_sink: None,
        }
    }

    /// Compile each rule file and chain the results in order
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compile`] naming the first file that fails.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let programs = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                debug!(path = %path.display(), "Compiling rule file");
                edict_lang::compile_file(path).map_err(|source| Error::Compile {
                    path: path.display().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(programs))
    }

    /// Set the run options
    #[must_use]
    pub fn with_options(mut self, options: EdictOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the protocol registry
    #[must_use]
    pub fn with_registry(mut self, registry: ProtocolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Route `log(...)` output to `sink` in addition to tracing
    #[must_use]
    pub fn with_log_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_sink = Some(std::sync::Arc::new(sink));
        self
    }

    /// The chained programs, in execution order
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// The run options
    pub fn options(&self) -> &EdictOptions {
        &self.options
    }

    /// Context handed to every program of a run
    pub fn context(&self) -> RuntimeContext {
        let context = RuntimeContext::new(
            self.options.read_protocol.clone(),
            self.options.write_protocol.clone(),
        );
        match &self.log_sink {
            Some(sink) => {
                let sink = sink.clone();
                context.with_log_sink(move |message| sink(message))
            }
            None => context,
        }
    }

    /// Run every program over `stream`, in order
    ///
    /// # Errors
    ///
    /// Returns an error if a pre-transform fails while buffering its input.
    pub fn transform<'a>(&'a self, stream: RecordStream<'a>) -> Result<RecordStream<'a>> {
        let context = self.context();
        let mut stream = stream;
        for (index, program) in self.programs.iter().enumerate() {
            stream = program.apply(stream, context.clone())?;
            debug!(program = index, fields = ?stream.fields, "Chained program");
        }
        Ok(stream)
    }

    /// Read `input`, transform it, and write the result to `output`
    ///
    /// Both protocols are resolved before any input is read.
    ///
    /// # Errors
    ///
    /// Returns the first protocol, stream or runtime error. Records written
    /// before the error stay written.
    pub fn run(&self, input: Box<dyn Read + '_>, output: &mut dyn Write) -> Result<()> {
        let args = &self.options.protocol_args;
        let reader = self.registry.reader(&self.options.read_protocol, args)?;
        let writer = self.registry.writer(&self.options.write_protocol, args)?;
        info!(
            read = %self.options.read_protocol,
            write = %self.options.write_protocol,
            programs = self.programs.len(),
            "Starting run"
        );

        let stream = reader.read(input)?;
        let stream = self.transform(stream)?;
        writer.write(output, stream)?;
        output.flush()?;
        debug!("Run finished");
        Ok(())
    }
}

impl std::fmt::Debug for Edict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edict")
            .field("programs", &self.programs.len())
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("has_log_sink", &self.log_sink.is_some())
            .finish()
    }
}
