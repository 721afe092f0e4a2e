//! Per-invocation runtime context

use std::sync::Arc;

/// Type alias for a log sink receiving `log(...)` output
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Read-only state visible to a program while it runs over one stream
#[derive(Clone, Default)]
pub struct RuntimeContext {
    /// Name of the protocol records are read with
    pub input_protocol: String,

    /// Name of the protocol records are written with
    pub output_protocol: String,

    /// Extra destination for `log(...)` messages
    log_sink: Option<LogSink>,
}

impl RuntimeContext {
    /// Create a context for the given protocol names
    pub fn new(input_protocol: impl Into<String>, output_protocol: impl Into<String>) -> Self {
        Self {
            input_protocol: input_protocol.into(),
            output_protocol: output_protocol.into(),
            log_sink: None,
        }
    }

    /// Also send `log(...)` output to `sink`
    #[must_use]
    pub fn with_log_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    /// Emit a message written by the `log` built-in
    pub fn emit_log(&self, message: &str) {
        tracing::info!(target: "edict::log", "{message}");
        if let Some(sink) = &self.log_sink {
            sink(message);
        }
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("input_protocol", &self.input_protocol)
            .field("output_protocol", &self.output_protocol)
            .field("has_log_sink", &self.log_sink.is_some())
            .finish()
    }
}
