#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

//! # edict-lang
//!
//! The Edict rule language: lexer, parser, type resolver and interpreter.
//!
//! Source text is tokenized, parsed into a syntax tree and built into an
//! immutable [`Program`] of typed nodes. A program transforms one
//! [`Record`](edict_record::Record) at a time, or a whole
//! [`RecordStream`](edict_record::RecordStream) via [`Program::apply`].
//!
//! ```
//! use edict_lang::{compile, RuntimeContext};
//! use edict_record::Record;
//!
//! let program = compile(
//!     r#"default_field({a}) case_insensitive(true)
//!        if "foo" then {b} = "hit" else {b} = "miss" fi"#,
//! )?;
//! let record: Record = [("a", "FOO"), ("b", "x")].into_iter().collect();
//! let output = program.transform(&record, &RuntimeContext::default())?;
//! assert_eq!(output.get("b"), Some("hit"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod cast;
pub mod context;
pub mod editor;
pub mod error;
pub mod expr;
pub mod functions;
pub mod lexer;
pub mod loader;
mod numeric;
pub mod parser;
pub mod program;
pub mod stmt;
pub mod syntax;
pub mod token;
pub mod types;

use std::path::Path;

pub use builder::Compiler;
pub use context::{LogSink, RuntimeContext};
pub use editor::StreamEditor;
pub use error::{Error, RuntimeError};
pub use expr::Expr;
pub use loader::{FileSystemLoader, MemoryLoader, SourceLoader};
pub use program::{Header, Program};
pub use stmt::{Rule, Stmt};
pub use types::{DataType, Value};

pub type Result<T> = std::result::Result<T, Error>;

/// Compile source text, resolving imports on the file system
///
/// # Errors
///
/// Returns a lex, parse, prepare or import error.
pub fn compile(source: &str) -> Result<Program> {
    Compiler::new().compile_str(source)
}

/// Compile a rule file, resolving imports relative to it
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not compile.
pub fn compile_file(path: impl AsRef<Path>) -> Result<Program> {
    Compiler::new().compile_file(path)
}
