#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

//! # edict-adapter-text
//!
//! Write-only text protocols for Edict record streams.
//!
//! - [`PatternWriter`]: one line per record from a `{field}` template
//! - [`HledgerWriter`]: one hledger transaction per record
//! - [`BeancountWriter`]: one Beancount directive per record
//!
//! ## Example Usage
//!
//! ```rust
//! use edict_adapter_text::PatternWriter;
//! use edict_record::{Record, RecordStream, RecordWriter};
//!
//! let record: Record = [("name", "Ada"), ("age", "36")].into_iter().collect();
//! let stream = RecordStream::from_records(vec!["name".into(), "age".into()], vec![record]);
//!
//! let mut output = Vec::new();
//! PatternWriter::new("{name} is {age}")?.write(&mut output, stream)?;
//! assert_eq!(String::from_utf8(output)?, "Ada is 36\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod beancount;
pub mod errors;
pub mod hledger;
pub mod pattern;
mod postings;

pub use beancount::BeancountWriter;
pub use errors::{TextError, TextResult};
pub use hledger::HledgerWriter;
pub use pattern::PatternWriter;
