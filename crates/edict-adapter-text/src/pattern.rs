//! Pattern-string output
//!
//! Each record is written as the pattern with every `{field}` placeholder
//! replaced by that field's value, followed by a newline. `{{` and `}}`
//! produce literal braces.

use std::io::Write;

use edict_record::{ProtocolArgs, Record, RecordStream, RecordWriter};
use tracing::debug;

use crate::errors::{TextError, TextResult};

/// One piece of a parsed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Writes one formatted line per record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternWriter {
    segments: Vec<Segment>,
}

impl PatternWriter {
    /// Parse `pattern` into a writer
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Pattern`] for unbalanced braces or empty
    /// placeholders.
    pub fn new(pattern: &str) -> TextResult<Self> {
        Ok(Self {
            segments: parse_pattern(pattern)?,
        })
    }

    /// Build a writer from the required `pattern` argument
    ///
    /// # Errors
    ///
    /// Returns an error when `pattern` is missing or malformed.
    pub fn from_args(args: &ProtocolArgs) -> edict_record::Result<Self> {
        let pattern = args.require("pattern", "pattern")?;
        Ok(Self::new(pattern)?)
    }

    /// Field names referenced by the pattern, in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Format a single record, without the trailing newline
    ///
    /// # Errors
    ///
    /// Returns [`TextError::MissingField`] when a placeholder names a field
    /// the record does not have.
    pub fn format(&self, record: &Record) -> TextResult<String> {
        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Field(name) => {
                    let value = record
                        .get(name)
                        .ok_or_else(|| TextError::missing_field("pattern", name))?;
                    line.push_str(value);
                }
            }
        }
        Ok(line)
    }
}

impl RecordWriter for PatternWriter {
    fn write(&self, output: &mut dyn Write, stream: RecordStream<'_>) -> edict_record::Result<()> {
        let mut count = 0usize;
        for record in stream.records {
            let line = self.format(&record?)?;
            writeln!(output, "{line}")?;
            count += 1;
        }
        debug!(record_count = count, "Finished writing pattern output");
        Ok(())
    }
}

fn parse_pattern(pattern: &str) -> TextResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => {
                            return Err(TextError::pattern(pattern, "'{' inside placeholder"));
                        }
                        Some(c) => name.push(c),
                        None => return Err(TextError::pattern(pattern, "unclosed '{'")),
                    }
                }
                if name.is_empty() {
                    return Err(TextError::pattern(pattern, "empty placeholder '{}'"));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(name));
            }
            '}' => return Err(TextError::pattern(pattern, "single '}' encountered")),
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_format_placeholders_and_escapes() {
        let writer = PatternWriter::new("{{{a}}} -> {b}!").unwrap();
        let line = writer.format(&record(&[("a", "x"), ("b", "y")])).unwrap();
        assert_eq!(line, "{x} -> y!");
        assert_eq!(writer.placeholders().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_field_names_may_contain_spaces() {
        let writer = PatternWriter::new("{first name}").unwrap();
        let line = writer.format(&record(&[("first name", "Ada")])).unwrap();
        assert_eq!(line, "Ada");
    }

    #[test]
    fn test_missing_field_is_error() {
        let writer = PatternWriter::new("{missing}").unwrap();
        let err = writer.format(&record(&[("a", "1")])).unwrap_err();
        assert_eq!(err, TextError::missing_field("pattern", "missing"));
    }

    #[test]
    fn test_malformed_patterns() {
        for (pattern, message) in [
            ("{a", "unclosed '{'"),
            ("a}", "single '}' encountered"),
            ("{}", "empty placeholder"),
            ("{a{b}}", "'{' inside placeholder"),
        ] {
            let err = PatternWriter::new(pattern).unwrap_err();
            assert!(err.to_string().contains(message), "{pattern}: {err}");
        }
    }

    #[test]
    fn test_from_args_requires_pattern() {
        let err = PatternWriter::from_args(&ProtocolArgs::new()).unwrap_err();
        assert!(err.to_string().contains("Missing protocol argument 'pattern'"));

        let writer = PatternWriter::from_args(&ProtocolArgs::new().with("pattern", "{a}")).unwrap();
        assert_eq!(writer.placeholders().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_write_one_line_per_record() {
        let writer = PatternWriter::new("{a}-{b}").unwrap();
        let stream = RecordStream::from_records(
            vec!["a".to_string(), "b".to_string()],
            vec![record(&[("a", "1"), ("b", "2")]), record(&[("a", "3"), ("b", "4")])],
        );
        let mut output = Vec::new();
        writer.write(&mut output, stream).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "1-2\n3-4\n");
    }
}
