//! Compiled programs

use edict_record::{FieldSet, Record, RecordStream};
use tracing::{debug, trace};

use crate::context::RuntimeContext;
use crate::editor::StreamEditor;
use crate::error::RuntimeError;
use crate::stmt::Stmt;

/// Header settings resolved while compiling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Fold case in string comparisons and matches
    pub case_insensitive: bool,

    /// Field that bare string and regex conditions match against
    pub default_field: Option<String>,

    /// Explicit output schema
    pub output_fields: Option<Vec<String>>,
}

/// An immutable, compiled Edict program
#[derive(Debug, Clone)]
pub struct Program {
    statements: Stmt,
    header: Header,
    pre_transform: Option<StreamEditor>,
    assigned_fields: FieldSet,
}

impl Program {
    pub(crate) fn new(
        statements: Stmt,
        header: Header,
        pre_transform: Option<StreamEditor>,
        assigned_fields: FieldSet,
    ) -> Self {
        Self {
            statements,
            header,
            pre_transform,
            assigned_fields,
        }
    }

    /// Header settings this program was compiled with
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Whole-stream reordering declared with `reverse()` or `sort(...)`
    pub fn pre_transform(&self) -> Option<&StreamEditor> {
        self.pre_transform.as_ref()
    }

    /// Every field assigned anywhere in the program, in first-assignment order
    pub fn assigned_fields(&self) -> &FieldSet {
        &self.assigned_fields
    }

    /// The root statement list
    pub fn statements(&self) -> &Stmt {
        &self.statements
    }

    pub(crate) fn into_parts(self) -> (Stmt, FieldSet) {
        (self.statements, self.assigned_fields)
    }

    /// Run the program on a copy of `record` and return the copy
    ///
    /// # Errors
    ///
    /// Returns the [`RuntimeError`] of the first failing node.
    pub fn transform(&self, record: &Record, context: &RuntimeContext) -> Result<Record, RuntimeError> {
        trace!(fields = record.len(), "transforming record");
        let mut working = record.clone();
        self.statements.execute(&mut working, context)?;
        Ok(working)
    }

    /// Output field order for a given input schema
    pub fn fields<S: AsRef<str>>(&self, input: &[S]) -> Vec<String> {
        let mut fields: FieldSet = input.iter().map(AsRef::as_ref).collect();
        self.statements.collect_fields(&mut fields);
        fields.into_vec()
    }

    /// Apply the pre-transform, then run the program over every record.
    ///
    /// Records are transformed lazily as the returned stream is pulled.
    ///
    /// # Errors
    ///
    /// Returns an error if the pre-transform fails; per-record failures are
    /// yielded as stream items.
    pub fn apply<'a>(
        &'a self,
        stream: RecordStream<'a>,
        context: RuntimeContext,
    ) -> edict_record::Result<RecordStream<'a>> {
        let stream = match &self.pre_transform {
            Some(editor) => editor.apply(stream, &context)?,
            None => stream,
        };
        let fields = self.fields(stream.fields.as_slice());
        debug!(input = ?stream.fields, output = ?fields, "program schema");

        let records = stream.records.map(move |item| {
            item.and_then(|record| {
                self.transform(&record, &context)
                    .map_err(edict_record::Error::transform)
            })
        });
        Ok(RecordStream::new(fields, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn test_program_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Program>();
    }

    #[test]
    fn test_transform_leaves_input_untouched() {
        let program = compile(r#"{a} = "changed" {b} = "new""#).unwrap();
        let input: Record = [("a", "original")].into_iter().collect();
        let before = input.clone();

        let output = program.transform(&input, &RuntimeContext::default()).unwrap();

        assert_eq!(input, before);
        assert_eq!(output.get("a"), Some("changed"));
        assert_eq!(output.get("b"), Some("new"));
    }

    #[test]
    fn test_schema_union_without_output_fields() {
        let program = compile(r#"if {a} == "never" then {c} = "x" fi"#).unwrap();
        assert_eq!(program.fields(&["a", "b"]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_output_fields_govern_schema() {
        let program = compile(r#"output_fields("b", "a") {c} = "dropped""#).unwrap();
        assert_eq!(program.fields(&["a", "b"]), vec!["b", "a"]);

        let record: Record = [("a", "1"), ("b", "2")].into_iter().collect();
        let output = program.transform(&record, &RuntimeContext::default()).unwrap();
        assert_eq!(output.iter().collect::<Vec<_>>(), vec![("b", "2"), ("a", "1")]);
    }

    #[test]
    fn test_apply_streams_lazily_with_merged_schema() {
        let program = compile(r#"{n2} = {n} * 2"#).unwrap();
        let records: Vec<Record> = ["1", "2"]
            .iter()
            .map(|n| [("n", *n)].into_iter().collect())
            .collect();
        let stream = RecordStream::from_records(vec!["n".to_string()], records);

        let output = program.apply(stream, RuntimeContext::default()).unwrap();
        assert_eq!(output.fields, vec!["n", "n2"]);
        let values: Vec<String> = output
            .collect_records()
            .unwrap()
            .iter()
            .filter_map(|r| r.get("n2").map(str::to_string))
            .collect();
        assert_eq!(values, vec!["2", "4"]);
    }

    #[test]
    fn test_apply_yields_runtime_error_item() {
        let program = compile("{x} = {n} / 0").unwrap();
        let record: Record = [("n", "1")].into_iter().collect();
        let stream = RecordStream::from_records(vec!["n".to_string()], vec![record]);
        let err = program
            .apply(stream, RuntimeContext::default())
            .unwrap()
            .collect_records()
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("division by zero"));
        assert!(text.contains("Error occurred while processing record:\n\tn: 1"));
    }
}
