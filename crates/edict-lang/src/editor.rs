//! Whole-stream pre-transforms
//!
//! Both editors read the entire input before yielding the first record.

use edict_record::{Record, RecordStream};
use tracing::debug;

use crate::context::RuntimeContext;
use crate::expr::Expr;

/// A reordering applied to the stream before any rule runs
#[derive(Debug, Clone)]
pub enum StreamEditor {
    /// `reverse()`
    Reverse,
    /// `sort(key)`, stable and ascending
    Sort { key: Expr },
}

impl StreamEditor {
    /// Directive name for this editor
    pub fn name(&self) -> &'static str {
        match self {
            StreamEditor::Reverse => "reverse",
            StreamEditor::Sort { .. } => "sort",
        }
    }

    /// Materialise `stream` and return it reordered
    ///
    /// # Errors
    ///
    /// Returns the first error read from the input, or the first sort key
    /// that fails to evaluate.
    pub fn apply<'a>(
        &self,
        stream: RecordStream<'a>,
        context: &RuntimeContext,
    ) -> edict_record::Result<RecordStream<'a>> {
        let fields = stream.fields;
        let mut records = stream
            .records
            .collect::<edict_record::Result<Vec<Record>>>()?;
        debug!(editor = self.name(), records = records.len(), "buffered input stream");

        match self {
            StreamEditor::Reverse => records.reverse(),
            StreamEditor::Sort { key } => {
                let mut keyed = records
                    .into_iter()
                    .map(|record| key.evaluate(&record, context).map(|value| (value, record)))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(edict_record::Error::transform)?;
                keyed.sort_by(|(a, _), (b, _)| a.compare(b));
                records = keyed.into_iter().map(|(_, record)| record).collect();
            }
        }
        Ok(RecordStream::from_records(fields, records))
    }
}
