//! Executable statements
//!
//! Statements run against a mutable working record. Each one can also
//! report the fields it may produce without running anything, which is how
//! the output schema is derived.

use edict_record::{FieldSet, Record};

use crate::context::RuntimeContext;
use crate::error::RuntimeError;
use crate::expr::Expr;
use crate::types::Value;
use crate::{Error, Result};

/// A statement node
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `{field} = value`, the value already string-encoded
    Assignment { field: String, value: Expr },
    /// Evaluate and discard
    BareExpression(Expr),
    Statements(Vec<Stmt>),
    Rule(Rule),
    /// Keep exactly these fields, in this order
    Fields(Vec<String>),
}

/// Conditional branches; the first true condition wins
#[derive(Debug, Clone)]
pub struct Rule {
    branches: Vec<(Expr, Stmt)>,
    otherwise: Option<Box<Stmt>>,
}

impl Rule {
    /// Create a rule from `(condition, body)` pairs and an optional `else`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prepare`] when there are no conditions.
    pub fn new(branches: Vec<(Expr, Stmt)>, otherwise: Option<Stmt>) -> Result<Self> {
        if branches.is_empty() {
            return Err(Error::prepare("a rule needs at least one condition"));
        }
        Ok(Self {
            branches,
            otherwise: otherwise.map(Box::new),
        })
    }

    fn execute(&self, record: &mut Record, context: &RuntimeContext) -> std::result::Result<(), RuntimeError> {
        for (condition, body) in &self.branches {
            if condition.evaluate(record, context)? == Value::Boolean(true) {
                return body.execute(record, context);
            }
        }
        match &self.otherwise {
            Some(body) => body.execute(record, context),
            None => Ok(()),
        }
    }

    fn collect_fields(&self, fields: &mut FieldSet) {
        for (_, body) in &self.branches {
            body.collect_fields(fields);
        }
        if let Some(body) = &self.otherwise {
            body.collect_fields(fields);
        }
    }
}

impl Stmt {
    /// Run against the working record
    ///
    /// # Errors
    ///
    /// Returns the first [`RuntimeError`] raised by an expression.
    pub fn execute(&self, record: &mut Record, context: &RuntimeContext) -> std::result::Result<(), RuntimeError> {
        match self {
            Stmt::Assignment { field, value } => {
                let value = value.evaluate(record, context)?;
                record.insert(field.clone(), value.to_string());
            }
            Stmt::BareExpression(expr) => {
                expr.evaluate(record, context)?;
            }
            Stmt::Statements(statements) => {
                for statement in statements {
                    statement.execute(record, context)?;
                }
            }
            Stmt::Rule(rule) => rule.execute(record, context)?,
            Stmt::Fields(names) => *record = record.select(names),
        }
        Ok(())
    }

    /// Add every field this statement may produce, without evaluating
    /// anything. A `Fields` statement replaces what came before it.
    pub fn collect_fields(&self, fields: &mut FieldSet) {
        match self {
            Stmt::Assignment { field, .. } => {
                fields.insert(field.as_str());
            }
            Stmt::BareExpression(_) => {}
            Stmt::Statements(statements) => {
                for statement in statements {
                    statement.collect_fields(fields);
                }
            }
            Stmt::Rule(rule) => rule.collect_fields(fields),
            Stmt::Fields(names) => {
                fields.clear();
                fields.extend(names.iter().map(String::as_str));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::CompareOp;
    use crate::types::DataType;

    fn assign(field: &str, value: &str) -> Stmt {
        Stmt::Assignment {
            field: field.to_string(),
            value: Expr::string(value),
        }
    }

    fn field_equals(field: &str, text: &str) -> Expr {
        Expr::Compare {
            op: CompareOp::Eq,
            dtype: DataType::String,
            lhs: Box::new(Expr::AsString {
                inner: Box::new(Expr::Identifier(field.to_string())),
                implicit: true,
            }),
            rhs: Box::new(Expr::string(text)),
        }
    }

    fn names(fields: &FieldSet) -> Vec<&str> {
        fields.iter().collect()
    }

    #[test]
    fn test_rule_requires_a_condition() {
        let err = Rule::new(Vec::new(), Some(assign("a", "x"))).unwrap_err();
        assert!(matches!(err, Error::Prepare(_)));
    }

    #[test]
    fn test_first_true_branch_wins() {
        let rule = Stmt::Rule(
            Rule::new(
                vec![
                    (field_equals("a", "1"), assign("b", "first")),
                    (field_equals("a", "1"), assign("b", "second")),
                ],
                Some(assign("b", "else")),
            )
            .unwrap(),
        );
        let mut record: Record = [("a", "1")].into_iter().collect();
        rule.execute(&mut record, &RuntimeContext::default()).unwrap();
        assert_eq!(record.get("b"), Some("first"));

        let mut record: Record = [("a", "2")].into_iter().collect();
        rule.execute(&mut record, &RuntimeContext::default()).unwrap();
        assert_eq!(record.get("b"), Some("else"));
    }

    #[test]
    fn test_no_match_without_else_does_nothing() {
        let rule = Stmt::Rule(Rule::new(vec![(Expr::boolean(false), assign("b", "x"))], None).unwrap());
        let mut record: Record = [("a", "1")].into_iter().collect();
        rule.execute(&mut record, &RuntimeContext::default()).unwrap();
        assert_eq!(record, [("a", "1")].into_iter().collect::<Record>());
    }

    #[test]
    fn test_assignment_string_encodes() {
        let stmt = Stmt::Assignment {
            field: "flag".to_string(),
            value: Expr::Encode(Box::new(Expr::boolean(true))),
        };
        let mut record = Record::new();
        stmt.execute(&mut record, &RuntimeContext::default()).unwrap();
        assert_eq!(record.get("flag"), Some("true"));
        assert_eq!(Expr::boolean(true).evaluate(&record, &RuntimeContext::default()).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_fields_selects_in_order() {
        let stmt = Stmt::Fields(vec!["c".to_string(), "a".to_string(), "missing".to_string()]);
        let mut record: Record = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        stmt.execute(&mut record, &RuntimeContext::default()).unwrap();
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["c", "a"]);
    }

    #[test]
    fn test_collect_fields_visits_every_branch() {
        let stmt = Stmt::Statements(vec![
            assign("x", "1"),
            Stmt::Rule(
                Rule::new(
                    vec![(Expr::boolean(false), assign("y", "1"))],
                    Some(assign("z", "1")),
                )
                .unwrap(),
            ),
            assign("x", "2"),
        ]);
        let mut fields: FieldSet = ["a"].into_iter().collect();
        stmt.collect_fields(&mut fields);
        assert_eq!(names(&fields), vec!["a", "x", "y", "z"]);
    }

    #[test]
    fn test_collect_fields_reset_by_fields_statement() {
        let stmt = Stmt::Statements(vec![
            assign("x", "1"),
            Stmt::Fields(vec!["b".to_string(), "a".to_string()]),
        ]);
        let mut fields: FieldSet = ["a", "b", "c"].into_iter().collect();
        stmt.collect_fields(&mut fields);
        assert_eq!(names(&fields), vec!["b", "a"]);
    }
}
