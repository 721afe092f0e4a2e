//! Typed expression nodes and their evaluation
//!
//! Every node's [`DataType`] is fixed when it is built. Evaluation never
//! mutates a node; per-call state lives in the record and the
//! [`RuntimeContext`].

use std::fmt;

use edict_record::Record;
use regex::Regex;
use rust_decimal::Decimal;

use crate::context::RuntimeContext;
use crate::error::RuntimeError;
use crate::functions::Call;
use crate::numeric;
use crate::syntax::{BinaryOp, CompareOp};
use crate::types::{DataType, Value};

/// Default thousands separator removed by `as_number`
pub const DEFAULT_SEPARATOR: &str = ",";

/// A typed expression
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    /// Field lookup; a missing field reads as the empty string
    Identifier(String),
    AsString {
        inner: Box<Expr>,
        implicit: bool,
    },
    AsNumber {
        inner: Box<Expr>,
        separator: String,
        implicit: bool,
    },
    CaseFold {
        inner: Box<Expr>,
        implicit: bool,
    },
    /// String encoding of a NUMBER or BOOLEAN
    Encode(Box<Expr>),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        dtype: DataType,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Regex search
    Match {
        inner: Box<Expr>,
        pattern: Regex,
    },
    /// Plain substring containment
    SubString {
        inner: Box<Expr>,
        needle: String,
    },
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Call(Call),
}

/// Why a node failed: either a child already produced a finished error, or
/// this node failed and still has to be wrapped.
#[derive(Debug)]
pub(crate) enum Fault {
    Raised(RuntimeError),
    Message(String),
}

impl From<RuntimeError> for Fault {
    fn from(error: RuntimeError) -> Self {
        Fault::Raised(error)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Fault::Message(message)
    }
}

impl Expr {
    /// A string literal
    pub fn string(text: impl Into<String>) -> Self {
        Expr::Literal(Value::String(text.into()))
    }

    /// A number literal
    pub fn number(value: Decimal) -> Self {
        Expr::Literal(Value::Number(value))
    }

    /// A boolean literal
    pub fn boolean(value: bool) -> Self {
        Expr::Literal(Value::Boolean(value))
    }

    /// The static type of this node
    pub fn dtype(&self) -> DataType {
        match self {
            Expr::Literal(Value::String(_)) => DataType::String,
            Expr::Literal(Value::Number(_)) => DataType::Number,
            Expr::Literal(Value::Boolean(_)) => DataType::Boolean,
            Expr::Literal(Value::Unit) => DataType::None,
            Expr::Identifier(_) => DataType::IndefiniteString,
            Expr::AsString { .. } | Expr::CaseFold { .. } | Expr::Encode(_) => DataType::String,
            Expr::AsNumber { .. } | Expr::Negate(_) => DataType::Number,
            Expr::Binary { op, .. } => {
                if *op == BinaryOp::Concat {
                    DataType::String
                } else {
                    DataType::Number
                }
            }
            Expr::Compare { .. }
            | Expr::Match { .. }
            | Expr::SubString { .. }
            | Expr::Not(_)
            | Expr::And(_)
            | Expr::Or(_) => DataType::Boolean,
            Expr::Call(call) => call.dtype(),
        }
    }

    /// Evaluate against one record.
    ///
    /// # Errors
    ///
    /// A failure is wrapped once, by the node where it happened, with that
    /// node's text and the record. Enclosing nodes pass it on unchanged.
    pub fn evaluate(&self, record: &Record, context: &RuntimeContext) -> Result<Value, RuntimeError> {
        self.eval(record, context).map_err(|fault| match fault {
            Fault::Raised(error) => error,
            Fault::Message(message) => {
                RuntimeError::new(format!("Error in {self}:\n{message}")).with_record(record)
            }
        })
    }

    fn eval(&self, record: &Record, context: &RuntimeContext) -> Result<Value, Fault> {
        let value = match self {
            Expr::Literal(value) => value.clone(),
            Expr::Identifier(name) => Value::String(record.get(name).unwrap_or_default().to_string()),
            Expr::AsString { inner, .. } => Value::String(inner.eval_string(record, context)?),
            Expr::AsNumber {
                inner, separator, ..
            } => match inner.evaluate(record, context)? {
                Value::Number(number) => Value::Number(number),
                Value::String(text) => {
                    let cleaned = if separator.is_empty() {
                        text
                    } else {
                        text.replace(separator.as_str(), "")
                    };
                    Value::Number(numeric::parse_decimal(&cleaned)?)
                }
                other => return Err(mismatch("a number", &other)),
            },
            Expr::CaseFold { inner, .. } => {
                Value::String(crate::cast::fold_case(&inner.eval_string(record, context)?))
            }
            Expr::Encode(inner) => Value::String(inner.evaluate(record, context)?.to_string()),
            Expr::Negate(inner) => Value::Number(-inner.eval_number(record, context)?),
            Expr::Binary { op, lhs, rhs } => {
                if *op == BinaryOp::Concat {
                    let mut text = lhs.eval_string(record, context)?;
                    text.push_str(&rhs.eval_string(record, context)?);
                    Value::String(text)
                } else {
                    let a = lhs.eval_number(record, context)?;
                    let b = rhs.eval_number(record, context)?;
                    Value::Number(arithmetic(*op, a, b)?)
                }
            }
            Expr::Compare { op, lhs, rhs, .. } => {
                let a = lhs.evaluate(record, context)?;
                let b = rhs.evaluate(record, context)?;
                Value::Boolean(op.holds(a.compare(&b)))
            }
            Expr::Match { inner, pattern } => {
                Value::Boolean(pattern.is_match(&inner.eval_string(record, context)?))
            }
            Expr::SubString { inner, needle } => {
                Value::Boolean(inner.eval_string(record, context)?.contains(needle.as_str()))
            }
            Expr::Not(inner) => Value::Boolean(!inner.eval_boolean(record, context)?),
            Expr::And(operands) => {
                for operand in operands {
                    if !operand.eval_boolean(record, context)? {
                        return Ok(Value::Boolean(false));
                    }
                }
                Value::Boolean(true)
            }
            Expr::Or(operands) => {
                for operand in operands {
                    if operand.eval_boolean(record, context)? {
                        return Ok(Value::Boolean(true));
                    }
                }
                Value::Boolean(false)
            }
            Expr::Call(call) => call.evaluate(record, context)?,
        };
        Ok(value)
    }

    pub(crate) fn eval_string(&self, record: &Record, context: &RuntimeContext) -> Result<String, Fault> {
        match self.evaluate(record, context)? {
            Value::String(text) => Ok(text),
            other => Err(mismatch("a string", &other)),
        }
    }

    pub(crate) fn eval_number(&self, record: &Record, context: &RuntimeContext) -> Result<Decimal, Fault> {
        match self.evaluate(record, context)? {
            Value::Number(number) => Ok(number),
            other => Err(mismatch("a number", &other)),
        }
    }

    pub(crate) fn eval_boolean(&self, record: &Record, context: &RuntimeContext) -> Result<bool, Fault> {
        match self.evaluate(record, context)? {
            Value::Boolean(flag) => Ok(flag),
            other => Err(mismatch("a boolean", &other)),
        }
    }
}

fn arithmetic(op: BinaryOp, a: Decimal, b: Decimal) -> Result<Decimal, String> {
    match op {
        BinaryOp::Add => numeric::add(a, b),
        BinaryOp::Subtract => numeric::subtract(a, b),
        BinaryOp::Multiply => numeric::multiply(a, b),
        BinaryOp::Divide => numeric::divide(a, b),
        BinaryOp::Modulo => numeric::floor_mod(a, b),
        BinaryOp::Concat => Err("'.' is not an arithmetic operator".to_string()),
    }
}

fn mismatch(expected: &str, got: &Value) -> Fault {
    Fault::Message(format!("expected {expected}, got {got:?}"))
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Expr], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{operand}")?;
    }
    f.write_str(")")
}

/// Source-like text of a node, used in error messages
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(text)) => write!(f, "{text:?}"),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Identifier(name) => write!(f, "{{{name}}}"),
            Expr::AsString {
                inner,
                implicit: true,
            }
            | Expr::AsNumber {
                inner,
                implicit: true,
                ..
            }
            | Expr::CaseFold {
                inner,
                implicit: true,
            }
            | Expr::Encode(inner) => write!(f, "{inner}"),
            Expr::AsString { inner, .. } => write!(f, "as_string({inner})"),
            Expr::AsNumber {
                inner, separator, ..
            } => {
                if separator == DEFAULT_SEPARATOR {
                    write!(f, "as_number({inner})")
                } else {
                    write!(f, "as_number({inner}, {separator:?})")
                }
            }
            Expr::CaseFold { inner, .. } => write!(f, "casefold({inner})"),
            Expr::Negate(inner) => write!(f, "-{inner}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Compare { op, lhs, rhs, .. } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Match { inner, pattern } => write!(f, "({inner} ~ /{}/)", pattern.as_str()),
            Expr::SubString { inner, needle } => write!(f, "({inner} ~ {needle:?})"),
            Expr::Not(inner) => write!(f, "not {inner}"),
            Expr::And(operands) => write_joined(f, operands, " and "),
            Expr::Or(operands) => write_joined(f, operands, " or "),
            Expr::Call(call) => write!(f, "{call}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    fn field_number(name: &str) -> Expr {
        Expr::AsNumber {
            inner: Box::new(Expr::Identifier(name.to_string())),
            separator: DEFAULT_SEPARATOR.to_string(),
            implicit: true,
        }
    }

    #[test]
    fn test_missing_field_reads_empty() {
        let value = Expr::Identifier("nope".to_string())
            .evaluate(&Record::new(), &RuntimeContext::default())
            .unwrap();
        assert_eq!(value, Value::from(""));
    }

    #[test]
    fn test_as_number_strips_separator() {
        let value = field_number("n")
            .evaluate(&record(&[("n", "1,234.50")]), &RuntimeContext::default())
            .unwrap();
        assert_eq!(value, Value::Number(dec("1234.50")));
    }

    #[test]
    fn test_as_number_failure_names_node_and_record() {
        let err = field_number("n")
            .evaluate(&record(&[("n", "abc")]), &RuntimeContext::default())
            .unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Error in {n}:\ncannot convert"));
        assert!(text.contains("Error occurred while processing record:\n\tn: abc"));
    }

    #[test]
    fn test_error_is_wrapped_once() {
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::number(Decimal::ONE)),
            rhs: Box::new(Expr::Binary {
                op: BinaryOp::Divide,
                lhs: Box::new(Expr::number(Decimal::ONE)),
                rhs: Box::new(Expr::number(Decimal::ZERO)),
            }),
        };
        let err = expr
            .evaluate(&Record::new(), &RuntimeContext::default())
            .unwrap_err();
        assert_eq!(err.message, "Error in (1 / 0):\ndivision by zero");
    }

    #[test]
    fn test_exact_decimal_sum() {
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::number(dec("0.1"))),
            rhs: Box::new(Expr::number(dec("0.2"))),
        };
        let value = expr.evaluate(&Record::new(), &RuntimeContext::default()).unwrap();
        assert_eq!(value, Value::Number(dec("0.3")));
        assert_eq!(value.to_string(), "0.3");
    }

    #[test]
    fn test_and_short_circuits() {
        let failing = Expr::Binary {
            op: BinaryOp::Divide,
            lhs: Box::new(Expr::number(Decimal::ONE)),
            rhs: Box::new(Expr::number(Decimal::ZERO)),
        };
        let poisoned = Expr::Compare {
            op: CompareOp::Eq,
            dtype: DataType::Number,
            lhs: Box::new(failing),
            rhs: Box::new(Expr::number(Decimal::ONE)),
        };
        let context = RuntimeContext::default();

        let and = Expr::And(vec![Expr::boolean(false), poisoned.clone()]);
        assert_eq!(and.evaluate(&Record::new(), &context).unwrap(), Value::Boolean(false));

        let or = Expr::Or(vec![Expr::boolean(true), poisoned.clone()]);
        assert_eq!(or.evaluate(&Record::new(), &context).unwrap(), Value::Boolean(true));

        let or = Expr::Or(vec![Expr::boolean(false), poisoned]);
        assert!(or.evaluate(&Record::new(), &context).is_err());
    }

    #[test]
    fn test_numeric_comparison_is_numeric() {
        let expr = Expr::Compare {
            op: CompareOp::Lt,
            dtype: DataType::Number,
            lhs: Box::new(field_number("n")),
            rhs: Box::new(Expr::number(dec("10"))),
        };
        let value = expr
            .evaluate(&record(&[("n", "9")]), &RuntimeContext::default())
            .unwrap();
        assert_eq!(value, Value::Boolean(true));
    }

    #[test]
    fn test_match_and_substring() {
        let subject = || Box::new(Expr::Identifier("a".to_string()));
        let row = record(&[("a", "Coffee shop")]);
        let context = RuntimeContext::default();

        let regex = Expr::Match {
            inner: subject(),
            pattern: Regex::new("^Cof+ee").unwrap(),
        };
        assert_eq!(regex.evaluate(&row, &context).unwrap(), Value::Boolean(true));

        let contains = Expr::SubString {
            inner: subject(),
            needle: "shop".to_string(),
        };
        assert_eq!(contains.evaluate(&row, &context).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_display_is_source_like() {
        let expr = Expr::Binary {
            op: BinaryOp::Concat,
            lhs: Box::new(Expr::AsString {
                inner: Box::new(Expr::Identifier("a".to_string())),
                implicit: true,
            }),
            rhs: Box::new(Expr::string("x")),
        };
        assert_eq!(expr.to_string(), r#"({a} . "x")"#);
        assert_eq!(expr.dtype(), DataType::String);
    }
}
