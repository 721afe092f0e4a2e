//! Built-in functions
//!
//! Each function has a constructor that checks arity and casts arguments to
//! their declared types while building. Evaluation assumes those types.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use edict_record::Record;

use crate::cast;
use crate::context::RuntimeContext;
use crate::expr::{Expr, Fault};
use crate::numeric;
use crate::types::{DataType, Value};
use crate::{Error, Result};

/// Builds a typed node from already-built arguments
type Constructor = fn(Vec<Expr>) -> Result<Expr>;

const FUNCTIONS: &[(&str, Constructor)] = &[
    ("as_number", build_as_number),
    ("as_string", build_as_string),
    ("casefold", build_casefold),
    ("read_date", build_read_date),
    ("substr", build_substr),
    ("replace", build_replace),
    ("round", build_round),
    ("concat", build_concat),
    ("format_record", build_format_record),
    ("input_protocol", build_input_protocol),
    ("output_protocol", build_output_protocol),
    ("log", build_log),
];

/// A call to a built-in with a non-cast body
#[derive(Debug, Clone)]
pub enum Call {
    ReadDate {
        text: Box<Expr>,
        format: Box<Expr>,
    },
    Substr {
        text: Box<Expr>,
        start: Box<Expr>,
        end: Option<Box<Expr>>,
    },
    Replace {
        text: Box<Expr>,
        old: Box<Expr>,
        new: Box<Expr>,
        count: Option<Box<Expr>>,
    },
    Round {
        value: Box<Expr>,
        digits: Option<Box<Expr>>,
    },
    Concat(Vec<Expr>),
    FormatRecord,
    InputProtocol,
    OutputProtocol,
    Log(Vec<Expr>),
}

/// Build a call to the named built-in
///
/// # Errors
///
/// Returns [`Error::Prepare`] for an unknown name, a wrong number of
/// arguments or an argument of the wrong type.
pub fn function_call(name: &str, args: Vec<Expr>) -> Result<Expr> {
    let constructor = FUNCTIONS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, constructor)| *constructor)
        .ok_or_else(|| Error::prepare(format!("No function named '{name}'")))?;
    constructor(args)
}

/// Names of every built-in function
pub fn function_names() -> impl Iterator<Item = &'static str> {
    FUNCTIONS.iter().map(|(name, _)| *name)
}

fn check_arity(name: &str, args: &[Expr], min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        format!("{min}")
    } else if max == usize::MAX {
        format!("at least {min}")
    } else {
        format!("{min} to {max}")
    };
    Err(Error::prepare(format!(
        "function '{name}' takes {expected} argument(s), got {}",
        args.len()
    )))
}

fn boxed(expr: Expr) -> Box<Expr> {
    Box::new(expr)
}

fn build_as_number(args: Vec<Expr>) -> Result<Expr> {
    check_arity("as_number", &args, 1, 2)?;
    let mut args = args.into_iter();
    let inner = args.next().ok_or_else(|| Error::prepare("as_number needs a value"))?;
    let separator = match args.next() {
        None => None,
        Some(Expr::Literal(Value::String(separator))) => Some(separator),
        Some(other) => {
            return Err(Error::prepare(format!(
                "as_number separator must be a string literal, got {other}"
            )));
        }
    };
    cast::explicit_number(inner, separator)
}

fn build_as_string(args: Vec<Expr>) -> Result<Expr> {
    check_arity("as_string", &args, 1, 1)?;
    let inner = args.into_iter().next().ok_or_else(|| Error::prepare("as_string needs a value"))?;
    cast::explicit_string(inner)
}

fn build_casefold(args: Vec<Expr>) -> Result<Expr> {
    check_arity("casefold", &args, 1, 1)?;
    let inner = args.into_iter().next().ok_or_else(|| Error::prepare("casefold needs a value"))?;
    Ok(Expr::CaseFold {
        inner: boxed(cast::as_string(inner)?),
        implicit: false,
    })
}

fn build_read_date(args: Vec<Expr>) -> Result<Expr> {
    check_arity("read_date", &args, 2, 2)?;
    let [text, format]: [Expr; 2] = args
        .try_into()
        .map_err(|_| Error::prepare("read_date takes 2 arguments"))?;
    Ok(Expr::Call(Call::ReadDate {
        text: boxed(cast::as_string(text)?),
        format: boxed(cast::as_string(format)?),
    }))
}

fn build_substr(args: Vec<Expr>) -> Result<Expr> {
    check_arity("substr", &args, 2, 3)?;
    let mut args = args.into_iter();
    let (Some(text), Some(start)) = (args.next(), args.next()) else {
        return Err(Error::prepare("substr needs a string and a start index"));
    };
    Ok(Expr::Call(Call::Substr {
        text: boxed(cast::as_string(text)?),
        start: boxed(cast::as_number(start)?),
        end: args.next().map(cast::as_number).transpose()?.map(boxed),
    }))
}

fn build_replace(args: Vec<Expr>) -> Result<Expr> {
    check_arity("replace", &args, 3, 4)?;
    let mut args = args.into_iter();
    let (Some(text), Some(old), Some(new)) = (args.next(), args.next(), args.next()) else {
        return Err(Error::prepare("replace needs a string, a target and a replacement"));
    };
    Ok(Expr::Call(Call::Replace {
        text: boxed(cast::as_string(text)?),
        old: boxed(cast::as_string(old)?),
        new: boxed(cast::as_string(new)?),
        count: args.next().map(cast::as_number).transpose()?.map(boxed),
    }))
}

fn build_round(args: Vec<Expr>) -> Result<Expr> {
    check_arity("round", &args, 1, 2)?;
    let mut args = args.into_iter();
    let value = args.next().ok_or_else(|| Error::prepare("round needs a value"))?;
    Ok(Expr::Call(Call::Round {
        value: boxed(cast::as_number(value)?),
        digits: args.next().map(cast::as_number).transpose()?.map(boxed),
    }))
}

fn build_concat(args: Vec<Expr>) -> Result<Expr> {
    check_arity("concat", &args, 1, usize::MAX)?;
    let parts = args
        .into_iter()
        .map(cast::string_encode)
        .collect::<Result<Vec<_>>>()?;
    Ok(Expr::Call(Call::Concat(parts)))
}

fn build_format_record(args: Vec<Expr>) -> Result<Expr> {
    check_arity("format_record", &args, 0, 0)?;
    Ok(Expr::Call(Call::FormatRecord))
}

fn build_input_protocol(args: Vec<Expr>) -> Result<Expr> {
    check_arity("input_protocol", &args, 0, 0)?;
    Ok(Expr::Call(Call::InputProtocol))
}

fn build_output_protocol(args: Vec<Expr>) -> Result<Expr> {
    check_arity("output_protocol", &args, 0, 0)?;
    Ok(Expr::Call(Call::OutputProtocol))
}

fn build_log(args: Vec<Expr>) -> Result<Expr> {
    check_arity("log", &args, 1, usize::MAX)?;
    let parts = args
        .into_iter()
        .map(cast::string_encode)
        .collect::<Result<Vec<_>>>()?;
    Ok(Expr::Call(Call::Log(parts)))
}

impl Call {
    /// Name used in source text
    pub fn name(&self) -> &'static str {
        match self {
            Call::ReadDate { .. } => "read_date",
            Call::Substr { .. } => "substr",
            Call::Replace { .. } => "replace",
            Call::Round { .. } => "round",
            Call::Concat(_) => "concat",
            Call::FormatRecord => "format_record",
            Call::InputProtocol => "input_protocol",
            Call::OutputProtocol => "output_protocol",
            Call::Log(_) => "log",
        }
    }

    pub fn dtype(&self) -> DataType {
        match self {
            Call::Round { .. } => DataType::Number,
            Call::Log(_) => DataType::Boolean,
            _ => DataType::String,
        }
    }

    fn args(&self) -> Vec<&Expr> {
        match self {
            Call::ReadDate { text, format } => vec![text, format],
            Call::Substr { text, start, end } => {
                let mut args = vec![text.as_ref(), start.as_ref()];
                args.extend(end.as_deref());
                args
            }
            Call::Replace {
                text,
                old,
                new,
                count,
            } => {
                let mut args = vec![text.as_ref(), old.as_ref(), new.as_ref()];
                args.extend(count.as_deref());
                args
            }
            Call::Round { value, digits } => {
                let mut args = vec![value.as_ref()];
                args.extend(digits.as_deref());
                args
            }
            Call::Concat(parts) | Call::Log(parts) => parts.iter().collect(),
            Call::FormatRecord | Call::InputProtocol | Call::OutputProtocol => Vec::new(),
        }
    }

    pub(crate) fn evaluate(&self, record: &Record, context: &RuntimeContext) -> std::result::Result<Value, Fault> {
        let value = match self {
            Call::ReadDate { text, format } => {
                let text = text.eval_string(record, context)?;
                let format = format.eval_string(record, context)?;
                Value::String(read_date(&text, &format)?)
            }
            Call::Substr { text, start, end } => {
                let chars: Vec<char> = text.eval_string(record, context)?.chars().collect();
                let start = numeric::to_integer(start.eval_number(record, context)?, "substr start")?;
                let end = match end {
                    Some(end) => Some(numeric::to_integer(end.eval_number(record, context)?, "substr end")?),
                    None => None,
                };
                let (from, to) = numeric::slice_bounds(chars.len(), start, end);
                Value::String(chars[from..to].iter().collect())
            }
            Call::Replace {
                text,
                old,
                new,
                count,
            } => {
                let text = text.eval_string(record, context)?;
                let old = old.eval_string(record, context)?;
                let new = new.eval_string(record, context)?;
                let limit = match count {
                    Some(count) => numeric::to_integer(count.eval_number(record, context)?, "replace count")?,
                    None => -1,
                };
                match usize::try_from(limit) {
                    Ok(limit) => Value::String(text.replacen(old.as_str(), &new, limit)),
                    Err(_) => Value::String(text.replace(old.as_str(), &new)),
                }
            }
            Call::Round { value, digits } => {
                let value = value.eval_number(record, context)?;
                let digits = match digits {
                    Some(digits) => numeric::to_integer(digits.eval_number(record, context)?, "round digits")?,
                    None => 0,
                };
                Value::Number(numeric::round_half_even(value, digits)?)
            }
            Call::Concat(parts) => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&part.eval_string(record, context)?);
                }
                Value::String(text)
            }
            Call::FormatRecord => Value::String(
                record
                    .iter()
                    .map(|(field, value)| format!("{field}: {value}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Call::InputProtocol => Value::String(context.input_protocol.clone()),
            Call::OutputProtocol => Value::String(context.output_protocol.clone()),
            Call::Log(parts) => {
                let words = parts
                    .iter()
                    .map(|part| part.eval_string(record, context))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                context.emit_log(&words.join(" "));
                Value::Boolean(true)
            }
        };
        Ok(value)
    }
}

fn read_date(text: &str, format: &str) -> std::result::Result<String, String> {
    let date = NaiveDate::parse_from_str(text, format)
        .or_else(|_| NaiveDateTime::parse_from_str(text, format).map(|moment| moment.date()))
        .map_err(|e| format!("cannot read date {text:?} with format {format:?}: {e}"))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, arg) in self.args().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    fn eval(expr: &Expr, record: &Record) -> Value {
        expr.evaluate(record, &RuntimeContext::new("csv", "pattern")).unwrap()
    }

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        function_call(name, args).unwrap()
    }

    fn num(text: &str) -> Expr {
        Expr::number(Decimal::from_str(text).unwrap())
    }

    fn field(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    #[test]
    fn test_unknown_function() {
        let err = function_call("nope", Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Prepare error: No function named 'nope'");
    }

    #[test]
    fn test_arity_checked_at_build_time() {
        let err = function_call("substr", vec![Expr::string("x")]).unwrap_err();
        assert!(err.to_string().contains("takes 2 to 3 argument(s), got 1"));
        assert!(function_call("format_record", vec![Expr::string("x")]).is_err());
        assert!(function_call("concat", Vec::new()).is_err());
    }

    #[test]
    fn test_as_number_custom_separator() {
        let expr = call("as_number", vec![field("n"), Expr::string(".")]);
        let row: Record = [("n", "1.234")].into_iter().collect();
        assert_eq!(eval(&expr, &row), Value::Number(Decimal::from(1234)));
    }

    #[test]
    fn test_as_number_separator_must_be_literal() {
        let err = function_call("as_number", vec![field("n"), field("sep")]).unwrap_err();
        assert!(err.to_string().contains("must be a string literal"));
    }

    #[test]
    fn test_read_date() {
        let expr = call("read_date", vec![field("d"), Expr::string("%d/%m/%Y")]);
        let row: Record = [("d", "03/02/2024")].into_iter().collect();
        assert_eq!(eval(&expr, &row), Value::from("2024-02-03"));
    }

    #[test]
    fn test_read_date_with_time_component() {
        let expr = call("read_date", vec![field("d"), Expr::string("%Y-%m-%d %H:%M")]);
        let row: Record = [("d", "2024-02-03 10:30")].into_iter().collect();
        assert_eq!(eval(&expr, &row), Value::from("2024-02-03"));
    }

    #[test]
    fn test_read_date_failure_is_runtime_error() {
        let expr = call("read_date", vec![field("d"), Expr::string("%Y")]);
        let row: Record = [("d", "garbage")].into_iter().collect();
        let err = expr.evaluate(&row, &RuntimeContext::default()).unwrap_err();
        assert!(err.message.starts_with("Error in read_date({d}, \"%Y\")"));
    }

    #[test]
    fn test_substr_slices_like_python() {
        let row: Record = [("s", "héllo")].into_iter().collect();
        assert_eq!(eval(&call("substr", vec![field("s"), num("1"), num("3")]), &row), Value::from("él"));
        assert_eq!(eval(&call("substr", vec![field("s"), num("-2")]), &row), Value::from("lo"));
        assert_eq!(eval(&call("substr", vec![field("s"), num("0"), num("-1")]), &row), Value::from("héll"));
        assert_eq!(eval(&call("substr", vec![field("s"), num("9")]), &row), Value::from(""));
    }

    #[test]
    fn test_substr_non_integer_index() {
        let expr = call("substr", vec![Expr::string("abc"), num("1.5")]);
        let err = expr.evaluate(&Record::new(), &RuntimeContext::default()).unwrap_err();
        assert!(err.message.contains("substr start must be an integer"));
    }

    #[test]
    fn test_replace_with_and_without_count() {
        let all = call("replace", vec![Expr::string("a-b-c"), Expr::string("-"), Expr::string("+")]);
        assert_eq!(eval(&all, &Record::new()), Value::from("a+b+c"));

        let once = call(
            "replace",
            vec![Expr::string("a-b-c"), Expr::string("-"), Expr::string("+"), num("1")],
        );
        assert_eq!(eval(&once, &Record::new()), Value::from("a+b-c"));

        let negative = call(
            "replace",
            vec![Expr::string("a-b-c"), Expr::string("-"), Expr::string(""), num("-1")],
        );
        assert_eq!(eval(&negative, &Record::new()), Value::from("abc"));
    }

    #[test]
    fn test_round() {
        assert_eq!(eval(&call("round", vec![num("2.5")]), &Record::new()), Value::Number(Decimal::from(2)));
        assert_eq!(
            eval(&call("round", vec![num("1.2345"), num("2")]), &Record::new()).to_string(),
            "1.23"
        );
        let err = call("round", vec![num("1"), num("0.5")])
            .evaluate(&Record::new(), &RuntimeContext::default())
            .unwrap_err();
        assert!(err.message.contains("round digits must be an integer"));
    }

    #[test]
    fn test_concat_encodes_every_part() {
        let expr = call("concat", vec![Expr::string("n="), num("1.50"), Expr::string(" "), Expr::boolean(false)]);
        assert_eq!(eval(&expr, &Record::new()), Value::from("n=1.50 false"));
    }

    #[test]
    fn test_format_record() {
        let row: Record = [("a", "1"), ("b", "two")].into_iter().collect();
        assert_eq!(eval(&call("format_record", Vec::new()), &row), Value::from("a: 1\nb: two"));
    }

    #[test]
    fn test_protocol_introspection() {
        assert_eq!(eval(&call("input_protocol", Vec::new()), &Record::new()), Value::from("csv"));
        assert_eq!(eval(&call("output_protocol", Vec::new()), &Record::new()), Value::from("pattern"));
    }

    #[test]
    fn test_log_emits_and_returns_true() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let context = RuntimeContext::default()
            .with_log_sink(move |message| sink.lock().unwrap().push(message.to_string()));
        let row: Record = [("a", "x")].into_iter().collect();

        let expr = call("log", vec![Expr::string("saw"), field("a"), num("3")]);
        assert_eq!(expr.dtype(), DataType::Boolean);
        assert_eq!(expr.evaluate(&row, &context).unwrap(), Value::Boolean(true));
        assert_eq!(*seen.lock().unwrap(), vec!["saw x 3"]);
    }

    #[test]
    fn test_display_lists_arguments() {
        let expr = call("replace", vec![field("a"), Expr::string("x"), Expr::string("y")]);
        assert_eq!(expr.to_string(), r#"replace({a}, "x", "y")"#);
        assert!(function_names().any(|name| name == "log"));
    }
}
