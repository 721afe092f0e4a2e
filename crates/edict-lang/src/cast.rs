//! Static casts applied while building
//!
//! INDEFINITE_STRING casts to STRING or NUMBER. STRING, NUMBER and BOOLEAN
//! only cast to themselves. Anything else is a prepare error.

use crate::expr::{DEFAULT_SEPARATOR, Expr};
use crate::types::{DataType, Value};
use crate::{Error, Result};

/// The one fold used for literal sides at build time and dynamic sides at
/// evaluation time.
pub fn fold_case(text: &str) -> String {
    caseless::default_case_fold_str(text)
}

fn check_interpret(expr: &Expr, dtype: DataType) -> Result<()> {
    let actual = expr.dtype();
    if actual == dtype || actual == DataType::IndefiniteString {
        Ok(())
    } else {
        Err(Error::prepare(format!(
            "cannot interpret {actual} as {dtype} in {expr}"
        )))
    }
}

/// Explicit `as_string(x)`
pub(crate) fn explicit_string(inner: Expr) -> Result<Expr> {
    check_interpret(&inner, DataType::String)?;
    Ok(Expr::AsString {
        inner: Box::new(inner),
        implicit: false,
    })
}

/// Explicit `as_number(x[, separator])`
pub(crate) fn explicit_number(inner: Expr, separator: Option<String>) -> Result<Expr> {
    check_interpret(&inner, DataType::Number)?;
    Ok(Expr::AsNumber {
        inner: Box::new(inner),
        separator: separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
        implicit: false,
    })
}

pub(crate) fn as_string(inner: Expr) -> Result<Expr> {
    if inner.dtype() == DataType::String {
        return Ok(inner);
    }
    check_interpret(&inner, DataType::String)?;
    Ok(Expr::AsString {
        inner: Box::new(inner),
        implicit: true,
    })
}

pub(crate) fn as_number(inner: Expr) -> Result<Expr> {
    if inner.dtype() == DataType::Number {
        return Ok(inner);
    }
    check_interpret(&inner, DataType::Number)?;
    Ok(Expr::AsNumber {
        inner: Box::new(inner),
        separator: DEFAULT_SEPARATOR.to_string(),
        implicit: true,
    })
}

/// Only an exact BOOLEAN passes; there is no implicit conversion.
pub(crate) fn as_boolean(inner: Expr) -> Result<Expr> {
    if inner.dtype() == DataType::Boolean {
        Ok(inner)
    } else {
        Err(Error::prepare(format!(
            "cannot interpret {} as {} in {inner}",
            inner.dtype(),
            DataType::Boolean
        )))
    }
}

pub(crate) fn as_type(inner: Expr, dtype: DataType) -> Result<Expr> {
    match dtype {
        DataType::String => as_string(inner),
        DataType::Number => as_number(inner),
        DataType::Boolean => as_boolean(inner),
        other => Err(Error::prepare(format!("cannot cast to {other}"))),
    }
}

/// Encode any value-producing node as a string
pub(crate) fn string_encode(inner: Expr) -> Result<Expr> {
    match inner.dtype() {
        DataType::String | DataType::IndefiniteString => Ok(inner),
        DataType::Number | DataType::Boolean => Ok(Expr::Encode(Box::new(inner))),
        other => Err(Error::prepare(format!(
            "no string encoding for value of type {other} in {inner}"
        ))),
    }
}

/// Case-fold a STRING node: literals are folded now, anything else when
/// evaluated.
pub(crate) fn casefold(inner: Expr) -> Expr {
    match inner {
        Expr::Literal(Value::String(text)) => Expr::Literal(Value::String(fold_case(&text))),
        other => Expr::CaseFold {
            inner: Box::new(other),
            implicit: true,
        },
    }
}
