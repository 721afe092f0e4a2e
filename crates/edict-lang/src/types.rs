//! Static data types and runtime values

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;

/// The static type of a program element, fixed when the node is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Statements and other nodes that produce nothing
    None,
    String,
    /// Exact decimal number
    Number,
    Boolean,
    /// A raw field value, castable to STRING or NUMBER
    IndefiniteString,
    /// Regex literal; only exists while building
    Regex,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::None => "NONE",
            DataType::String => "STRING",
            DataType::Number => "NUMBER",
            DataType::Boolean => "BOOLEAN",
            DataType::IndefiniteString => "INDEFINITE_STRING",
            DataType::Regex => "REGEX",
        };
        f.write_str(name)
    }
}

/// A value produced by evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Number(Decimal),
    Boolean(bool),
    Unit,
}

impl Value {
    /// Order two values of the same kind. Values of different kinds order by
    /// their string encoding.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

/// The string encoding used for assignments and `concat`
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(true) => f.write_str("true"),
            Value::Boolean(false) => f.write_str("false"),
            Value::Unit => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_encoding() {
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(false).to_string(), "false");
        assert_eq!(Value::from(Decimal::new(150, 2)).to_string(), "1.50");
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::Unit.to_string(), "");
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let nine = Value::from(Decimal::from(9));
        let ten = Value::from(Decimal::from(10));
        assert_eq!(nine.compare(&ten), Ordering::Less);
        assert_eq!(Value::from("9").compare(&Value::from("10")), Ordering::Greater);
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::IndefiniteString.to_string(), "INDEFINITE_STRING");
        assert_eq!(DataType::None.to_string(), "NONE");
    }
}
