//! Exact decimal helpers shared by operators and built-in functions.
//!
//! Failures are reported as plain messages; the evaluator attaches the node
//! and record.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a decimal, accepting surrounding whitespace, a sign and an exponent.
pub(crate) fn parse_decimal(text: &str) -> Result<Decimal, String> {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.is_empty() {
        return Err(format!("cannot convert {text:?} to a number"));
    }
    Decimal::from_str(unsigned)
        .or_else(|_| Decimal::from_scientific(unsigned))
        .map_err(|_| {
            if is_plain_number(unsigned) {
                format!("{text:?} does not fit a decimal of {MAX_DIGITS} significant digits")
            } else {
                format!("cannot convert {text:?} to a number")
            }
        })
}

/// Significant digits a NUMBER can hold.
pub(crate) const MAX_DIGITS: u32 = 28;

fn is_plain_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    !(whole.is_empty() && fraction.is_empty())
        && whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
}

pub(crate) fn add(lhs: Decimal, rhs: Decimal) -> Result<Decimal, String> {
    lhs.checked_add(rhs).ok_or_else(|| overflow("+"))
}

pub(crate) fn subtract(lhs: Decimal, rhs: Decimal) -> Result<Decimal, String> {
    lhs.checked_sub(rhs).ok_or_else(|| overflow("-"))
}

pub(crate) fn multiply(lhs: Decimal, rhs: Decimal) -> Result<Decimal, String> {
    lhs.checked_mul(rhs).ok_or_else(|| overflow("*"))
}

pub(crate) fn divide(lhs: Decimal, rhs: Decimal) -> Result<Decimal, String> {
    if rhs.is_zero() {
        return Err("division by zero".to_string());
    }
    lhs.checked_div(rhs).ok_or_else(|| overflow("/"))
}

/// Remainder whose sign follows the divisor, so `-7 % 3 == 2`.
pub(crate) fn floor_mod(lhs: Decimal, rhs: Decimal) -> Result<Decimal, String> {
    if rhs.is_zero() {
        return Err("modulo by zero".to_string());
    }
    let remainder = lhs.checked_rem(rhs).ok_or_else(|| overflow("%"))?;
    if !remainder.is_zero() && remainder.is_sign_negative() != rhs.is_sign_negative() {
        add(remainder, rhs)
    } else {
        Ok(remainder)
    }
}

/// Round half to even. Negative `digits` round to tens, hundreds, and so on.
pub(crate) fn round_half_even(value: Decimal, digits: i64) -> Result<Decimal, String> {
    const MAX_SCALE: i64 = MAX_DIGITS as i64;

    if digits >= 0 {
        let scale = u32::try_from(digits.min(MAX_SCALE)).map_err(|e| e.to_string())?;
        return Ok(value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven));
    }

    let mut factor = Decimal::ONE;
    for _ in 0..digits.unsigned_abs().min(MAX_SCALE.unsigned_abs()) {
        factor = multiply(factor, Decimal::TEN)?;
    }
    let scaled = divide(value, factor)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    multiply(scaled, factor)
}

/// Convert a decimal that must hold an integer, e.g. a slice index.
pub(crate) fn to_integer(value: Decimal, what: &str) -> Result<i64, String> {
    if !value.fract().is_zero() {
        return Err(format!("{what} must be an integer, got {value}"));
    }
    value
        .to_i64()
        .ok_or_else(|| format!("{what} is out of range: {value}"))
}

/// Resolve slice bounds over `len` items: negative indices count from the
/// end, anything out of range clamps.
pub(crate) fn slice_bounds(len: usize, start: i64, end: Option<i64>) -> (usize, usize) {
    let clamp = |index: i64| -> usize {
        let len_i = i64::try_from(len).unwrap_or(i64::MAX);
        let resolved = if index < 0 { index + len_i } else { index };
        usize::try_from(resolved.clamp(0, len_i)).unwrap_or(len)
    };
    let start = clamp(start);
    let end = end.map_or(len, clamp);
    (start, end.max(start))
}

fn overflow(op: &str) -> String {
    format!("numeric overflow in '{op}'")
}
