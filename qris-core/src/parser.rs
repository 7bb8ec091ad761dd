//! Free-form numeric entry parsing into exact decimals.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Largest exponent magnitude accepted in scientific notation.
const MAX_EXPONENT: u32 = 28;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount contains invalid characters")]
    InvalidCharacters,
    #[error("amount has more than one decimal point")]
    MultipleDecimalPoints,
    #[error("amount has no digits")]
    MissingDigits,
    #[error("amount has an invalid exponent")]
    InvalidExponent,
    #[error("amount is outside the supported range")]
    OutOfRange,
}

fn all_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

fn parse_mantissa(s: &str) -> Result<Decimal, AmountParseError> {
    if s.chars().filter(|c| *c == '.').count() > 1 {
        return Err(AmountParseError::MultipleDecimalPoints);
    }

    let mut iter = s.splitn(2, '.');
    let whole = iter.next().unwrap_or("");
    let frac = iter.next().unwrap_or("");

    if !all_digits(whole) || !all_digits(frac) {
        return Err(AmountParseError::InvalidCharacters);
    }
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountParseError::MissingDigits);
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    };

    Decimal::from_str(&normalized).map_err(|_| AmountParseError::OutOfRange)
}

fn apply_exponent(mantissa: Decimal, exponent: &str) -> Result<Decimal, AmountParseError> {
    let (negative, digits) = split_sign(exponent);
    if digits.is_empty() || !all_digits(digits) {
        return Err(AmountParseError::InvalidExponent);
    }
    let magnitude: u32 = digits
        .parse()
        .map_err(|_| AmountParseError::InvalidExponent)?;
    if magnitude > MAX_EXPONENT {
        return Err(AmountParseError::OutOfRange);
    }

    let mut value = mantissa;
    for _ in 0..magnitude {
        value = if negative {
            value
                .checked_div(Decimal::TEN)
                .ok_or(AmountParseError::OutOfRange)?
        } else {
            value
                .checked_mul(Decimal::TEN)
                .ok_or(AmountParseError::OutOfRange)?
        };
    }
    Ok(value)
}

/// Parse a numeric entry such as `"10000"`, `"2.5"`, `".5"` or `"1e3"`.
///
/// Signs are accepted so that negative entries parse (and are later treated
/// as non-positive) instead of being reported as garbage.
pub fn parse_decimal(input: &str) -> Result<Decimal, AmountParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountParseError::Empty);
    }

    let (negative, unsigned) = split_sign(s);
    if unsigned.is_empty() {
        return Err(AmountParseError::MissingDigits);
    }

    let mut parts = unsigned.splitn(2, ['e', 'E']);
    let mantissa = parse_mantissa(parts.next().unwrap_or(""))?;
    let value = match parts.next() {
        Some(exponent) => apply_exponent(mantissa, exponent)?,
        None => mantissa,
    };

    Ok(if negative { -value } else { value })
}

/// `Some(value)` only when `input` parses to a number strictly greater than zero.
pub fn parse_positive(input: &str) -> Option<Decimal> {
    parse_decimal(input)
        .ok()
        .filter(|value| *value > Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_integer_amount() {
        assert_eq!(parse_decimal("10000").unwrap(), dec("10000"));
    }

    #[test]
    fn parses_decimal_amount() {
        assert_eq!(parse_decimal("2.5").unwrap(), dec("2.5"));
    }

    #[test]
    fn parses_leading_and_trailing_dot() {
        assert_eq!(parse_decimal(".5").unwrap(), dec("0.5"));
        assert_eq!(parse_decimal("1.").unwrap(), dec("1"));
    }

    #[test]
    fn parses_surrounding_whitespace() {
        assert_eq!(parse_decimal("  42 \n").unwrap(), dec("42"));
    }

    #[test]
    fn parses_scientific_notation() {
        assert_eq!(parse_decimal("1e3").unwrap(), dec("1000"));
        assert_eq!(parse_decimal("2.5E-1").unwrap(), dec("0.25"));
    }

    #[test]
    fn parses_signed_values() {
        assert_eq!(parse_decimal("-4").unwrap(), dec("-4"));
        assert_eq!(parse_decimal("+3").unwrap(), dec("3"));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse_decimal("   "), Err(AmountParseError::Empty));
    }

    #[test]
    fn rejects_invalid_chars() {
        assert_eq!(parse_decimal("1,0"), Err(AmountParseError::InvalidCharacters));
        assert_eq!(parse_decimal("abc"), Err(AmountParseError::InvalidCharacters));
    }

    #[test]
    fn rejects_multiple_points() {
        assert_eq!(
            parse_decimal("1.2.3"),
            Err(AmountParseError::MultipleDecimalPoints)
        );
    }

    #[test]
    fn rejects_bare_sign_and_dot() {
        assert_eq!(parse_decimal("-"), Err(AmountParseError::MissingDigits));
        assert_eq!(parse_decimal("."), Err(AmountParseError::MissingDigits));
    }

    #[test]
    fn rejects_bad_exponent() {
        assert_eq!(parse_decimal("1e"), Err(AmountParseError::InvalidExponent));
        assert_eq!(parse_decimal("1e+x"), Err(AmountParseError::InvalidExponent));
    }

    #[test]
    fn rejects_values_beyond_decimal_range() {
        assert_eq!(parse_decimal("1e40"), Err(AmountParseError::OutOfRange));
        assert_eq!(parse_decimal("9e28"), Err(AmountParseError::OutOfRange));
    }

    #[test]
    fn positive_filter() {
        assert_eq!(parse_positive("5"), Some(dec("5")));
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-1"), None);
        assert_eq!(parse_positive("x"), None);
        assert_eq!(parse_positive(""), None);
    }
}
