//! Conversion of scanned numeric literals into typed values.
//!
//! The scanner has already validated the shape of each literal and recorded
//! its classification in [`NumData`]; this module performs the actual
//! conversion, applying the overflow policy from the load options.

use std::borrow::Cow;

use crate::error::ErrorKind;
use crate::options::LoadOptions;
use crate::token::{NumBase, NumData, NumKind};
use crate::value::Value;

/// Convert a raw numeric literal into a value. Errors come back without a
/// position; the caller attaches the token's.
pub(crate) fn parse_number(
    raw: &str,
    data: NumData,
    options: &LoadOptions,
) -> Result<Value, ErrorKind> {
    let cleaned: Cow<'_, str> = if data.grouped {
        Cow::Owned(raw.chars().filter(|c| *c != '_').collect())
    } else {
        Cow::Borrowed(raw)
    };
    let text = cleaned.as_ref();

    match data.kind {
        NumKind::Int => parse_int(text, data.base, options),
        NumKind::Float => parse_float(text, data.base, options).map(Value::Float),
        NumKind::Complex => parse_complex(text, options),
        NumKind::Rational => parse_rational(text),
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn parse_int(text: &str, base: NumBase, options: &LoadOptions) -> Result<Value, ErrorKind> {
    let (negative, body) = split_sign(text);
    let digits = body.strip_prefix(base.prefix()).unwrap_or(body);

    if !options.integers {
        // Integer literals load as floats under `integers = false`.
        let mut value = 0f64;
        for c in digits.chars() {
            let digit = c.to_digit(base.radix()).ok_or(ErrorKind::NumericOverflow)?;
            value = value * base.radix() as f64 + digit as f64;
        }
        return Ok(Value::Float(if negative { -value } else { value }));
    }

    let mut magnitude: u128 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(base.radix()).ok_or(ErrorKind::NumericOverflow)? as u128;
        magnitude = magnitude
            .checked_mul(base.radix() as u128)
            .and_then(|m| m.checked_add(digit))
            .ok_or(ErrorKind::NumericOverflow)?;
    }
    let value = if negative {
        if magnitude > i64::MAX as u128 + 1 {
            return Err(ErrorKind::NumericOverflow);
        }
        (magnitude as i128).wrapping_neg() as i64
    } else {
        if magnitude > i64::MAX as u128 {
            return Err(ErrorKind::NumericOverflow);
        }
        magnitude as i64
    };
    Ok(Value::Int(value))
}

fn parse_float(text: &str, base: NumBase, options: &LoadOptions) -> Result<f64, ErrorKind> {
    let value = match base {
        NumBase::Hex => parse_hex_float(text)?,
        _ => {
            let parsed: f64 = text.parse().map_err(|_| ErrorKind::NumericOverflow)?;
            parsed
        }
    };
    if value.is_infinite() && !text.contains("inf") && !options.float_overflow_to_inf {
        return Err(ErrorKind::NumericOverflow);
    }
    Ok(value)
}

/// Parse a hex float of the form `[±]0x H[.H] p [±]D`. The mantissa is
/// accumulated into 128 bits; digits beyond that only adjust the exponent,
/// with a sticky low bit so rounding stays within one ulp of exact.
fn parse_hex_float(text: &str) -> Result<f64, ErrorKind> {
    let (negative, body) = split_sign(text);
    let body = body.strip_prefix("0x").ok_or(ErrorKind::NumericOverflow)?;
    let (mantissa_text, exp_text) = body
        .split_once(['p', 'P'])
        .ok_or(ErrorKind::NumericOverflow)?;
    let exponent: i32 = exp_text.parse().map_err(|_| ErrorKind::NumericOverflow)?;

    let (int_text, frac_text) = match mantissa_text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa_text, ""),
    };

    let mut mantissa: u128 = 0;
    let mut exp_adjust: i64 = 0;
    let mut saturated = false;
    for c in int_text.chars() {
        let digit = c.to_digit(16).ok_or(ErrorKind::NumericOverflow)? as u128;
        if saturated {
            exp_adjust += 4;
            if digit != 0 {
                mantissa |= 1;
            }
            continue;
        }
        match mantissa.checked_mul(16).and_then(|m| m.checked_add(digit)) {
            Some(m) => mantissa = m,
            None => {
                saturated = true;
                exp_adjust += 4;
                if digit != 0 {
                    mantissa |= 1;
                }
            }
        }
    }
    for c in frac_text.chars() {
        let digit = c.to_digit(16).ok_or(ErrorKind::NumericOverflow)? as u128;
        if saturated {
            if digit != 0 {
                mantissa |= 1;
            }
            continue;
        }
        match mantissa.checked_mul(16).and_then(|m| m.checked_add(digit)) {
            Some(m) => {
                mantissa = m;
                exp_adjust -= 4;
            }
            None => {
                saturated = true;
                if digit != 0 {
                    mantissa |= 1;
                }
            }
        }
    }

    let total_exp = exponent as i64 + exp_adjust;
    let value = scale_by_two(mantissa as f64, total_exp);
    Ok(if negative { -value } else { value })
}

/// Multiply by 2^exp without losing precision to repeated rounding: powi on a
/// power of two is exact, and the split avoids spurious overflow when the
/// mantissa and exponent pull in opposite directions.
fn scale_by_two(value: f64, exp: i64) -> f64 {
    let exp = exp.clamp(-2200, 2200) as i32;
    if exp >= -1000 && exp <= 1000 {
        return value * 2f64.powi(exp);
    }
    let half = exp / 2;
    value * 2f64.powi(half) * 2f64.powi(exp - half)
}

fn parse_complex(text: &str, options: &LoadOptions) -> Result<Value, ErrorKind> {
    let body = text.strip_suffix('i').ok_or(ErrorKind::NumericOverflow)?;

    // Find the sign that separates real and imaginary components, skipping
    // the leading sign and any exponent signs.
    let mut split = None;
    for (index, c) in body.char_indices().skip(1) {
        if (c == '+' || c == '-')
            && !matches!(body.as_bytes()[index - 1], b'e' | b'E')
        {
            split = Some(index);
        }
    }

    let (real, imag) = match split {
        Some(index) => {
            let real = parse_float(&body[..index], NumBase::Dec, options)?;
            let imag = parse_float(&body[index..], NumBase::Dec, options)?;
            (real, imag)
        }
        None => (0.0, parse_float(body, NumBase::Dec, options)?),
    };
    Ok(Value::Complex(real, imag))
}

fn parse_rational(text: &str) -> Result<Value, ErrorKind> {
    let (num_text, den_text) = text.split_once('/').ok_or(ErrorKind::NumericOverflow)?;
    let num: i64 = num_text.parse().map_err(|_| ErrorKind::NumericOverflow)?;
    let den: i64 = den_text.parse().map_err(|_| ErrorKind::NumericOverflow)?;
    if den == 0 {
        return Err(ErrorKind::BadNumber(text.to_string()));
    }
    // The denominator keeps no sign of its own.
    let (num, den) = if den < 0 {
        (num.checked_neg().ok_or(ErrorKind::NumericOverflow)?,
         den.checked_neg().ok_or(ErrorKind::NumericOverflow)?)
    } else {
        (num, den)
    };
    Ok(Value::Rational(num, den))
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;

    fn num(kind: NumKind, base: NumBase, grouped: bool) -> NumData {
        NumData { kind, base, grouped }
    }

    fn parse(raw: &str, data: NumData) -> Value {
        parse_number(raw, data, &LoadOptions::default()).unwrap()
    }

    #[test_case("0", NumBase::Dec, 0; "zero")]
    #[test_case("-42", NumBase::Dec, -42; "negative dec")]
    #[test_case("0x1f", NumBase::Hex, 31; "hex")]
    #[test_case("0o17", NumBase::Oct, 15; "oct")]
    #[test_case("0b1101", NumBase::Bin, 13; "bin")]
    #[test_case("-0x10", NumBase::Hex, -16; "negative hex")]
    fn ints(raw: &str, base: NumBase, expected: i64) {
        assert_eq!(parse(raw, num(NumKind::Int, base, false)), Value::Int(expected));
    }

    #[test]
    fn grouped_digits_are_stripped() {
        assert_eq!(
            parse("1_000_000", num(NumKind::Int, NumBase::Dec, true)),
            Value::Int(1_000_000)
        );
    }

    #[test]
    fn int_overflow_is_reported() {
        let result = parse_number(
            "9223372036854775808",
            num(NumKind::Int, NumBase::Dec, false),
            &LoadOptions::default(),
        );
        assert_eq!(result.unwrap_err(), ErrorKind::NumericOverflow);
        assert_eq!(
            parse("-9223372036854775808", num(NumKind::Int, NumBase::Dec, false)),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn integers_off_loads_ints_as_floats() {
        let options = LoadOptions::default().with_integers(false);
        assert_eq!(
            parse_number("7", num(NumKind::Int, NumBase::Dec, false), &options).unwrap(),
            Value::Float(7.0)
        );
    }

    #[test_case("1.5", 1.5; "simple")]
    #[test_case("4.5e3", 4500.0; "exponent")]
    #[test_case("-2e-2", -0.02; "negative exponent")]
    #[test_case("inf", f64::INFINITY; "infinity")]
    #[test_case("-inf", f64::NEG_INFINITY; "negative infinity")]
    fn dec_floats(raw: &str, expected: f64) {
        assert_eq!(
            parse(raw, num(NumKind::Float, NumBase::Dec, false)),
            Value::Float(expected)
        );
    }

    #[test]
    fn nan_parses_as_nan() {
        let value = parse("nan", num(NumKind::Float, NumBase::Dec, false));
        assert!(matches!(value, Value::Float(x) if x.is_nan()));
    }

    #[test_case("0x4.3p2", 16.75; "spec example")]
    #[test_case("0x1p0", 1.0; "one")]
    #[test_case("0x1.8p1", 3.0; "fraction")]
    #[test_case("-0x1p-2", -0.25; "negative exponent")]
    #[test_case("0xffp0", 255.0; "wide mantissa")]
    fn hex_floats(raw: &str, expected: f64) {
        assert_eq!(
            parse(raw, num(NumKind::Float, NumBase::Hex, false)),
            Value::Float(expected)
        );
    }

    #[test]
    fn float_overflow_policy() {
        let huge = "1e400";
        let result = parse_number(
            huge,
            num(NumKind::Float, NumBase::Dec, false),
            &LoadOptions::default(),
        );
        assert_eq!(result.unwrap_err(), ErrorKind::NumericOverflow);

        let options = LoadOptions::default().with_float_overflow_to_inf(true);
        assert_eq!(
            parse_number(huge, num(NumKind::Float, NumBase::Dec, false), &options).unwrap(),
            Value::Float(f64::INFINITY)
        );
    }

    #[test_case("3i", 0.0, 3.0; "imag only")]
    #[test_case("4+3i", 4.0, 3.0; "full")]
    #[test_case("4-3i", 4.0, -3.0; "negative imag")]
    #[test_case("-1.5e2+0.5i", -150.0, 0.5; "exponent real")]
    fn complex(raw: &str, re: f64, im: f64) {
        assert_eq!(
            parse(raw, num(NumKind::Complex, NumBase::Dec, false)),
            Value::Complex(re, im)
        );
    }

    #[test]
    fn rationals_normalize_sign_to_numerator() {
        assert_eq!(parse("2/3", num(NumKind::Rational, NumBase::Dec, false)), Value::Rational(2, 3));
        assert_eq!(
            parse("1/-2", num(NumKind::Rational, NumBase::Dec, false)),
            Value::Rational(-1, 2)
        );
        let result = parse_number(
            "1/0",
            num(NumKind::Rational, NumBase::Dec, false),
            &LoadOptions::default(),
        );
        assert!(matches!(result.unwrap_err(), ErrorKind::BadNumber(_)));
    }
}
