//! Style-preserving re-rendering of replacement values.
//!
//! Every replacement is re-rendered from the original token's style profile:
//! numbers keep their base and grouping stride, strings keep their quote kind
//! and delimiter length (promoting the run by the minimum necessary), and
//! booleans and `none` regenerate as their canonical spelling.

use crate::chars;
use crate::escape;
use crate::token::{Chomp, DelimProfile, NumBase, QuoteKind};

/// The outcome of a re-render: the text, and whether the original style had
/// to be abandoned for the closest compatible one.
pub(crate) struct Rendered {
    pub text: String,
    pub fallback: bool,
}

impl Rendered {
    fn kept(text: String) -> Self {
        Self {
            text,
            fallback: false,
        }
    }

    fn fell_back(text: String) -> Self {
        Self {
            text,
            fallback: true,
        }
    }
}

//#region Numbers

/// Digit-group stride of the original literal: the length of the final
/// underscore-separated group.
pub(crate) fn grouping_stride(raw: &str) -> usize {
    let digits_end = raw
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_ascii_alphanumeric())
        .map(|(i, _)| i + 1)
        .unwrap_or(raw.len());
    let body = &raw[..digits_end];
    match body.rfind('_') {
        Some(pos) => body.len() - pos - 1,
        None => 0,
    }
}

fn group_digits(digits: &str, stride: usize) -> String {
    if stride == 0 || digits.len() <= stride {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / stride);
    let lead = digits.len() % stride;
    let (head, rest) = digits.split_at(if lead == 0 { stride } else { lead });
    out.push_str(head);
    for chunk in rest.as_bytes().chunks(stride) {
        out.push('_');
        out.push_str(std::str::from_utf8(chunk).expect("digits are ASCII"));
    }
    out
}

pub(crate) fn render_int(value: i64, base: NumBase, stride: usize) -> String {
    let magnitude = value.unsigned_abs();
    let digits = match base {
        NumBase::Dec => format!("{}", magnitude),
        NumBase::Hex => format!("{:x}", magnitude),
        NumBase::Oct => format!("{:o}", magnitude),
        NumBase::Bin => format!("{:b}", magnitude),
    };
    let grouped = group_digits(&digits, stride);
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}{}", sign, base.prefix(), grouped)
}

/// Render a float as a hex literal, `[-]0xH.HHHpE`.
pub(crate) fn render_hex_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0x0p0" } else { "0x0p0" }.to_string();
    }

    let bits = value.to_bits();
    let sign = if bits >> 63 == 1 { "-" } else { "" };
    let raw_exp = ((bits >> 52) & 0x7FF) as i64;
    let frac = bits & ((1u64 << 52) - 1);
    let (lead, exp, frac) = if raw_exp == 0 {
        // Subnormal: no implicit leading bit.
        (0u64, -1022i64, frac)
    } else {
        (1u64, raw_exp - 1023, frac)
    };

    let mut frac_text = format!("{:013x}", frac);
    while frac_text.ends_with('0') {
        frac_text.pop();
    }
    if frac_text.is_empty() {
        format!("{}0x{}p{}", sign, lead, exp)
    } else {
        format!("{}0x{}.{}p{}", sign, lead, frac_text, exp)
    }
}

pub(crate) fn render_dec_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    let text = format!("{}", value);
    // A float literal keeps a float shape.
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{}.0", text)
    }
}

pub(crate) fn render_float(value: f64, base: NumBase) -> String {
    match base {
        NumBase::Hex => render_hex_float(value),
        _ => render_dec_float(value),
    }
}

pub(crate) fn render_complex(re: f64, im: f64) -> String {
    let re_text = render_dec_float(re);
    let im_text = render_dec_float(im);
    if re == 0.0 && !re.is_sign_negative() {
        format!("{}i", im_text)
    } else if im_text.starts_with('-') {
        format!("{}{}i", re_text, im_text)
    } else {
        format!("{}+{}i", re_text, im_text)
    }
}

pub(crate) fn render_rational(num: i64, den: i64) -> String {
    format!("{}/{}", num, den)
}

//#endregion

//#region Strings

/// True when `text` can stand as an unquoted value: identifier-shaped words
/// separated by single spaces.
pub(crate) fn fits_unquoted(text: &str, only_ascii: bool) -> bool {
    if text.is_empty() {
        return false;
    }
    let reserved = ["true", "false", "none", "inf", "nan"];
    text.split(' ').all(|word| {
        chars::is_valid_unquoted_key(word, only_ascii) && !reserved.contains(&word)
    }) && !text.contains("  ")
}

/// Longest run of `c` inside `text`.
fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn delimiter(quote: QuoteKind, run: usize) -> String {
    std::iter::repeat(quote.char()).take(run).collect()
}

/// Render a replacement string in the original profile. `block_indent` is
/// the indentation of the original closing delimiter when the original was a
/// block string.
pub(crate) fn render_str(
    value: &str,
    profile: Option<&DelimProfile>,
    block_indent: Option<&str>,
    only_ascii: bool,
) -> Rendered {
    let Some(profile) = profile else {
        // Originally unquoted.
        if fits_unquoted(value, only_ascii) {
            return Rendered::kept(value.to_string());
        }
        return Rendered::fell_back(render_quoted(value, QuoteKind::Double, 1, only_ascii));
    };

    match profile.quote {
        QuoteKind::Double => {
            if let Some(indent) = block_indent {
                return Rendered::kept(render_block(value, profile, indent, only_ascii));
            }
            Rendered::kept(render_quoted(value, QuoteKind::Double, profile.run as usize, only_ascii))
        }
        quote => {
            // Literal styles cannot escape anything; check representability.
            if let Some(indent) = block_indent {
                if !value.contains(chars::is_disallowed) {
                    return Rendered::kept(render_block(value, profile, indent, only_ascii));
                }
                return Rendered::fell_back(render_quoted(value, QuoteKind::Double, 1, only_ascii));
            }
            let has_newline = value.contains(chars::is_newline);
            let unrepresentable = has_newline
                || value.contains(chars::is_disallowed)
                || (only_ascii && !value.is_ascii());
            if unrepresentable {
                return Rendered::fell_back(render_quoted(value, QuoteKind::Double, 1, only_ascii));
            }
            let internal = longest_run(value, quote.char());
            let mut run = profile.run as usize;
            if internal >= run || (run > 1 && (value.starts_with(quote.char()) || value.ends_with(quote.char()))) {
                // Promote the delimiter run by the minimum necessary.
                run = (internal + 1).max(run);
                if run == 2 {
                    run = 3;
                }
            }
            if run == 1 && internal > 0 {
                run = (internal + 1).max(3);
            }
            if run > 1 && (value.starts_with(quote.char()) || value.ends_with(quote.char())) {
                // A quote adjacent to the delimiter cannot be disambiguated.
                return Rendered::fell_back(render_quoted(value, QuoteKind::Double, 1, only_ascii));
            }
            Rendered::kept(format!(
                "{}{}{}",
                delimiter(quote, run),
                value,
                delimiter(quote, run)
            ))
        }
    }
}

fn render_quoted(value: &str, quote: QuoteKind, run: usize, only_ascii: bool) -> String {
    let encoded = escape::encode(value, run, false, only_ascii);
    let internal = longest_run(&encoded, quote.char());
    let mut run = run;
    if internal >= run && run >= 3 {
        run = internal + 1;
    }
    format!(
        "{}{}{}",
        delimiter(quote, run),
        encoded,
        delimiter(quote, run)
    )
}

/// Re-render a block string with the original delimiter, closing-line
/// indentation, and chomp marker.
fn render_block(value: &str, profile: &DelimProfile, indent: &str, only_ascii: bool) -> String {
    let run = (profile.run as usize).max(3);
    let delim = delimiter(profile.quote, run);
    let body = if profile.quote.has_escapes() {
        escape::encode(value, run, true, only_ascii)
    } else {
        value.to_string()
    };
    // The final newline of the value is produced by the layout itself unless
    // the profile strips it.
    let (body, chomp_suffix) = match profile.chomp {
        Chomp::Strip => (body.as_str(), "//"),
        Chomp::Keep => (body.strip_suffix('\n').unwrap_or(&body), "/"),
        Chomp::Default => (body.strip_suffix('\n').unwrap_or(&body), ""),
    };
    let mut out = String::with_capacity(body.len() + indent.len() * 4 + run * 2 + 4);
    out.push_str(&delim);
    out.push('\n');
    for line in body.split('\n') {
        if !line.is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(indent);
    out.push_str(&delim);
    out.push_str(chomp_suffix);
    out
}

//#endregion

pub(crate) fn render_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

#[cfg(test)]
mod test {
    use crate::value::Value;

    use super::*;

    #[test]
    fn int_bases_and_grouping() {
        assert_eq!(render_int(7, NumBase::Bin, 0), "0b111");
        assert_eq!(render_int(-31, NumBase::Hex, 0), "-0x1f");
        assert_eq!(render_int(1234567, NumBase::Dec, 3), "1_234_567");
        assert_eq!(render_int(12, NumBase::Dec, 3), "12");
        assert_eq!(grouping_stride("1_000"), 3);
        assert_eq!(grouping_stride("12_34_56"), 2);
        assert_eq!(grouping_stride("1234"), 0);
    }

    #[test]
    fn hex_floats_round_trip() {
        for value in [16.75f64, 1.0, 3.0, -0.25, 255.0, 0.1] {
            let text = render_hex_float(value);
            let reparsed = crate::num::parse_number(
                &text,
                crate::token::NumData {
                    kind: crate::token::NumKind::Float,
                    base: NumBase::Hex,
                    grouped: false,
                },
                &crate::options::LoadOptions::default(),
            )
            .unwrap();
            assert_eq!(reparsed, Value::Float(value), "for {}", text);
        }
        assert_eq!(render_hex_float(16.75), "0x1.0cp4");
    }

    #[test]
    fn dec_floats_keep_float_shape() {
        assert_eq!(render_dec_float(3.0), "3.0");
        assert_eq!(render_dec_float(0.5), "0.5");
        assert_eq!(render_dec_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn unquoted_stays_unquoted_when_possible() {
        let rendered = render_str("other words", None, None, true);
        assert!(!rendered.fallback);
        assert_eq!(rendered.text, "other words");

        let rendered = render_str("not \"plain\"", None, None, true);
        assert!(rendered.fallback);
        assert_eq!(rendered.text, r#""not \"plain\"""#);
    }

    #[test]
    fn literal_delimiter_promotion() {
        let profile = DelimProfile {
            quote: QuoteKind::Backtick,
            run: 1,
            chomp: Chomp::Default,
        };
        let rendered = render_str(r"\another \literal", Some(&profile), None, true);
        assert!(!rendered.fallback);
        assert_eq!(rendered.text, r"`\another \literal`");

        let rendered = render_str("has ` inside", Some(&profile), None, true);
        assert!(!rendered.fallback);
        assert_eq!(rendered.text, "```has ` inside```");
    }

    #[test]
    fn literal_with_newline_falls_back_to_escaped() {
        let profile = DelimProfile {
            quote: QuoteKind::Single,
            run: 1,
            chomp: Chomp::Default,
        };
        let rendered = render_str("two\nlines", Some(&profile), None, true);
        assert!(rendered.fallback);
        assert_eq!(rendered.text, r#""two\nlines""#);
    }

    #[test]
    fn block_render_keeps_layout() {
        let profile = DelimProfile {
            quote: QuoteKind::Single,
            run: 3,
            chomp: Chomp::Default,
        };
        let rendered = render_str("line one\n  indented\n", Some(&profile), Some("  "), true);
        assert!(!rendered.fallback);
        assert_eq!(rendered.text, "'''\n  line one\n    indented\n  '''");
    }
}
