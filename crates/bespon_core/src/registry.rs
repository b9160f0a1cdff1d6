//! The registry of explicit type names available to tags.

use rustc_hash::FxHashMap;

use crate::options::{CustomParser, LoadOptions, Shape};
use crate::value::{DictFlavor, ListFlavor};

/// How a registered type transforms the implicitly-typed value it tags.
#[derive(Clone)]
pub(crate) enum Decoder {
    /// The tag only asserts the implicit type (`str`, `int`, `dict`, ...).
    Identity,
    /// Cast an int literal to a float.
    ToFloat,
    DictFlavor(DictFlavor),
    ListFlavor(ListFlavor),
    Bytes,
    Base16,
    Base64,
    Custom(CustomParser),
}

#[derive(Clone)]
pub(crate) struct TypeEntry {
    pub compatible: Vec<Shape>,
    pub decoder: Decoder,
    pub ascii_bytes: bool,
}

impl TypeEntry {
    fn builtin(compatible: &[Shape], decoder: Decoder) -> Self {
        Self {
            compatible: compatible.to_vec(),
            decoder,
            ascii_bytes: false,
        }
    }
}

pub(crate) struct TypeRegistry {
    entries: FxHashMap<Box<str>, TypeEntry>,
}

impl TypeRegistry {
    /// Seed the registry from the options: built-in names, the extended and
    /// python sets when enabled, then caller records and parser overrides.
    pub fn from_options(options: &LoadOptions) -> Self {
        let mut entries: FxHashMap<Box<str>, TypeEntry> = FxHashMap::default();

        entries.insert("dict".into(), TypeEntry::builtin(&[Shape::Dict], Decoder::Identity));
        entries.insert("list".into(), TypeEntry::builtin(&[Shape::List], Decoder::Identity));
        entries.insert("str".into(), TypeEntry::builtin(&[Shape::Str], Decoder::Identity));
        entries.insert("int".into(), TypeEntry::builtin(&[Shape::Int], Decoder::Identity));
        entries.insert(
            "float".into(),
            TypeEntry::builtin(&[Shape::Float, Shape::Int], Decoder::ToFloat),
        );

        if options.extended_types {
            entries.insert(
                "odict".into(),
                TypeEntry::builtin(&[Shape::Dict], Decoder::DictFlavor(DictFlavor::Odict)),
            );
            entries.insert(
                "set".into(),
                TypeEntry::builtin(&[Shape::List], Decoder::ListFlavor(ListFlavor::Set)),
            );
            entries.insert("bytes".into(), TypeEntry::builtin(&[Shape::Str], Decoder::Bytes));
            entries.insert("base16".into(), TypeEntry::builtin(&[Shape::Str], Decoder::Base16));
            entries.insert("base64".into(), TypeEntry::builtin(&[Shape::Str], Decoder::Base64));
        }

        if options.python_types {
            entries.insert(
                "tuple".into(),
                TypeEntry::builtin(&[Shape::List], Decoder::ListFlavor(ListFlavor::Tuple)),
            );
        }

        for record in &options.custom_types {
            let decoder = match &record.parser {
                Some(parser) => Decoder::Custom(parser.clone()),
                None => Decoder::Identity,
            };
            entries.insert(
                record.name.clone(),
                TypeEntry {
                    compatible: record.compatible_implicit_types.clone(),
                    decoder,
                    ascii_bytes: record.ascii_bytes,
                },
            );
        }

        for (name, parser) in &options.custom_parsers {
            if let Some(entry) = entries.get_mut(name) {
                entry.decoder = Decoder::Custom(parser.clone());
            } else {
                entries.insert(
                    name.clone(),
                    TypeEntry {
                        compatible: vec![Shape::Str],
                        decoder: Decoder::Custom(parser.clone()),
                        ascii_bytes: false,
                    },
                );
            }
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name)
    }
}

/// Decode the interior of a `base16` string. Whitespace between digit pairs
/// is ignored.
pub(crate) fn decode_base16(text: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut high: Option<u8> = None;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            continue;
        }
        let digit = c
            .to_digit(16)
            .ok_or_else(|| format!("invalid base16 digit `{}`", c))? as u8;
        high = match high {
            None => Some(digit),
            Some(h) => {
                out.push(h << 4 | digit);
                None
            }
        };
    }
    if high.is_some() {
        return Err("odd number of base16 digits".to_string());
    }
    Ok(out)
}

const BASE64_PAD: u8 = 64;

fn base64_digit(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        'a'..='z' => Some(c as u8 - b'a' + 26),
        '0'..='9' => Some(c as u8 - b'0' + 52),
        '+' => Some(62),
        '/' => Some(63),
        '=' => Some(BASE64_PAD),
        _ => None,
    }
}

/// Decode the interior of a `base64` string (standard alphabet, optional
/// padding, whitespace ignored).
pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(text.len() / 4 * 3);
    let mut quad = [0u8; 4];
    let mut filled = 0;
    let mut done = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            continue;
        }
        if done {
            return Err("base64 data continues after padding".to_string());
        }
        let digit = base64_digit(c).ok_or_else(|| format!("invalid base64 digit `{}`", c))?;
        if digit == BASE64_PAD {
            match filled {
                2 => {
                    out.push(quad[0] << 2 | quad[1] >> 4);
                }
                3 => {
                    out.push(quad[0] << 2 | quad[1] >> 4);
                    out.push(quad[1] << 4 | quad[2] >> 2);
                }
                _ => return Err("misplaced base64 padding".to_string()),
            }
            done = true;
            continue;
        }
        quad[filled] = digit;
        filled += 1;
        if filled == 4 {
            out.push(quad[0] << 2 | quad[1] >> 4);
            out.push(quad[1] << 4 | quad[2] >> 2);
            out.push(quad[2] << 6 | quad[3]);
            filled = 0;
        }
    }
    if !done {
        match filled {
            0 => {}
            2 => out.push(quad[0] << 2 | quad[1] >> 4),
            3 => {
                out.push(quad[0] << 2 | quad[1] >> 4);
                out.push(quad[1] << 4 | quad[2] >> 2);
            }
            _ => return Err("truncated base64 data".to_string()),
        }
    }
    Ok(out)
}

/// Encode bytes with the standard base64 alphabet and padding, for the
/// serializer.
pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[((b0 << 4 | b1 >> 4) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            out.push(ALPHABET[((b1 << 2 | b2 >> 6) & 0x3F) as usize] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(ALPHABET[(b2 & 0x3F) as usize] as char);
        } else {
            out.push('=');
        }
    }
    out
}

/// Decode a `bytes` string: the decoded character values must all be Latin-1.
pub(crate) fn decode_bytes_str(text: &str, ascii_only: bool) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let n = c as u32;
        if ascii_only && n > 0x7F {
            return Err(format!("non-ASCII character `{}` in bytes string", c));
        }
        if n > 0xFF {
            return Err(format!("character `{}` does not fit in a byte", c));
        }
        out.push(n as u8);
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base16_decodes_pairs() {
        assert_eq!(decode_base16("48 65 6c").unwrap(), b"Hel");
        assert_eq!(decode_base16("DEADBEEF").unwrap(), [0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(decode_base16("ABC").is_err());
        assert!(decode_base16("zz").is_err());
    }

    #[test]
    fn base64_round_trips() {
        for payload in [&b"any carnal pleasure."[..], b"ab", b"a", b""] {
            let encoded = encode_base64(payload);
            assert_eq!(decode_base64(&encoded).unwrap(), payload);
        }
        assert_eq!(decode_base64("aGVsbG8").unwrap(), b"hello");
        assert!(decode_base64("a=b=").is_err());
    }

    #[test]
    fn registry_respects_feature_gates() {
        let plain = TypeRegistry::from_options(&LoadOptions::default());
        assert!(plain.get("dict").is_some());
        assert!(plain.get("set").is_none());
        assert!(plain.get("tuple").is_none());

        let extended = TypeRegistry::from_options(
            &LoadOptions::default()
                .with_extended_types(true)
                .with_python_types(true),
        );
        assert!(extended.get("set").is_some());
        assert!(extended.get("base64").is_some());
        assert!(extended.get("tuple").is_some());
    }
}
