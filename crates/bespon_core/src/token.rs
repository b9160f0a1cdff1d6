use std::ops::Range;

use bitflags::bitflags;

use crate::source::SourceText;
use crate::syntax::SyntaxKind;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// The token is the first non-blank token on its line.
        const AT_LINE_START = 1;
        /// The literal spans more than one source line.
        const MULTILINE = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteKind {
    /// `'` literal strings: no escapes.
    Single,
    /// `"` escaped strings.
    Double,
    /// Backtick raw strings: no escapes.
    Backtick,
}

impl QuoteKind {
    pub const fn char(&self) -> char {
        match self {
            QuoteKind::Single => '\'',
            QuoteKind::Double => '"',
            QuoteKind::Backtick => '`',
        }
    }

    pub const fn has_escapes(&self) -> bool {
        matches!(self, QuoteKind::Double)
    }

    pub const fn describe(&self) -> &'static str {
        match self {
            QuoteKind::Single => "single-quoted",
            QuoteKind::Double => "double-quoted",
            QuoteKind::Backtick => "backtick-quoted",
        }
    }
}

/// What a multiline closing delimiter's slash suffix said about the final
/// newline of the decoded value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Chomp {
    /// No suffix: the final newline is kept.
    #[default]
    Default,
    /// `/`: the final newline is kept, spelled out.
    Keep,
    /// `//`: the final newline is stripped.
    Strip,
}

/// The recorded surface attributes of a string literal, used for faithful
/// re-emission after round-trip edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelimProfile {
    pub quote: QuoteKind,
    /// Delimiter run length: 1, or 3 and above for multiline/wrapped forms.
    pub run: u8,
    pub chomp: Chomp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumKind {
    Int,
    Float,
    Complex,
    Rational,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumBase {
    Dec,
    Hex,
    Oct,
    Bin,
}

impl NumBase {
    pub const fn radix(&self) -> u32 {
        match self {
            NumBase::Dec => 10,
            NumBase::Hex => 16,
            NumBase::Oct => 8,
            NumBase::Bin => 2,
        }
    }

    pub const fn prefix(&self) -> &'static str {
        match self {
            NumBase::Dec => "",
            NumBase::Hex => "0x",
            NumBase::Oct => "0o",
            NumBase::Bin => "0b",
        }
    }
}

/// Numeric classification recorded by the scanner; the actual conversion to a
/// typed value happens in [`crate::num`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumData {
    pub kind: NumKind,
    pub base: NumBase,
    /// The literal used `_` digit grouping.
    pub grouped: bool,
}

/// Sidecar data for string tokens: the decoded value (delimiters stripped,
/// indentation removed, escapes applied) and the delimiter profile. Unquoted
/// tokens carry no sidecar; their raw text is their value.
#[derive(Clone, Debug, PartialEq)]
pub struct StrData {
    pub decoded: Box<str>,
    pub profile: DelimProfile,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum TokenData {
    #[default]
    None,
    Str(Box<StrData>),
    Num(NumData),
}

/// One token of the source. Every byte of the input belongs to exactly one
/// token (trivia included), so emitting raw text in token order reproduces
/// the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Range<usize>,
    /// 0-based column (in characters) of the token start on its line.
    pub col: u32,
    pub flags: TokenFlags,
    pub data: TokenData,
}

impl Token {
    pub fn new(kind: SyntaxKind, span: Range<usize>, col: u32, flags: TokenFlags) -> Self {
        Self {
            kind,
            span,
            col,
            flags,
            data: TokenData::None,
        }
    }

    pub fn at_line_start(&self) -> bool {
        self.flags.contains(TokenFlags::AT_LINE_START)
    }

    pub fn str_data(&self) -> Option<&StrData> {
        match &self.data {
            TokenData::Str(data) => Some(data),
            _ => None,
        }
    }

    pub fn num_data(&self) -> Option<NumData> {
        match &self.data {
            TokenData::Num(data) => Some(*data),
            _ => None,
        }
    }
}

/// The full token stream of one parse, in source order, owning the source.
#[derive(Clone, Debug)]
pub struct TokenList {
    source: SourceText,
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new(source: SourceText, tokens: Vec<Token>) -> Self {
        Self { source, tokens }
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    pub fn kind(&self, index: usize) -> SyntaxKind {
        self.tokens[index].kind
    }

    /// The raw source text of the token, exactly as written.
    pub fn raw(&self, index: usize) -> &str {
        &self.source.as_str()[self.tokens[index].span.clone()]
    }

    /// The decoded value text of a string-shaped token: the decoded form for
    /// quoted strings, the raw text for unquoted words and keywords.
    pub fn value_text(&self, index: usize) -> &str {
        match self.tokens[index].str_data() {
            Some(data) => &data.decoded,
            None => self.raw(index),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}
