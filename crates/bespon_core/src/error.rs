use std::fmt;

use thiserror::Error;

/// A resolved location in the source text. `line` and `col` are 1-based and
/// counted in characters; `offset` is the byte offset into the decoded source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    // Lexical errors
    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),
    #[error("unterminated {0} literal")]
    UnterminatedString(&'static str),
    #[error("indentation mixes tabs and spaces inconsistently")]
    MixedIndent,
    #[error("malformed number `{0}`")]
    BadNumber(String),
    #[error("code point U+{0:04X} is not allowed in a source")]
    DisallowedCodePoint(u32),
    #[error("line break is not allowed here")]
    InvalidLineBreak,
    #[error("unknown or unexpected character `{0}`")]
    UnknownToken(char),

    // Structural errors
    #[error("unexpected {0}")]
    Unexpected(&'static str),
    #[error("invalid indentation: {0}")]
    Indent(&'static str),
    #[error("duplicate key `{0}`")]
    DuplicateKey(String),
    #[error("invalid section header: {0}")]
    BadSection(&'static str),
    #[error("empty item in collection")]
    EmptyCollectionItem,
    #[error("tag is not valid here: {0}")]
    TagMismatch(&'static str),
    #[error("unbalanced `{0}`")]
    UnbalancedDelimiter(char),
    #[error("nesting depth exceeds the configured maximum of {0}")]
    DepthExceeded(usize),

    // Semantic errors
    #[error("unknown type name `{0}`")]
    UnknownType(String),
    #[error("type `{0}` is not compatible with a {1} value")]
    IncompatibleType(String, &'static str),
    #[error("alias `${0}` is not defined")]
    UndefinedAlias(String),
    #[error("alias `${0}` creates a circular reference")]
    CircularReference(String),
    #[error("label `{0}` is already defined")]
    LabelRedefinition(String),
    #[error("numeric literal overflows its type")]
    NumericOverflow,
    #[error("unknown tag keyword `{0}`")]
    UnknownTagKeyword(String),
    #[error("value is not valid for type `{0}`: {1}")]
    InvalidTypePayload(String, String),

    // Round-trip errors
    #[error("path does not exist in the document")]
    PathNotFound,
    #[error("replacement value is not compatible with the existing {0} value")]
    ReplaceTypeMismatch(&'static str),
    #[error("key `{0}` already exists in the enclosing dict")]
    KeyCollision(String),
    #[error("original string style could not be preserved")]
    StyleFallback,
}

/// The error type produced by every fallible operation in the crate. Carries
/// the fault kind together with the position it was detected at and the full
/// source line for display.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub pos: Position,
    pub snippet: String,
}

impl Error {
    pub fn new(kind: ErrorKind, pos: Position, snippet: impl Into<String>) -> Self {
        Self {
            kind,
            pos,
            snippet: snippet.into(),
        }
    }

    /// An error with no resolved source location, for faults detected before
    /// or after scanning (encoding errors, serializer cycles).
    pub fn unpositioned(kind: ErrorKind) -> Self {
        Self {
            kind,
            pos: Position::default(),
            snippet: String::new(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.kind)?;
        if !self.snippet.is_empty() {
            write!(f, "\n  | {}", self.snippet)?;
            // col is 1-based, so the caret lands under the offending character.
            write!(f, "\n  | {:width$}^", "", width = self.pos.col.saturating_sub(1) as usize)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
