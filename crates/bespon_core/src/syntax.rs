#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SyntaxKind {
    TOMBSTONE = 0, // An emptied or not-yet-classified token.
    EOF,           // The end of the input text.
    // Trivia
    WHITESPACE,  // A run of spaces and tabs, including leading indentation.
    LINE_ENDING, // Any single line break: \n, \r, \r\n, NEL, LS, or PS.
    COMMENT,     // A line comment: `#` (or the historical `%`) to end of line.
    DOC_COMMENT, // A `###`-delimited (or `%%%`) doc comment, possibly multiline.
    // Punctuation
    EQUALS,        // =
    COMMA,         // ,
    DOT,           // . between keypath segments
    LBRACE,        // {
    RBRACE,        // }
    LBRACKET,      // [
    RBRACKET,      // ]
    TAG_OPEN,      // ( opening a tag
    TAG_CLOSE,     // )> closing a tag
    LIST_BULLET,   // * introducing an indent-style list item
    SECTION_OPEN,  // |=== or the historical === run
    SECTION_CLOSE, // |===/ or ===/
    ALIAS,         // $name
    // Literals
    STRING,   // Any quoted string, single- or multi-line, carried as one token.
    UNQUOTED, // One word of an unquoted string or key.
    NUMBER,   // Any numeric literal, classified by NumData.
    TRUE_KW,  // true
    FALSE_KW, // false
    NONE_KW,  // none
}

impl SyntaxKind {
    pub const fn is_trivia(&self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE
                | SyntaxKind::LINE_ENDING
                | SyntaxKind::COMMENT
                | SyntaxKind::DOC_COMMENT
        )
    }

    /// Trivia that the parser may skip without any comment bookkeeping.
    pub const fn is_blank_trivia(&self) -> bool {
        matches!(self, SyntaxKind::WHITESPACE | SyntaxKind::LINE_ENDING)
    }

    /// Token kinds that can stand alone as a scalar value.
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            SyntaxKind::STRING
                | SyntaxKind::UNQUOTED
                | SyntaxKind::NUMBER
                | SyntaxKind::TRUE_KW
                | SyntaxKind::FALSE_KW
                | SyntaxKind::NONE_KW
        )
    }

    /// Token kinds that can begin a dict key.
    pub const fn is_key_start(&self) -> bool {
        self.is_scalar()
    }

    /// A short, human-readable description for `Unexpected` errors.
    pub const fn describe(&self) -> &'static str {
        match self {
            SyntaxKind::TOMBSTONE => "token",
            SyntaxKind::EOF => "end of input",
            SyntaxKind::WHITESPACE => "whitespace",
            SyntaxKind::LINE_ENDING => "line break",
            SyntaxKind::COMMENT => "comment",
            SyntaxKind::DOC_COMMENT => "doc comment",
            SyntaxKind::EQUALS => "`=`",
            SyntaxKind::COMMA => "`,`",
            SyntaxKind::DOT => "`.`",
            SyntaxKind::LBRACE => "`{`",
            SyntaxKind::RBRACE => "`}`",
            SyntaxKind::LBRACKET => "`[`",
            SyntaxKind::RBRACKET => "`]`",
            SyntaxKind::TAG_OPEN => "tag",
            SyntaxKind::TAG_CLOSE => "`)>`",
            SyntaxKind::LIST_BULLET => "`*`",
            SyntaxKind::SECTION_OPEN => "section header",
            SyntaxKind::SECTION_CLOSE => "section close",
            SyntaxKind::ALIAS => "alias",
            SyntaxKind::STRING => "string",
            SyntaxKind::UNQUOTED => "unquoted string",
            SyntaxKind::NUMBER => "number",
            SyntaxKind::TRUE_KW => "`true`",
            SyntaxKind::FALSE_KW => "`false`",
            SyntaxKind::NONE_KW => "`none`",
        }
    }
}
