//! Token model shared by the lexer and the formatter.
//!
//! A [`Token`] carries the original lexeme plus the annotations the reflow
//! engine consumes: required spacing, split penalty, breakability flags and
//! the accumulated width up to the next break opportunity.

use std::sync::LazyLock;

use regex::Regex;

/// Syntactic category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Keyword,
    Number,
    String,
    Operator,
    Comment,
    /// An explicit backslash line continuation.
    Continuation,
    /// End of a logical source line (only emitted outside brackets).
    Newline,
    Indent,
    Dedent,
    EndMarker,
}

/// Subtype tags attached by the annotator, stored as a bit set.
///
/// A token may carry several tags at once (e.g. a default-parameter `=`
/// whose parameter also has a type annotation).
pub mod subtypes {
    pub const NONE: u32 = 0;
    pub const UNARY_OPERATOR: u32 = 1 << 0;
    pub const BINARY_OPERATOR: u32 = 1 << 1;
    pub const SUBSCRIPT_COLON: u32 = 1 << 2;
    pub const SUBSCRIPT_BRACKET: u32 = 1 << 3;
    /// `=` of a default parameter value in a `def` or `lambda`.
    pub const DEFAULT_ASSIGN: u32 = 1 << 4;
    /// `=` of a keyword argument in a call.
    pub const NAMED_ASSIGN: u32 = 1 << 5;
    pub const VARARGS_STAR: u32 = 1 << 6;
    pub const KWARGS_STAR_STAR: u32 = 1 << 7;
    /// Statement-level `=` or augmented assignment operator.
    pub const ASSIGN_OPERATOR: u32 = 1 << 8;
    /// First token of a dictionary key.
    pub const DICTIONARY_KEY: u32 = 1 << 9;
    /// Any token belonging to a dictionary key.
    pub const DICTIONARY_KEY_PART: u32 = 1 << 10;
    /// First token of a dictionary value.
    pub const DICTIONARY_VALUE: u32 = 1 << 11;
    /// The `:` separating a dictionary key from its value.
    pub const DICT_COLON: u32 = 1 << 12;
    /// The `for` of a dict/set comprehension.
    pub const DICT_SET_GENERATOR: u32 = 1 << 13;
    /// Opening bracket that encloses a comprehension.
    pub const COMP_START: u32 = 1 << 14;
    pub const COMP_FOR: u32 = 1 << 15;
    pub const COMP_IF: u32 = 1 << 16;
    /// Name being defined by `def`.
    pub const FUNC_DEF: u32 = 1 << 17;
    pub const DECORATOR: u32 = 1 << 18;
    /// Annotated name, its `:`, or the `=` of an annotated default.
    pub const TYPED_NAME: u32 = 1 << 19;
    /// Token belonging to a lambda expression.
    pub const LAMBDEF: u32 = 1 << 20;
    /// Higher-precedence operator inside a mixed-precedence simple
    /// expression (arithmetic precedence indication).
    pub const SIMPLE_EXPRESSION: u32 = 1 << 21;
    /// Opening/closing bracket of a list display.
    pub const LIST_BRACKET: u32 = 1 << 22;
    /// Opening/closing bracket of a dict/set display.
    pub const DICT_BRACKET: u32 = 1 << 23;
    /// Opening/closing bracket of a parenthesized tuple or expression.
    pub const TUPLE_BRACKET: u32 = 1 << 24;
}

pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

/// Check whether an identifier is a Python keyword.
#[must_use]
pub fn is_python_keyword(text: &str) -> bool {
    PYTHON_KEYWORDS.binary_search(&text).is_ok()
}

const ARITHMETIC_OPS: &[&str] = &[
    "+", "-", "*", "@", "/", "//", "%", "<<", ">>", "|", "&", "^", "**",
];

/// Comment that suppresses line-length checks for its line.
static SUPPRESSION_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#.*(\bpylint:\s*disable=line-too-long\b|\bnoqa\b)").unwrap()
});

/// A single token plus its formatting annotations.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based source line of the token's first character.
    pub lineno: usize,
    /// 0-based source column of the token's first character.
    pub column: usize,
    pub subtypes: u32,
    /// Lower bound on the number of spaces before this token.
    pub spaces_required_before: usize,
    /// Penalty for breaking the line before this token.
    pub split_penalty: u64,
    pub can_break_before: bool,
    pub must_break_before: bool,
    /// Width of the logical line up to and including this token.
    pub total_length: usize,
    /// Index of the partner bracket within the same logical line.
    pub matching_bracket: Option<usize>,
    /// Rendered whitespace preceding the token (newlines + indent).
    pub whitespace_prefix: String,
    /// Newline count carried over from the original source, overriding the
    /// single newline a break decision would produce.
    pub preset_newlines: Option<usize>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, lineno: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            lineno,
            column,
            subtypes: subtypes::NONE,
            spaces_required_before: 0,
            split_penalty: 0,
            can_break_before: false,
            must_break_before: false,
            total_length: 0,
            matching_bracket: None,
            whitespace_prefix: String::new(),
            preset_newlines: None,
        }
    }

    #[must_use]
    pub fn has_subtype(&self, mask: u32) -> bool {
        self.subtypes & mask != 0
    }

    pub fn add_subtype(&mut self, mask: u32) {
        self.subtypes |= mask;
    }

    #[must_use]
    pub fn opens_scope(&self) -> bool {
        self.kind == TokenKind::Operator && matches!(self.text.as_str(), "(" | "[" | "{")
    }

    #[must_use]
    pub fn closes_scope(&self) -> bool {
        self.kind == TokenKind::Operator && matches!(self.text.as_str(), ")" | "]" | "}")
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.kind == TokenKind::Continuation
    }

    #[must_use]
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Name
    }

    #[must_use]
    pub fn is_keyword(&self) -> bool {
        self.kind == TokenKind::Keyword
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        self.kind == TokenKind::Number
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind == TokenKind::String
    }

    #[must_use]
    pub fn is_multiline_string(&self) -> bool {
        self.is_string() && self.text.contains('\n')
    }

    #[must_use]
    pub fn is_binary_op(&self) -> bool {
        self.has_subtype(subtypes::BINARY_OPERATOR)
    }

    #[must_use]
    pub fn is_arithmetic_op(&self) -> bool {
        ARITHMETIC_OPS.contains(&self.text.as_str())
    }

    /// Comment carrying a line-length suppression marker; such lines are
    /// excluded from column-limit measurement.
    #[must_use]
    pub fn is_suppression_comment(&self) -> bool {
        self.is_comment() && SUPPRESSION_COMMENT_RE.is_match(&self.text)
    }

    /// Width in columns of the token text (first line for multi-line
    /// strings, since only that part extends the current line).
    #[must_use]
    pub fn width(&self) -> usize {
        match self.text.split('\n').next() {
            Some(first) => first.chars().count(),
            None => 0,
        }
    }

    /// Width of the final line of a multi-line token.
    #[must_use]
    pub fn last_line_width(&self) -> usize {
        match self.text.split('\n').next_back() {
            Some(last) => last.chars().count(),
            None => 0,
        }
    }

    /// Number of embedded newlines in the token text.
    #[must_use]
    pub fn newline_count(&self) -> usize {
        self.text.matches('\n').count()
    }

    /// Source line on which this token ends.
    #[must_use]
    pub fn end_lineno(&self) -> usize {
        self.lineno + self.newline_count()
    }

    /// Replace the number of leading newlines in the whitespace prefix.
    pub fn adjust_newlines_before(&mut self, newlines: usize) {
        let rest = self.whitespace_prefix.trim_start_matches('\n');
        self.whitespace_prefix = format!("{}{}", "\n".repeat(newlines), rest);
    }
}
