//! Tokenizer for Python source text.
//!
//! Converts a UTF-8 buffer into the token stream the formatter consumes:
//! - INDENT/DEDENT tokens derived from an indent stack (tab stop 8)
//! - implicit line joining inside `()`, `[]` and `{}`
//! - explicit backslash continuations, emitted as continuation markers
//! - strings with `r`/`b`/`u`/`f` prefixes and triple-quote forms
//! - comments kept as tokens so they travel with their logical line
//!
//! Unterminated strings, unmatched brackets and inconsistent dedents are
//! reported as [`FormatError::Parse`] with the offending source position.

use crate::error::FormatError;
use crate::parser::token::{is_python_keyword, Token, TokenKind};

/// Tab stop used when measuring indentation.
const TAB_WIDTH: usize = 8;

/// Multi-character operators, longest first within each length class.
const OPERATORS3: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const OPERATORS2: &[&str] = &[
    "==", "!=", "<=", ">=", "->", ":=", "+=", "-=", "*=", "/=", "%=", "@=", "&=", "|=", "^=",
    "**", "//", "<<", ">>",
];
const OPERATORS1: &str = "+-*/%@&|^~<>=()[]{},:.;";

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    paren_depth: usize,
    indents: Vec<usize>,
    tokens: Vec<Token>,
    line_has_tokens: bool,
}

/// Tokenize a source buffer.
pub fn tokenize(source: &str) -> Result<Vec<Token>, FormatError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        col: 0,
        paren_depth: 0,
        indents: vec![0],
        tokens: Vec::new(),
        line_has_tokens: false,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::parse(self.line, self.col, message)
    }

    fn push_token(&mut self, kind: TokenKind, text: impl Into<String>, line: usize, col: usize) {
        if !matches!(
            kind,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::EndMarker
        ) {
            self.line_has_tokens = true;
        }
        self.tokens.push(Token::new(kind, text, line, col));
    }

    fn run(&mut self) -> Result<(), FormatError> {
        let mut at_line_start = true;

        while self.pos < self.chars.len() {
            if at_line_start && self.paren_depth == 0 {
                if self.handle_line_start()? {
                    continue;
                }
                at_line_start = false;
                continue;
            }

            match self.peek() {
                None => break,
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('\n') => {
                    if self.paren_depth == 0 {
                        let (line, col) = (self.line, self.col);
                        self.push_token(TokenKind::Newline, "\n", line, col);
                        self.line_has_tokens = false;
                        at_line_start = true;
                    }
                    self.bump();
                }
                Some('#') => self.lex_comment(),
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    let (line, col) = (self.line, self.col);
                    if self.paren_depth == 0 {
                        self.push_token(TokenKind::Continuation, "\\", line, col);
                    }
                    self.bump();
                    self.bump();
                }
                Some('\'' | '"') => self.lex_string(String::new())?,
                Some(c) if c.is_alphabetic() || c == '_' => self.lex_name()?,
                Some(c) if c.is_ascii_digit() => self.lex_number(),
                Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.lex_number();
                }
                Some(_) => self.lex_operator()?,
            }
        }

        if self.line_has_tokens {
            let (line, col) = (self.line, self.col);
            self.push_token(TokenKind::Newline, "\n", line, col);
        }
        if self.paren_depth > 0 {
            return Err(self.error("unexpected end of file inside brackets"));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            let line = self.line;
            self.push_token(TokenKind::Dedent, "", line, 0);
        }
        let line = self.line;
        self.push_token(TokenKind::EndMarker, "", line, 0);
        Ok(())
    }

    /// Measure indentation and emit INDENT/DEDENT tokens. Returns true when
    /// the line was blank or comment-only (indent stack untouched).
    fn handle_line_start(&mut self) -> Result<bool, FormatError> {
        let mut width = 0usize;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = width / TAB_WIDTH * TAB_WIDTH + TAB_WIDTH,
                '\r' => {}
                _ => break,
            }
            self.bump();
        }
        self.col = width;

        match self.peek() {
            None => Ok(true),
            Some('\n') => {
                self.bump();
                Ok(true)
            }
            Some('#') => {
                // Comment-only lines do not affect the indent stack.
                self.lex_comment();
                if self.peek() == Some('\n') {
                    let (line, col) = (self.line, self.col);
                    self.push_token(TokenKind::Newline, "\n", line, col);
                    self.line_has_tokens = false;
                    self.bump();
                }
                Ok(true)
            }
            Some(_) => {
                let current = *self.indents.last().unwrap_or(&0);
                if width > current {
                    self.indents.push(width);
                    let line = self.line;
                    self.push_token(TokenKind::Indent, "", line, 0);
                } else if width < current {
                    while self
                        .indents
                        .last()
                        .is_some_and(|&level| level > width)
                    {
                        self.indents.pop();
                        let line = self.line;
                        self.push_token(TokenKind::Dedent, "", line, 0);
                    }
                    if *self.indents.last().unwrap_or(&0) != width {
                        return Err(
                            self.error("unindent does not match any outer indentation level")
                        );
                    }
                }
                Ok(false)
            }
        }
    }

    fn lex_comment(&mut self) {
        let (line, col) = (self.line, self.col);
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        let trimmed = text.trim_end().to_string();
        self.push_token(TokenKind::Comment, trimmed, line, col);
    }

    fn lex_name(&mut self) -> Result<(), FormatError> {
        let (line, col) = (self.line, self.col);
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        // A short identifier made of string-prefix letters directly followed
        // by a quote starts a string literal.
        let is_prefix = text.len() <= 2
            && text
                .chars()
                .all(|c| matches!(c.to_ascii_lowercase(), 'r' | 'b' | 'u' | 'f'));
        if is_prefix && matches!(self.peek(), Some('\'' | '"')) {
            self.pos -= text.len();
            self.col -= text.len();
            let prefix = std::mem::take(&mut text);
            for _ in 0..prefix.len() {
                self.bump();
            }
            return self.lex_string_at(prefix, line, col);
        }

        let kind = if is_python_keyword(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Name
        };
        self.push_token(kind, text, line, col);
        Ok(())
    }

    fn lex_string(&mut self, prefix: String) -> Result<(), FormatError> {
        let (line, col) = (self.line, self.col);
        self.lex_string_at(prefix, line, col)
    }

    fn lex_string_at(
        &mut self,
        prefix: String,
        line: usize,
        col: usize,
    ) -> Result<(), FormatError> {
        let quote = self.peek().ok_or_else(|| self.error("expected quote"))?;
        let mut text = prefix;
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let delim_len = if triple { 3 } else { 1 };
        for _ in 0..delim_len {
            text.push(self.bump().ok_or_else(|| self.error("unterminated string"))?);
        }

        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated string literal"));
            };
            if c == '\\' {
                text.push(self.bump().unwrap_or('\\'));
                if let Some(escaped) = self.bump() {
                    text.push(escaped);
                }
                continue;
            }
            if c == '\n' && !triple {
                return Err(self.error("newline inside single-quoted string"));
            }
            if c == quote {
                if triple {
                    if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                        for _ in 0..3 {
                            text.push(self.bump().unwrap_or(quote));
                        }
                        break;
                    }
                    text.push(self.bump().unwrap_or(quote));
                    continue;
                }
                text.push(self.bump().unwrap_or(quote));
                break;
            }
            text.push(self.bump().unwrap_or(c));
        }
        self.push_token(TokenKind::String, text, line, col);
        Ok(())
    }

    fn lex_number(&mut self) {
        let (line, col) = (self.line, self.col);
        let mut text = String::new();
        let mut last = '\0';
        while let Some(c) = self.peek() {
            let is_exponent_sign = matches!(c, '+' | '-')
                && matches!(last, 'e' | 'E')
                && !text.starts_with("0x")
                && !text.starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || is_exponent_sign {
                text.push(c);
                last = c;
                self.bump();
            } else {
                break;
            }
        }
        self.push_token(TokenKind::Number, text, line, col);
    }

    fn lex_operator(&mut self) -> Result<(), FormatError> {
        let (line, col) = (self.line, self.col);

        let take = |lexer: &Lexer, len: usize| -> String {
            (0..len)
                .filter_map(|offset| lexer.peek_at(offset))
                .collect()
        };

        let three = take(self, 3);
        let two = take(self, 2);
        let text = if OPERATORS3.contains(&three.as_str()) {
            three
        } else if OPERATORS2.contains(&two.as_str()) {
            two
        } else {
            let c = self.peek().ok_or_else(|| self.error("expected operator"))?;
            if !OPERATORS1.contains(c) {
                return Err(self.error(format!("unexpected character {c:?}")));
            }
            c.to_string()
        };

        match text.as_str() {
            "(" | "[" | "{" => self.paren_depth += 1,
            ")" | "]" | "}" => {
                if self.paren_depth == 0 {
                    return Err(self.error(format!("unmatched {:?}", text)));
                }
                self.paren_depth -= 1;
            }
            _ => {}
        }

        for _ in 0..text.chars().count() {
            self.bump();
        }
        self.push_token(TokenKind::Operator, text, line, col);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|tok| (tok.kind, tok.text))
            .collect()
    }

    #[test]
    fn test_simple_statement() {
        let toks = kinds("x = 1\n");
        assert_eq!(
            toks,
            vec![
                (TokenKind::Name, "x".to_string()),
                (TokenKind::Operator, "=".to_string()),
                (TokenKind::Number, "1".to_string()),
                (TokenKind::Newline, "\n".to_string()),
                (TokenKind::EndMarker, String::new()),
            ]
        );
    }

    #[test]
    fn test_indent_dedent() {
        let toks = kinds("if a:\n    b = 1\nc = 2\n");
        let kinds_only: Vec<TokenKind> = toks.iter().map(|(k, _)| *k).collect();
        assert!(kinds_only.contains(&TokenKind::Indent));
        assert!(kinds_only.contains(&TokenKind::Dedent));
        // The dedent must precede the token for `c`.
        let dedent_pos = kinds_only
            .iter()
            .position(|k| *k == TokenKind::Dedent)
            .unwrap();
        let c_pos = toks.iter().position(|(_, t)| t == "c").unwrap();
        assert!(dedent_pos < c_pos);
    }

    #[test]
    fn test_implicit_continuation_in_brackets() {
        let toks = kinds("x = [1,\n     2]\n");
        let newline_count = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Newline)
            .count();
        assert_eq!(newline_count, 1, "no newline token inside brackets");
    }

    #[test]
    fn test_backslash_continuation() {
        let toks = kinds("x = 1 + \\\n    2\n");
        assert!(toks.iter().any(|(k, _)| *k == TokenKind::Continuation));
        let newline_count = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Newline)
            .count();
        assert_eq!(newline_count, 1);
    }

    #[test]
    fn test_string_prefixes_and_triple() {
        let toks = kinds("s = r'raw'\nt = '''a\nb'''\n");
        let strings: Vec<&String> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::String)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(strings, vec!["r'raw'", "'''a\nb'''"]);
    }

    #[test]
    fn test_fstring_is_single_token() {
        let toks = kinds("x = f'{a} and {b}'\n");
        let strings: Vec<&String> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::String)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(strings, vec!["f'{a} and {b}'"]);
    }

    #[test]
    fn test_operators_longest_match() {
        let toks = kinds("a //= b ** c != d\n");
        let ops: Vec<&String> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Operator)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(ops, vec!["//=", "**", "!="]);
    }

    #[test]
    fn test_walrus_and_arrow() {
        let toks = kinds("def f(a) -> int:\n    return (b := a)\n");
        let ops: Vec<&String> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Operator)
            .map(|(_, t)| t)
            .collect();
        assert!(ops.contains(&&"->".to_string()));
        assert!(ops.contains(&&":=".to_string()));
    }

    #[test]
    fn test_comment_only_line_keeps_indent_stack() {
        let toks = kinds("if a:\n    b = 1\n# comment\nc = 2\n");
        // Exactly one dedent: the comment line must not dedent early.
        let dedents = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Dedent)
            .count();
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_unterminated_string_error() {
        let err = tokenize("x = 'abc\n").unwrap_err();
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_unmatched_bracket_error() {
        assert!(tokenize("x = (1\n").is_err());
        assert!(tokenize("x = 1)\n").is_err());
    }

    #[test]
    fn test_inconsistent_dedent_error() {
        let err = tokenize("if a:\n        b = 1\n   c = 2\n").unwrap_err();
        assert!(err.to_string().contains("unindent"));
    }

    #[test]
    fn test_number_forms() {
        let toks = kinds("a = 0x1F + 1_000 + 3.14e-2 + 2j\n");
        let numbers: Vec<&String> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Number)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(numbers, vec!["0x1F", "1_000", "3.14e-2", "2j"]);
    }

    #[test]
    fn test_missing_trailing_newline() {
        let toks = kinds("x = 1");
        assert!(toks.iter().any(|(k, _)| *k == TokenKind::Newline));
    }
}
