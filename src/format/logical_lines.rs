//! Logical line construction.
//!
//! A logical line collects every token that could appear on a single
//! physical line if there were no width restrictions: one statement, or one
//! compound-statement header, with bracketed continuations folded in.
//! Standalone comments form their own logical lines and take the depth of
//! the statement that follows them.

use crate::error::FormatError;
use crate::parser::token::{Token, TokenKind};

/// One statement's worth of tokens, ready for annotation and reflow.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    /// Block nesting level (indent levels, not columns).
    pub depth: usize,
    pub tokens: Vec<Token>,
    /// Reflow is bypassed for this line.
    pub disable: bool,
    /// Single string statement opening a module, class or function body.
    pub is_docstring: bool,
}

impl LogicalLine {
    #[must_use]
    pub fn new(depth: usize, tokens: Vec<Token>) -> Self {
        LogicalLine {
            depth,
            tokens,
            disable: false,
            is_docstring: false,
        }
    }

    #[must_use]
    pub fn first(&self) -> &Token {
        &self.tokens[0]
    }

    #[must_use]
    pub fn last(&self) -> &Token {
        &self.tokens[self.tokens.len() - 1]
    }

    /// Source line of the first token.
    #[must_use]
    pub fn lineno(&self) -> usize {
        self.first().lineno
    }

    #[must_use]
    pub fn is_comment_line(&self) -> bool {
        self.first().is_comment()
    }

    /// True if any token is an explicit continuation marker.
    #[must_use]
    pub fn has_continuation_markers(&self) -> bool {
        self.tokens.iter().any(Token::is_continuation)
    }

    /// First token value, looking through `async`.
    #[must_use]
    pub fn effective_first_value(&self) -> &str {
        if self.first().text == "async" && self.tokens.len() > 1 {
            &self.tokens[1].text
        } else {
            &self.first().text
        }
    }

    /// Index of the last token that is not a trailing comment.
    #[must_use]
    pub fn last_content_index(&self) -> usize {
        let mut idx = self.tokens.len() - 1;
        while idx > 0 && self.tokens[idx].is_comment() {
            idx -= 1;
        }
        idx
    }

    /// Index of the opening bracket enclosing `index`, if any.
    #[must_use]
    pub fn enclosing_bracket(&self, index: usize) -> Option<usize> {
        let mut idx = index;
        loop {
            let tok = &self.tokens[idx];
            if tok.closes_scope() {
                idx = tok.matching_bracket?;
            } else if tok.opens_scope() && idx != index {
                return Some(idx);
            }
            if idx == 0 {
                return None;
            }
            idx -= 1;
        }
    }

    /// Walk from `index` to the last token of the line, stopping at a
    /// trailing comment.
    #[must_use]
    pub fn last_token_in_line(&self, index: usize) -> usize {
        let mut idx = index;
        while idx + 1 < self.tokens.len() && !self.tokens[idx].is_comment() {
            idx += 1;
        }
        if self.tokens[idx].is_comment() && idx > index {
            idx - 1
        } else {
            idx
        }
    }

    /// Append a token, used when merging lines.
    pub fn append_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Resolve matching-bracket partner indices within this line.
    pub fn resolve_matching_brackets(&mut self) -> Result<(), FormatError> {
        let mut stack: Vec<usize> = Vec::new();
        for idx in 0..self.tokens.len() {
            if self.tokens[idx].opens_scope() {
                stack.push(idx);
            } else if self.tokens[idx].closes_scope() {
                let Some(open) = stack.pop() else {
                    let tok = &self.tokens[idx];
                    return Err(FormatError::parse(
                        tok.lineno,
                        tok.column,
                        format!("unmatched {:?}", tok.text),
                    ));
                };
                self.tokens[open].matching_bracket = Some(idx);
                self.tokens[idx].matching_bracket = Some(open);
            }
        }
        if let Some(open) = stack.pop() {
            let tok = &self.tokens[open];
            return Err(FormatError::parse(
                tok.lineno,
                tok.column,
                format!("unclosed {:?}", tok.text),
            ));
        }
        Ok(())
    }
}

/// Group a token stream into logical lines.
///
/// Every non-whitespace token of the input appears exactly once in some
/// output line, in original order.
pub fn build_logical_lines(tokens: Vec<Token>) -> Result<Vec<LogicalLine>, FormatError> {
    let mut lines: Vec<LogicalLine> = Vec::new();
    let mut pending_comments: Vec<Token> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut depth = 0usize;
    // (depth, first-token column) of the previous code line.
    let mut prev_code: Option<(usize, usize)> = None;
    // Set when the previous code line is a class/def header; the next
    // single-string statement is its docstring. Module docstrings are the
    // very first statement.
    let mut docstring_context = true;

    for token in tokens {
        match token.kind {
            TokenKind::Indent => depth += 1,
            TokenKind::Dedent => depth = depth.saturating_sub(1),
            TokenKind::EndMarker => {}
            TokenKind::Newline => {
                if current.is_empty() {
                    continue;
                }
                let statement = std::mem::take(&mut current);
                if statement.len() == 1 && statement[0].is_comment() {
                    pending_comments.push(statement.into_iter().next().unwrap_or_else(|| {
                        unreachable!("statement has exactly one token")
                    }));
                    continue;
                }

                let column = statement[0].column;
                flush_comments(&mut lines, &mut pending_comments, depth, column, prev_code);

                let mut line = LogicalLine::new(depth, statement);
                line.resolve_matching_brackets()?;
                line.is_docstring = docstring_context
                    && line.tokens.len() == 1
                    && line.first().is_string();
                docstring_context = is_suite_header(&line);
                prev_code = Some((depth, column));
                lines.push(line);
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        let column = current[0].column;
        flush_comments(&mut lines, &mut pending_comments, depth, column, prev_code);
        let mut line = LogicalLine::new(depth, current);
        line.resolve_matching_brackets()?;
        lines.push(line);
    }
    // Trailing comments at end of file align with the last code line when
    // they are indented at least as far, otherwise with the module level.
    for comment in pending_comments.drain(..) {
        let comment_depth = match prev_code {
            Some((prev_depth, prev_col)) if prev_col > 0 && comment.column >= prev_col => {
                prev_depth
            }
            _ => depth,
        };
        lines.push(LogicalLine::new(comment_depth, vec![comment]));
    }

    Ok(lines)
}

/// Emit pending standalone comments before a code line at `next_depth`.
fn flush_comments(
    lines: &mut Vec<LogicalLine>,
    pending: &mut Vec<Token>,
    next_depth: usize,
    next_column: usize,
    prev_code: Option<(usize, usize)>,
) {
    for comment in pending.drain(..) {
        // Comments normally align with the statement that follows them. A
        // comment indented past the following statement but level with the
        // previous one belongs to the previous (deeper) block.
        let depth = match prev_code {
            Some((prev_depth, prev_col))
                if prev_depth > next_depth
                    && comment.column > next_column
                    && comment.column >= prev_col =>
            {
                prev_depth
            }
            _ => next_depth,
        };
        lines.push(LogicalLine::new(depth, vec![comment]));
    }
}

/// A compound-statement header whose suite follows (`class X:`, `def f():`).
fn is_suite_header(line: &LogicalLine) -> bool {
    matches!(line.effective_first_value(), "class" | "def")
        && line.tokens[line.last_content_index()].text == ":"
}
