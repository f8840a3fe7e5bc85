//! Joining short compound statements onto one physical line.
//!
//! `if cond:` followed by a simple one-line body may become
//! `if cond: body` when the style enables it and the joined form fits the
//! column limit. At most two lines ever merge, and never onto a `def` or
//! `class` header.

use crate::config::Style;
use crate::format::logical_lines::LogicalLine;

/// Determine if the line at `index` can absorb the line that follows it.
///
/// `last_was_merged` allows an `elif`/`else` header to merge when the `if`
/// before it merged too.
#[must_use]
pub fn can_merge_multiple_lines(
    lines: &[LogicalLine],
    index: usize,
    last_was_merged: bool,
    style: &Style,
) -> bool {
    let rest = &lines[index..];
    let indent_amt = style.indent_width * rest[0].depth;
    if rest.len() < 2 || indent_amt > style.column_limit {
        return false;
    }

    if rest.len() >= 3 && rest[2].depth >= rest[1].depth && rest[0].depth != rest[2].depth {
        // Not a single-statement suite; don't merge more than two lines.
        return false;
    }

    if matches!(rest[0].effective_first_value(), "def" | "class") {
        return false;
    }

    let mut limit = style.column_limit - indent_amt;
    if rest[0].last().total_length >= limit {
        return false;
    }
    limit -= rest[0].last().total_length;

    if rest[0].first().text == "if" {
        return can_merge_into_if_statement(rest, limit, style);
    }
    if last_was_merged && matches!(rest[0].first().text.as_str(), "elif" | "else") {
        return can_merge_into_if_statement(rest, limit, style);
    }

    false
}

/// A body line can join its `if` header when it is a simple statement that
/// fits in the space the header leaves.
fn can_merge_into_if_statement(lines: &[LogicalLine], limit: usize, style: &Style) -> bool {
    if lines[1].tokens.len() == 1 && lines[1].last().is_multiline_string() {
        // A multiline string might be a shebang-style block; joining could
        // change its meaning.
        return true;
    }
    if !matches!(
        lines[1].effective_first_value(),
        "pass" | "continue" | "break"
    ) {
        return false;
    }
    if lines[1].tokens.len() != lines[1].last_content_index() + 1 {
        // Trailing comments keep the body on its own line.
        return false;
    }
    if lines[1].last().total_length >= limit {
        return false;
    }
    if lines[1].has_continuation_markers() || lines[1].disable {
        return false;
    }
    style.join_multiple_lines
}
