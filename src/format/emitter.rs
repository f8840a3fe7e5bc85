//! Whitespace emission.
//!
//! Turns committed break decisions into the whitespace prefixes stored on
//! each token, renders disabled lines at their original positions, aligns
//! trailing comments when the style asks for alignment columns, and
//! assembles the final output text.

use crate::config::{ContinuationAlignStyle, Style};
use crate::format::decision_state::TokenPlacement;
use crate::format::logical_lines::LogicalLine;
use crate::parser::token::Token;

/// Padding for continuation alignment under tabbed indentation. The fixed
/// and valign-right styles round up to whole tabs; visual alignment keeps
/// spaces.
fn continuation_padding(spaces: usize, style: &Style) -> String {
    match style.continuation_align_style {
        ContinuationAlignStyle::Fixed | ContinuationAlignStyle::ValignRight if spaces > 0 => {
            "\t".repeat(spaces.div_ceil(style.indent_width))
        }
        ContinuationAlignStyle::Fixed | ContinuationAlignStyle::ValignRight => String::new(),
        ContinuationAlignStyle::Space => " ".repeat(spaces),
    }
}

/// Render the whitespace that precedes a token.
fn prefix_text(newlines: usize, spaces: usize, indent_level: usize, style: &Style) -> String {
    let indent_before = if style.use_tabs {
        if newlines > 0 {
            format!(
                "{}{}",
                "\t".repeat(indent_level),
                continuation_padding(spaces, style)
            )
        } else {
            format!("{}{}", "\t".repeat(indent_level), " ".repeat(spaces))
        }
    } else {
        format!(
            "{}{}",
            " ".repeat(indent_level * style.indent_width),
            " ".repeat(spaces)
        )
    };
    format!("{}{}", "\n".repeat(newlines), indent_before)
}

/// Commit a placement decision onto a token.
pub fn apply_placement(tok: &mut Token, placement: TokenPlacement, style: &Style) {
    // An original blank-line count recorded on the token wins over the
    // single newline a break decision produces.
    let newlines = tok
        .preset_newlines
        .filter(|&n| n > 0)
        .unwrap_or(placement.newlines);
    let indent_level = if newlines > 0 { placement.indent_level } else { 0 };
    tok.whitespace_prefix = prefix_text(newlines, placement.spaces, indent_level, style);
}

/// Set the prefix of a line's first token: blank lines plus block indent.
pub fn set_first_token_prefix(line: &mut LogicalLine, newlines: usize, style: &Style) {
    let depth = line.depth;
    line.tokens[0].whitespace_prefix = prefix_text(newlines, 0, depth, style);
}

/// Emit a line with its original horizontal and vertical spacing. The first
/// token keeps `first_newlines` newlines and its original column.
pub fn emit_unformatted(line: &mut LogicalLine, first_newlines: usize) {
    let first_column = line.tokens[0].column;
    line.tokens[0].whitespace_prefix = format!(
        "{}{}",
        "\n".repeat(first_newlines),
        " ".repeat(first_column)
    );

    for i in 1..line.tokens.len() {
        let prev = &line.tokens[i - 1];
        let prev_end_line = prev.end_lineno();
        let prev_end_column = if prev.newline_count() > 0 {
            prev.last_line_width()
        } else {
            prev.column + prev.width()
        };
        let cur_line = line.tokens[i].lineno;
        let cur_column = line.tokens[i].column;

        let newlines = cur_line.saturating_sub(prev_end_line);
        let spaces = if newlines > 0 {
            cur_column
        } else {
            cur_column.saturating_sub(prev_end_column)
        };
        line.tokens[i].whitespace_prefix =
            format!("{}{}", "\n".repeat(newlines), " ".repeat(spaces));
    }
}

/// Prefix with blank-line indentation applied when the style requests it.
fn formatted_prefix(tok: &Token, style: &Style) -> String {
    if style.indent_blank_lines {
        let without_newlines = tok.whitespace_prefix.trim_start_matches('\n');
        let height = tok.whitespace_prefix.len() - without_newlines.len();
        if height > 0 {
            return format!("\n{without_newlines}").repeat(height);
        }
    }
    tok.whitespace_prefix.clone()
}

/// Align trailing comments in blank-line-delimited blocks to the first
/// configured column that clears the code.
pub fn align_trailing_comments(final_lines: &mut [LogicalLine], style: &Style) {
    let Some(columns) = style.spaces_before_comment.alignment_columns() else {
        return;
    };
    let columns = columns.to_vec();

    let mut index = 0;
    while index < final_lines.len() {
        if !final_lines[index].tokens.iter().any(Token::is_comment) {
            index += 1;
            continue;
        }

        // Measure the block: code width before each comment, and the
        // longest physical code line, until a blank line or end of input.
        let mut block_comment_lengths: Vec<Vec<usize>> = Vec::new();
        let mut max_line_length = 0usize;
        let mut block_end = index;
        while block_end < final_lines.len() {
            let line = &final_lines[block_end];
            if block_end > index && line.first().whitespace_prefix.starts_with("\n\n") {
                break;
            }
            if line.disable {
                block_comment_lengths.push(Vec::new());
                block_end += 1;
                continue;
            }

            let mut content_len = 0usize;
            let mut lengths = Vec::new();
            for tok in &line.tokens {
                let prefix = &tok.whitespace_prefix;
                let after_newline = match prefix.rfind('\n') {
                    Some(pos) => {
                        max_line_length = max_line_length.max(content_len);
                        content_len = 0;
                        &prefix[pos + 1..]
                    }
                    None => prefix.as_str(),
                };
                if tok.is_comment() {
                    lengths.push(content_len);
                } else {
                    content_len += after_newline.chars().count() + tok.width();
                }
            }
            if let Some(longest) = lengths.iter().max() {
                max_line_length = max_line_length.max(*longest);
            }
            block_comment_lengths.push(lengths);
            block_end += 1;
        }

        max_line_length += 2;
        let aligned_col = columns
            .iter()
            .find(|&&col| col > max_line_length)
            .copied()
            .unwrap_or(max_line_length);

        for (offset, lengths) in block_comment_lengths.iter().enumerate() {
            if lengths.is_empty() {
                continue;
            }
            let line = &mut final_lines[index + offset];
            let mut length_index = 0;
            for tok in &mut line.tokens {
                if !tok.is_comment() || length_index >= lengths.len() {
                    continue;
                }
                let before = lengths[length_index];
                length_index += 1;
                let spaces = aligned_col.saturating_sub(before + 1).max(1);
                let newlines: String = tok
                    .whitespace_prefix
                    .chars()
                    .take_while(|&c| c == '\n')
                    .collect();
                tok.whitespace_prefix = format!("{}{}", newlines, " ".repeat(spaces));
            }
        }

        index = block_end.max(index + 1);
    }
}

/// Compose the final output from the finalized lines.
#[must_use]
pub fn render(final_lines: &[LogicalLine], style: &Style) -> String {
    let mut out = String::new();
    for line in final_lines {
        for tok in &line.tokens {
            out.push_str(&formatted_prefix(tok, style));
            out.push_str(&tok.text);
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::TokenKind;

    fn tok(text: &str, lineno: usize, column: usize) -> Token {
        Token::new(TokenKind::Name, text, lineno, column)
    }

    #[test]
    fn test_prefix_spaces() {
        let style = Style::default();
        assert_eq!(prefix_text(1, 4, 1, &style), "\n        ");
        assert_eq!(prefix_text(0, 1, 0, &style), " ");
        assert_eq!(prefix_text(2, 0, 0, &style), "\n\n");
    }

    #[test]
    fn test_prefix_tabs() {
        let style = Style {
            use_tabs: true,
            ..Style::default()
        };
        // Visual alignment keeps spaces beyond the tabbed indent.
        assert_eq!(prefix_text(1, 4, 1, &style), "\n\t    ");
    }

    #[test]
    fn test_prefix_tabs_fixed_alignment() {
        let style = Style {
            use_tabs: true,
            continuation_align_style: ContinuationAlignStyle::Fixed,
            ..Style::default()
        };
        assert_eq!(prefix_text(1, 4, 1, &style), "\n\t\t");
        assert_eq!(prefix_text(1, 6, 1, &style), "\n\t\t\t");
    }

    #[test]
    fn test_apply_placement_preset_newlines() {
        let style = Style::default();
        let placement = TokenPlacement {
            newlines: 1,
            spaces: 0,
            indent_level: 0,
        };
        let mut comment = Token::new(TokenKind::Comment, "# note", 5, 0);
        comment.preset_newlines = Some(2);
        apply_placement(&mut comment, placement, &style);
        assert!(comment.whitespace_prefix.starts_with("\n\n"));
    }

    #[test]
    fn test_emit_unformatted_preserves_columns() {
        let style = Style::default();
        let mut line = LogicalLine::new(
            0,
            vec![tok("a", 1, 2), tok("b", 1, 6), tok("c", 3, 4)],
        );
        emit_unformatted(&mut line, 0);
        let text = render(&[line], &style);
        assert_eq!(text, "  a   b\n\n    c\n");
    }

    #[test]
    fn test_indent_blank_lines_prefix() {
        let style = Style {
            indent_blank_lines: true,
            ..Style::default()
        };
        let mut token = tok("x", 1, 0);
        token.whitespace_prefix = "\n\n    ".to_string();
        let line = LogicalLine::new(1, vec![token]);
        let text = render(&[line], &style);
        assert_eq!(text, "\n    \n    x\n");
    }

    #[test]
    fn test_align_trailing_comments() {
        let style = Style {
            spaces_before_comment: crate::config::SpacesBeforeComment::Align(vec![10, 20]),
            ..Style::default()
        };
        let mut code = tok("x", 1, 0);
        code.whitespace_prefix = String::new();
        let mut eq = tok("=", 1, 2);
        eq.whitespace_prefix = " ".to_string();
        let mut one = tok("1", 1, 4);
        one.whitespace_prefix = " ".to_string();
        let mut comment = Token::new(TokenKind::Comment, "# c", 1, 7);
        comment.whitespace_prefix = "  ".to_string();
        let mut lines = [LogicalLine::new(0, vec![code, eq, one, comment])];
        align_trailing_comments(&mut lines, &style);
        let text = render(&lines, &style);
        // "x = 1" is five columns; the first alignment column past 7 is 10,
        // so the comment starts at column 9 (0-based).
        assert_eq!(text, "x = 1    # c\n");
    }
}
