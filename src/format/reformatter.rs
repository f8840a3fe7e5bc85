//! Per-line formatting orchestration.
//!
//! Walks the annotated logical lines in order: joins short compound
//! statements, plans blank lines, then either places everything on one
//! line, runs the break search, or emits the line verbatim (disabled
//! regions and backslash continuations).

use crate::config::Style;
use crate::error::FormatError;
use crate::format::blank_lines::BlankLinePlanner;
use crate::format::decision_state::{FormatDecisionState, TokenPlacement};
use crate::format::emitter;
use crate::format::line_joiner;
use crate::format::logical_lines::LogicalLine;
use crate::format::reflow::analyze_solution_space;
use crate::parser::token::Token;

/// Format the logical lines of one source buffer into output text.
pub fn reformat(lines: Vec<LogicalLine>, style: &Style) -> Result<String, FormatError> {
    let mut final_lines: Vec<LogicalLine> = Vec::new();
    let mut planner = BlankLinePlanner::new();

    for mut lline in merge_lines(lines, style) {
        let first_indent = style.indent_width * lline.depth;

        if lline.disable {
            // Disabled regions keep their original vertical spacing exactly.
            let newlines = match final_lines.last() {
                None => 0,
                Some(prev) => lline.lineno().saturating_sub(prev.last().end_lineno()),
            };
            emitter::emit_unformatted(&mut lline, newlines);
            final_lines.push(lline);
            continue;
        }

        retain_blank_lines_before_comments(&mut lline);
        planner.plan(&mut lline, &mut final_lines, style);

        if lline.has_continuation_markers() {
            // Reflowing around explicit continuations would require
            // re-deriving the marker placement; keep the original layout.
            emit_with_original_layout(&mut lline);
        } else if can_place_on_single_line(&lline, style)
            && !lline.tokens.iter().any(|tok| tok.must_break_before)
        {
            let decisions = vec![false; lline.tokens.len()];
            commit_decisions(&mut lline, &decisions, style, first_indent);
        } else {
            let mut state = FormatDecisionState::new(&lline, style, first_indent);
            state.move_to_next_token();
            let Some(decisions) = analyze_solution_space(state) else {
                return Err(FormatError::Internal(lline.lineno()));
            };
            commit_decisions(&mut lline, &decisions, style, first_indent);
        }

        final_lines.push(lline);
    }

    emitter::align_trailing_comments(&mut final_lines, style);
    if final_lines.is_empty() {
        return Ok(String::new());
    }
    Ok(emitter::render(&final_lines, style))
}

/// Replay a decision vector on a fresh state and write the resulting
/// whitespace prefixes onto the tokens.
fn commit_decisions(
    line: &mut LogicalLine,
    decisions: &[bool],
    style: &Style,
    first_indent: usize,
) {
    let placements: Vec<TokenPlacement> = {
        let mut state = FormatDecisionState::new(line, style, first_indent);
        state.move_to_next_token();
        decisions[1..]
            .iter()
            .map(|&newline| state.add_token(newline, newline).1)
            .collect()
    };
    for (tok, placement) in line.tokens.iter_mut().skip(1).zip(placements) {
        emitter::apply_placement(tok, placement, style);
    }
}

/// Keep the original intra-line layout but let the planner position the
/// first token.
fn emit_with_original_layout(line: &mut LogicalLine) {
    let first_prefix = std::mem::take(&mut line.tokens[0].whitespace_prefix);
    emitter::emit_unformatted(line, 0);
    line.tokens[0].whitespace_prefix = first_prefix;
}

/// Record original blank lines in front of comments appearing mid-line so
/// the emitter can reproduce one blank line there.
fn retain_blank_lines_before_comments(line: &mut LogicalLine) {
    for i in 1..line.tokens.len() {
        let gap = line.tokens[i]
            .lineno
            .saturating_sub(line.tokens[i - 1].end_lineno());
        if line.tokens[i].is_comment() && gap > 1 {
            line.tokens[i].preset_newlines = Some(2);
        }
    }
}

/// The logical line fits on one physical line and contains nothing that
/// requires a multi-line rendering.
fn can_place_on_single_line(line: &LogicalLine, style: &Style) -> bool {
    if style.force_multiline_dict && line.tokens.iter().any(|tok| tok.text == "{") {
        return false;
    }
    let indent_amt = style.indent_width * line.depth;
    let mut last_index = line.tokens.len() - 1;
    if line.tokens[last_index].is_suppression_comment() && last_index > 0 {
        last_index -= 1;
    }
    let last = &line.tokens[last_index];
    if line.tokens[..last_index].iter().any(Token::is_comment) {
        return false;
    }
    last.total_length + indent_amt <= style.column_limit
}

/// Yield single lines, or a header line merged with its one-statement body
/// when the joiner allows it.
fn merge_lines(lines: Vec<LogicalLine>, style: &Style) -> Vec<LogicalLine> {
    let mut out: Vec<LogicalLine> = Vec::new();
    let mut index = 0;
    let mut last_was_merged = false;

    while index < lines.len() {
        if !lines[index].disable
            && line_joiner::can_merge_multiple_lines(&lines, index, last_was_merged, style)
        {
            let mut line = lines[index].clone();
            for tok in lines[index + 1].tokens.clone() {
                line.append_token(tok);
            }
            if lines[index + 1].tokens.len() == 1 && lines[index + 1].first().is_multiline_string()
            {
                // Joining a multiline string could change its meaning; emit
                // the pair verbatim instead.
                line.disable = true;
            }
            out.push(line);
            index += 2;
            last_was_merged = true;
        } else {
            out.push(lines[index].clone());
            index += 1;
            last_was_merged = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::annotate::calculate_formatting_information;
    use crate::format::logical_lines::build_logical_lines;
    use crate::format::subtype::assign_subtypes;
    use crate::parser::tokenize;

    fn format(source: &str, style: &Style) -> String {
        let mut lines = build_logical_lines(tokenize(source).unwrap()).unwrap();
        for line in &mut lines {
            assign_subtypes(line);
            calculate_formatting_information(line, style);
        }
        reformat(lines, style).unwrap()
    }

    #[test]
    fn test_single_line_statement() {
        assert_eq!(format("x   =   1\n", &Style::default()), "x = 1\n");
    }

    #[test]
    fn test_block_indentation() {
        let out = format("if a:\n        b = 1\n", &Style::default());
        assert_eq!(out, "if a:\n    b = 1\n");
    }

    #[test]
    fn test_join_short_if() {
        let out = format("if a == 42:\n    continue\n", &Style::default());
        assert_eq!(out, "if a == 42: continue\n");
    }

    #[test]
    fn test_join_disabled_by_knob() {
        let style = Style {
            join_multiple_lines: false,
            ..Style::default()
        };
        let out = format("if a == 42:\n    continue\n", &style);
        assert_eq!(out, "if a == 42:\n    continue\n");
    }

    #[test]
    fn test_trailing_comma_call_layout() {
        let out = format("f(a, b, c,)\n", &Style::default());
        assert_eq!(out, "f(\n    a,\n    b,\n    c,\n)\n");
    }

    #[test]
    fn test_long_line_splits_at_column_limit() {
        let style = Style {
            column_limit: 30,
            ..Style::default()
        };
        let out = format("result = some_call(alpha, beta, gamma)\n", &style);
        for line in out.lines() {
            assert!(line.chars().count() <= 30, "overlong line: {line:?}");
        }
    }

    #[test]
    fn test_disabled_line_verbatim() {
        let source = "# disable-formatter\nx   =    {  'a' : 1 }\n";
        let mut lines = build_logical_lines(tokenize(source).unwrap()).unwrap();
        crate::directive::mark_disabled_lines(&mut lines, &Style::default());
        for line in &mut lines {
            assign_subtypes(line);
            calculate_formatting_information(line, &Style::default());
        }
        let out = reformat(lines, &Style::default()).unwrap();
        assert_eq!(out, "# disable-formatter\nx   =    {  'a' : 1 }\n");
    }

    #[test]
    fn test_continuation_line_kept() {
        let source = "x = 1 + \\\n    2\n";
        let out = format(source, &Style::default());
        assert_eq!(out, "x = 1 + \\\n    2\n");
    }

    #[test]
    fn test_empty_input() {
        let out = reformat(Vec::new(), &Style::default()).unwrap();
        assert_eq!(out, "");
    }
}
