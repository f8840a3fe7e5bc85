//! Inter-token annotation: spacing, breakability and split penalties.
//!
//! For each adjacent token pair of a logical line this pass decides the
//! required spacing, whether a break before the token is allowed, required
//! or forbidden, the penalty a break would cost, and the accumulated line
//! width used by the reflow engine's fit checks.

use crate::config::Style;
use crate::format::logical_lines::LogicalLine;
use crate::parser::token::{subtypes, Token};

/// A penalty at or above this value forbids the break outright.
pub const UNBREAKABLE: u64 = 1_000_000;
pub const NAMED_ASSIGN: u64 = 15_000;
pub const DOTTED_NAME: u64 = 4_000;
pub const VERY_STRONGLY_CONNECTED: u64 = 3_500;
pub const STRONGLY_CONNECTED: u64 = 3_000;
pub const CONNECTED: u64 = 500;
pub const TOGETHER: u64 = 100;
pub const SUBSCRIPT: u64 = 6_000;

const LOGICAL_OPERATORS: &[&str] = &["and", "or"];
const BITWISE_OPERATORS: &[&str] = &["&", "|", "^"];
const TERM_OPERATORS: &[&str] = &["*", "/", "//", "%", "@"];
const ADDITIVE_OPERATORS: &[&str] = &["+", "-"];

/// Compute split penalties, spacing and total lengths for a logical line.
pub fn calculate_formatting_information(line: &mut LogicalLine, style: &Style) {
    if line.tokens.is_empty() {
        return;
    }

    assign_node_penalties(line, style);
    if style.arithmetic_precedence_indication {
        mark_precedence_indication(line);
    }
    assign_list_must_splits(line, style);

    // Say that the first token in the line has a space before it so that
    // joining this line with a predecessor inserts one.
    line.tokens[0].spaces_required_before = 1;
    line.tokens[0].total_length = char_len(&line.tokens[0].text);

    for i in 1..line.tokens.len() {
        let spaces = if line.tokens[i].is_comment() {
            style.spaces_before_comment.minimum()
        } else {
            space_required_between(&line.tokens[i - 1], &line.tokens[i], style)
        };

        let pair = pair_penalty(&line.tokens[i - 1], &line.tokens[i], style);
        let surrounded = line.enclosing_bracket(i).is_some();
        let consecutive_strings =
            line.tokens[i].is_string() && line.tokens[i - 1].is_string() && surrounded;

        let prev_total = line.tokens[i - 1].total_length;
        let tok = &mut line.tokens[i];
        tok.spaces_required_before = spaces;
        if tok.split_penalty == 0 {
            tok.split_penalty = pair;
        }
        if consecutive_strings {
            tok.must_break_before = true;
        }
        tok.total_length = prev_total + spaces + char_len(&tok.text);
    }

    // A comment forces a break before the token that follows it, and
    // breakability depends on the penalties computed above.
    for i in 1..line.tokens.len() {
        let prev_is_comment = line.tokens[i - 1].is_comment();
        let can = can_break_between(&line.tokens[i - 1], &line.tokens[i]);
        let tok = &mut line.tokens[i];
        if prev_is_comment {
            tok.must_break_before = true;
        }
        tok.can_break_before = tok.must_break_before || can;
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn max_penalty(tok: &mut Token, value: u64) {
    tok.split_penalty = tok.split_penalty.max(value);
}

/// Penalties derived from the line's structure rather than a token pair.
fn assign_node_penalties(line: &mut LogicalLine, style: &Style) {
    // Breaks are only legal inside brackets; mark every top-level token as
    // unbreakable.
    let mut bracket_level = 0usize;
    for i in 0..line.tokens.len() {
        if i > 0 && bracket_level == 0 {
            max_penalty(&mut line.tokens[i], UNBREAKABLE);
        }
        if line.tokens[i].opens_scope() {
            bracket_level += 1;
        } else if line.tokens[i].closes_scope() {
            bracket_level = bracket_level.saturating_sub(1);
        }
    }

    // Dotted names hold together.
    for i in 1..line.tokens.len() {
        if line.tokens[i].text == "." {
            max_penalty(&mut line.tokens[i], DOTTED_NAME);
            if i + 1 < line.tokens.len() {
                max_penalty(&mut line.tokens[i + 1], DOTTED_NAME);
            }
        }
    }

    // Subscript interiors hold together.
    for open in 0..line.tokens.len() {
        if line.tokens[open].opens_scope()
            && line.tokens[open].has_subtype(subtypes::SUBSCRIPT_BRACKET)
        {
            if let Some(close) = line.tokens[open].matching_bracket {
                for idx in open + 1..close {
                    max_penalty(&mut line.tokens[idx], SUBSCRIPT);
                }
            }
        }
    }

    // Lambda bodies resist splitting unless the style permits it.
    let lambda_penalty = if style.allow_multiline_lambdas {
        STRONGLY_CONNECTED
    } else {
        VERY_STRONGLY_CONNECTED
    };
    for i in 1..line.tokens.len() {
        if line.tokens[i].has_subtype(subtypes::LAMBDEF)
            && line.tokens[i - 1].has_subtype(subtypes::LAMBDEF)
        {
            max_penalty(&mut line.tokens[i], lambda_penalty);
        }
    }

    // Conditional expressions prefer to stay whole.
    for i in 1..line.tokens.len() {
        let tok = &line.tokens[i];
        if tok.is_keyword()
            && matches!(tok.text.as_str(), "if" | "else")
            && !tok.has_subtype(subtypes::COMP_IF)
            && line.enclosing_bracket(i).is_some()
        {
            max_penalty(&mut line.tokens[i], CONNECTED);
        }
    }

    // Names in a parenthesized import list.
    if matches!(line.effective_first_value(), "from" | "import")
        && style.split_penalty_import_names > 0
    {
        for i in 1..line.tokens.len() {
            if line.tokens[i - 1].text == "," && line.enclosing_bracket(i).is_some() {
                max_penalty(&mut line.tokens[i], style.split_penalty_import_names);
            }
        }
    }
}

/// Mark higher-precedence operators inside mixed simple expressions so the
/// spacing table can drop the spaces around them (`1*2 + 3/4`).
fn mark_precedence_indication(line: &mut LogicalLine) {
    let mut segment: Vec<usize> = Vec::new();
    let n = line.tokens.len();
    for i in 0..=n {
        let boundary = i == n || !is_simple_expr_token(&line.tokens[i]);
        if !boundary {
            segment.push(i);
            continue;
        }
        let has_term = segment.iter().any(|&idx| {
            line.tokens[idx].is_binary_op()
                && TERM_OPERATORS.contains(&line.tokens[idx].text.as_str())
        });
        let has_additive = segment.iter().any(|&idx| {
            line.tokens[idx].is_binary_op()
                && ADDITIVE_OPERATORS.contains(&line.tokens[idx].text.as_str())
        });
        if has_term && has_additive {
            for &idx in &segment {
                if line.tokens[idx].is_binary_op()
                    && TERM_OPERATORS.contains(&line.tokens[idx].text.as_str())
                {
                    line.tokens[idx].add_subtype(subtypes::SIMPLE_EXPRESSION);
                }
            }
        }
        segment.clear();
    }
}

fn is_simple_expr_token(tok: &Token) -> bool {
    tok.is_name()
        || tok.is_number()
        || (tok.is_binary_op()
            && (TERM_OPERATORS.contains(&tok.text.as_str())
                || ADDITIVE_OPERATORS.contains(&tok.text.as_str())))
}

/// Force per-element breaks in bracketed lists that end with a comma or
/// contain a comment.
fn assign_list_must_splits(line: &mut LogicalLine, style: &Style) {
    for open in 0..line.tokens.len() {
        if !line.tokens[open].opens_scope()
            || line.tokens[open].has_subtype(subtypes::SUBSCRIPT_BRACKET)
        {
            continue;
        }
        let Some(close) = line.tokens[open].matching_bracket else {
            continue;
        };
        if close <= open + 1 {
            continue;
        }

        let contains_comment = (open + 1..close).any(|idx| line.tokens[idx].is_comment());
        let mut top_commas: Vec<usize> = Vec::new();
        let mut idx = open + 1;
        let mut last_content = None;
        while idx < close {
            let tok = &line.tokens[idx];
            if tok.opens_scope() {
                last_content = Some(tok.matching_bracket.unwrap_or(idx));
                idx = tok.matching_bracket.unwrap_or(idx) + 1;
                continue;
            }
            if tok.text == "," {
                top_commas.push(idx);
            }
            if !tok.is_comment() {
                last_content = Some(idx);
            }
            idx += 1;
        }

        let ends_with_comma = last_content.is_some_and(|i| line.tokens[i].text == ",");
        let comment_trigger = contains_comment && !style.disable_split_list_with_comment;
        let comma_trigger = ends_with_comma
            && !style.disable_ending_comma_heuristic
            && !(line.tokens[open].text == "(" && top_commas.len() < 2);
        if !comment_trigger && !comma_trigger {
            continue;
        }

        let mut targets: Vec<usize> = Vec::new();
        if let Some(first) = first_element_token(line, open + 1, close) {
            targets.push(first);
        }
        for &comma in &top_commas {
            if let Some(next) = first_element_token(line, comma + 1, close) {
                targets.push(next);
            }
        }
        for idx in targets {
            line.tokens[idx].must_break_before = true;
        }
    }
}

/// First non-comment token of a list element, or None at the closing
/// bracket.
fn first_element_token(line: &LogicalLine, from: usize, close: usize) -> Option<usize> {
    let mut idx = from;
    while idx < close {
        if !line.tokens[idx].is_comment() {
            return Some(idx);
        }
        idx += 1;
    }
    None
}

fn is_idlike(tok: &Token) -> bool {
    tok.is_keyword() || tok.is_name() || tok.is_number() || tok.is_string()
}

/// Number of spaces required between two adjacent tokens.
#[allow(clippy::too_many_lines)]
fn space_required_between(prev: &Token, cur: &Token, style: &Style) -> usize {
    let flag = |b: bool| usize::from(b);

    if prev.is_continuation() || cur.is_continuation() {
        // The continuation marker keeps its original spacing.
        return 1;
    }
    if prev.opens_scope() && cur.closes_scope() {
        return 0;
    }
    if prev.text == "**" && prev.is_binary_op() || cur.text == "**" && cur.is_binary_op() {
        return flag(style.spaces_around_power_operator);
    }
    let assign_mask = subtypes::DEFAULT_ASSIGN | subtypes::NAMED_ASSIGN;
    if prev.has_subtype(assign_mask) || cur.has_subtype(assign_mask) {
        if style.spaces_around_default_or_named_assign {
            return 1;
        }
        // Annotated defaults take spaces around `=` regardless.
        let eq = if prev.has_subtype(assign_mask) { prev } else { cur };
        return flag(eq.has_subtype(subtypes::TYPED_NAME));
    }
    if prev.has_subtype(subtypes::SUBSCRIPT_COLON) || cur.has_subtype(subtypes::SUBSCRIPT_COLON) {
        return flag(style.spaces_around_subscript_colon);
    }
    if prev.opens_scope() && !cur.closes_scope() {
        if style.space_inside_brackets
            || (prev.has_subtype(subtypes::DICT_BRACKET) && style.spaces_around_dict_delimiters)
            || (prev.has_subtype(subtypes::LIST_BRACKET) && style.spaces_around_list_delimiters)
            || (prev.has_subtype(subtypes::TUPLE_BRACKET) && style.spaces_around_tuple_delimiters)
        {
            return 1;
        }
    }
    if cur.closes_scope() && !prev.opens_scope() {
        if prev.text == "," {
            return flag(style.space_between_ending_comma_and_closing_bracket);
        }
        if style.space_inside_brackets
            || (cur.has_subtype(subtypes::DICT_BRACKET) && style.spaces_around_dict_delimiters)
            || (cur.has_subtype(subtypes::LIST_BRACKET) && style.spaces_around_list_delimiters)
            || (cur.has_subtype(subtypes::TUPLE_BRACKET) && style.spaces_around_tuple_delimiters)
        {
            return 1;
        }
    }
    if matches!(cur.text.as_str(), "," | ";" | ":") {
        return 0;
    }
    if prev.text == "," {
        return 1;
    }
    if prev.has_subtype(subtypes::UNARY_OPERATOR) && cur.has_subtype(subtypes::UNARY_OPERATOR) {
        return 0;
    }
    if prev.has_subtype(subtypes::UNARY_OPERATOR)
        && prev.text != "not"
        && (cur.is_name() || cur.is_number() || cur.is_string() || cur.text == "(")
    {
        return 0;
    }
    let no_space_selected = |tok: &Token| {
        tok.is_binary_op()
            && (style
                .no_spaces_around_selected_binary_operators
                .contains(&tok.text)
                || tok.has_subtype(subtypes::SIMPLE_EXPRESSION))
    };
    if no_space_selected(prev) || no_space_selected(cur) {
        return 0;
    }
    if prev.is_binary_op() || cur.is_binary_op() {
        return 1;
    }
    if is_idlike(prev) && is_idlike(cur) {
        return 1;
    }
    if prev.is_string() && !matches!(cur.text.as_str(), "[" | ")" | "]" | "}" | ".") {
        return 1;
    }
    if prev.text == "@" && prev.has_subtype(subtypes::DECORATOR) {
        return 0;
    }
    if prev.text == "." || cur.text == "." {
        return 0;
    }
    if prev.opens_scope() || cur.closes_scope() {
        return 0;
    }
    if prev.closes_scope() && matches!(cur.text.as_str(), "(" | "[") {
        return 0;
    }
    if prev.is_name() && matches!(cur.text.as_str(), "(" | "[") {
        return 0;
    }
    if prev.has_subtype(subtypes::VARARGS_STAR | subtypes::KWARGS_STAR_STAR) {
        return 0;
    }
    1
}

/// Base penalty for breaking the line between two adjacent tokens.
#[allow(clippy::too_many_lines)]
fn pair_penalty(prev: &Token, cur: &Token, style: &Style) -> u64 {
    if cur.has_subtype(subtypes::COMP_FOR) {
        return 0;
    }
    if cur.has_subtype(subtypes::COMP_IF) {
        return if style.split_complex_comprehension {
            0
        } else {
            TOGETHER
        };
    }

    // Operator families: the preferred side of the break is free, the
    // other side costs the configured penalty.
    let family = |prev_in: bool, cur_in: bool, split_before: bool, penalty: u64| -> Option<u64> {
        if split_before {
            if prev_in {
                return Some(penalty);
            }
            if cur_in {
                return Some(0);
            }
        } else {
            if prev_in {
                return Some(0);
            }
            if cur_in {
                return Some(penalty);
            }
        }
        None
    };

    let logical = family(
        LOGICAL_OPERATORS.contains(&prev.text.as_str()) && prev.is_binary_op(),
        LOGICAL_OPERATORS.contains(&cur.text.as_str()) && cur.is_binary_op(),
        style.split_before_logical_operator,
        style.split_penalty_logical_operator,
    );
    if let Some(penalty) = logical {
        return penalty;
    }
    let bitwise = family(
        BITWISE_OPERATORS.contains(&prev.text.as_str()) && prev.is_binary_op(),
        BITWISE_OPERATORS.contains(&cur.text.as_str()) && cur.is_binary_op(),
        style.split_before_bitwise_operator,
        style.split_penalty_bitwise_operator,
    );
    if let Some(penalty) = bitwise {
        return penalty;
    }
    let arithmetic = family(
        prev.is_binary_op() && prev.is_arithmetic_op(),
        cur.is_binary_op() && cur.is_arithmetic_op(),
        style.split_before_arithmetic_operator,
        style.split_penalty_arithmetic_operator,
    );
    if let Some(penalty) = arithmetic {
        return penalty;
    }

    if prev.has_subtype(subtypes::UNARY_OPERATOR) {
        return style.split_penalty_after_unary_operator;
    }
    if prev.text == "," {
        return 0;
    }
    if prev.has_subtype(subtypes::VARARGS_STAR | subtypes::KWARGS_STAR_STAR) {
        return UNBREAKABLE;
    }
    if cur.text == ":" {
        return UNBREAKABLE;
    }
    if cur.has_subtype(subtypes::ASSIGN_OPERATOR) {
        return UNBREAKABLE;
    }
    let assign_mask = subtypes::DEFAULT_ASSIGN | subtypes::NAMED_ASSIGN;
    if cur.has_subtype(assign_mask) {
        return UNBREAKABLE;
    }
    if prev.has_subtype(assign_mask) {
        return if style.allow_split_before_default_or_named_assigns {
            NAMED_ASSIGN
        } else {
            UNBREAKABLE
        };
    }
    if prev.text == ":" {
        return STRONGLY_CONNECTED;
    }
    if prev.text == "==" {
        return 20;
    }
    if cur.text == "==" {
        return STRONGLY_CONNECTED;
    }
    if prev.opens_scope() {
        return style.split_penalty_after_opening_bracket;
    }
    0
}

/// Whether a break before `cur` is structurally possible.
fn can_break_between(prev: &Token, cur: &Token) -> bool {
    if cur.split_penalty >= UNBREAKABLE {
        return false;
    }
    if cur.is_continuation() {
        return false;
    }
    if prev.text == "@" && prev.has_subtype(subtypes::DECORATOR) {
        return false;
    }
    if matches!(cur.text.as_str(), "," | ":") {
        return false;
    }
    if prev.is_name() && matches!(cur.text.as_str(), "(" | "[" | ".") {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::logical_lines::build_logical_lines;
    use crate::format::subtype::assign_subtypes;
    use crate::parser::tokenize;

    fn annotated(source: &str, style: &Style) -> LogicalLine {
        let mut lines = build_logical_lines(tokenize(source).unwrap()).unwrap();
        let mut line = lines.remove(0);
        assign_subtypes(&mut line);
        calculate_formatting_information(&mut line, style);
        line
    }

    fn render(line: &LogicalLine) -> String {
        let mut out = String::new();
        for (i, tok) in line.tokens.iter().enumerate() {
            if i > 0 {
                out.push_str(&" ".repeat(tok.spaces_required_before));
            }
            out.push_str(&tok.text);
        }
        out
    }

    #[test]
    fn test_basic_spacing() {
        let line = annotated("x=1+2\n", &Style::default());
        assert_eq!(render(&line), "x = 1 + 2");
    }

    #[test]
    fn test_dict_spacing() {
        let line = annotated("x = {  'a':37,'b':42}\n", &Style::default());
        assert_eq!(render(&line), "x = {'a': 37, 'b': 42}");
    }

    #[test]
    fn test_call_and_subscript_spacing() {
        let line = annotated("f (a [1:2], b)\n", &Style::default());
        assert_eq!(render(&line), "f(a[1:2], b)");
    }

    #[test]
    fn test_named_assign_spacing() {
        let line = annotated("f(a = 1)\n", &Style::default());
        assert_eq!(render(&line), "f(a=1)");
    }

    #[test]
    fn test_named_assign_spacing_knob() {
        let style = Style {
            spaces_around_default_or_named_assign: true,
            ..Style::default()
        };
        let line = annotated("f(a=1)\n", &style);
        assert_eq!(render(&line), "f(a = 1)");
    }

    #[test]
    fn test_annotated_default_spacing() {
        let line = annotated("def f(a: int=1):\n    pass\n", &Style::default());
        assert_eq!(render(&line), "def f(a: int = 1):");
    }

    #[test]
    fn test_power_operator_spacing() {
        let line = annotated("x = a**b\n", &Style::default());
        assert_eq!(render(&line), "x = a**b");

        let style = Style {
            spaces_around_power_operator: true,
            ..Style::default()
        };
        let line = annotated("x = a**b\n", &style);
        assert_eq!(render(&line), "x = a ** b");
    }

    #[test]
    fn test_unary_spacing() {
        let line = annotated("x = -a + (+b)\n", &Style::default());
        assert_eq!(render(&line), "x = -a + (+b)");
    }

    #[test]
    fn test_precedence_indication() {
        let style = Style {
            arithmetic_precedence_indication: true,
            ..Style::default()
        };
        let line = annotated("a = 1 * 2 + 3 / 4\n", &style);
        assert_eq!(render(&line), "a = 1*2 + 3/4");
    }

    #[test]
    fn test_no_spaces_around_selected_operators() {
        let mut style = Style::default();
        style
            .no_spaces_around_selected_binary_operators
            .insert("*".to_string());
        let line = annotated("x = a * b + c\n", &style);
        assert_eq!(render(&line), "x = a*b + c");
    }

    #[test]
    fn test_space_inside_brackets_knob() {
        let style = Style {
            space_inside_brackets: true,
            ..Style::default()
        };
        let line = annotated("f(a, b[1])\n", &style);
        assert_eq!(render(&line), "f( a, b[ 1 ] )");
    }

    #[test]
    fn test_implicit_string_concat_spacing() {
        let line = annotated("x = 'a' 'b'\n", &Style::default());
        assert_eq!(render(&line), "x = 'a' 'b'");
    }

    #[test]
    fn test_top_level_tokens_unbreakable() {
        let line = annotated("x = a + b\n", &Style::default());
        for tok in &line.tokens[1..] {
            assert!(tok.split_penalty >= UNBREAKABLE);
            assert!(!tok.can_break_before);
        }
    }

    #[test]
    fn test_breaks_allowed_inside_brackets() {
        let line = annotated("x = f(aaaa, bbbb)\n", &Style::default());
        let a_idx = line.tokens.iter().position(|t| t.text == "aaaa").unwrap();
        let b_idx = line.tokens.iter().position(|t| t.text == "bbbb").unwrap();
        assert!(line.tokens[a_idx].can_break_before);
        assert!(line.tokens[b_idx].can_break_before);
    }

    #[test]
    fn test_no_break_before_comma_or_call_paren() {
        let line = annotated("x = f(a, b)\n", &Style::default());
        let comma = line.tokens.iter().position(|t| t.text == ",").unwrap();
        let paren = line.tokens.iter().position(|t| t.text == "(").unwrap();
        assert!(!line.tokens[comma].can_break_before);
        assert!(!line.tokens[paren].can_break_before);
    }

    #[test]
    fn test_trailing_comma_forces_breaks() {
        let line = annotated("f(a, b, c,)\n", &Style::default());
        for text in ["a", "b", "c"] {
            let idx = line.tokens.iter().position(|t| t.text == text).unwrap();
            assert!(
                line.tokens[idx].must_break_before,
                "expected must-break before {text}"
            );
        }
    }

    #[test]
    fn test_trailing_comma_single_argument_call_not_split() {
        let line = annotated("f(a,)\n", &Style::default());
        let idx = line.tokens.iter().position(|t| t.text == "a").unwrap();
        assert!(!line.tokens[idx].must_break_before);
    }

    #[test]
    fn test_trailing_comma_list_splits() {
        let line = annotated("x = [a,]\n", &Style::default());
        let idx = line.tokens.iter().position(|t| t.text == "a").unwrap();
        assert!(line.tokens[idx].must_break_before);
    }

    #[test]
    fn test_comment_in_list_forces_breaks() {
        let line = annotated("[a, b,  #\n c]\n", &Style::default());
        for text in ["a", "b", "c"] {
            let idx = line.tokens.iter().position(|t| t.text == text).unwrap();
            assert!(
                line.tokens[idx].must_break_before,
                "expected must-break before {text}"
            );
        }
    }

    #[test]
    fn test_comment_in_list_knob_disables_breaks() {
        let style = Style {
            disable_split_list_with_comment: true,
            ..Style::default()
        };
        let line = annotated("[a, b,  #\n c]\n", &style);
        let a_idx = line.tokens.iter().position(|t| t.text == "a").unwrap();
        assert!(!line.tokens[a_idx].must_break_before);
        // The token after the comment still must break.
        let c_idx = line.tokens.iter().position(|t| t.text == "c").unwrap();
        assert!(line.tokens[c_idx].must_break_before);
    }

    #[test]
    fn test_ending_comma_heuristic_disabled() {
        let style = Style {
            disable_ending_comma_heuristic: true,
            ..Style::default()
        };
        let line = annotated("f(a, b, c,)\n", &style);
        let idx = line.tokens.iter().position(|t| t.text == "a").unwrap();
        assert!(!line.tokens[idx].must_break_before);
    }

    #[test]
    fn test_total_length_accumulates() {
        let line = annotated("x = f(a)\n", &Style::default());
        // "x = f(a)" is 8 columns.
        assert_eq!(line.last().total_length, 8);
    }

    #[test]
    fn test_consecutive_strings_in_brackets_must_break() {
        let line = annotated("f('abc' 'def')\n", &Style::default());
        let second = line
            .tokens
            .iter()
            .position(|t| t.text == "'def'")
            .unwrap();
        assert!(line.tokens[second].must_break_before);
    }
}
