//! Reflow decision state.
//!
//! A [`FormatDecisionState`] is a snapshot of progress through one logical
//! line: the next token to place, the current column, and a stack of
//! [`ParenState`] records describing the open brackets. States are value
//! copies; the search clones one per branch. Placing a token either on the
//! current line or on a new line yields the penalty of that choice plus a
//! [`TokenPlacement`] describing the whitespace to emit in front of it.

use std::hash::{Hash, Hasher};

use crate::config::{ContinuationAlignStyle, Style};
use crate::format::annotate::{CONNECTED, UNBREAKABLE};
use crate::format::logical_lines::LogicalLine;
use crate::parser::token::{subtypes, Token};

/// Statements whose header continuation indent must not collide with the
/// body indent.
const COMPOUND_STATEMENTS: &[&str] = &[
    "case", "class", "def", "elif", "except", "for", "if", "match", "while", "with",
];

/// Per-bracket state on the decision stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParenState {
    /// Column to indent continuation lines to inside this bracket.
    pub indent: usize,
    /// Column of the last line start inside this bracket.
    pub last_space: usize,
    /// Column for a closing bracket placed on its own line.
    pub closing_scope_indent: usize,
    /// Latched once a break occurs right after the opening bracket.
    pub split_before_closing_bracket: bool,
    /// Breaks taken inside this bracket so far.
    pub num_line_splits: u32,
}

impl ParenState {
    fn new(indent: usize, last_space: usize) -> Self {
        ParenState {
            indent,
            last_space,
            closing_scope_indent: 0,
            split_before_closing_bracket: false,
            num_line_splits: 0,
        }
    }
}

/// State of one comprehension being laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComprehensionState {
    pub opening_bracket: usize,
    pub closing_bracket: usize,
    pub for_index: Option<usize>,
    pub has_split_at_for: bool,
    pub has_interior_split: bool,
    /// The expression before `for` is a single token.
    pub trivial_expr: bool,
}

/// Whitespace to place before a token when committing a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPlacement {
    pub newlines: usize,
    pub spaces: usize,
    pub indent_level: usize,
}

#[derive(Clone)]
pub struct FormatDecisionState<'a> {
    pub line: &'a LogicalLine,
    style: &'a Style,
    pub next_token_index: usize,
    pub column: usize,
    pub first_indent: usize,
    pub paren_level: usize,
    pub lowest_level_on_line: usize,
    pub ignore_stack_for_comparison: bool,
    pub stack: Vec<ParenState>,
    pub comp_stack: Vec<ComprehensionState>,
}

/// Dedup key for visited states. Hashing uses the scalar fields only; two
/// keys with a suppressed stack compare equal on scalars alone.
#[derive(Debug, Clone)]
pub struct SeenKey {
    next_token_index: usize,
    column: usize,
    paren_level: usize,
    lowest_level_on_line: usize,
    stacks: Option<(Vec<ParenState>, Vec<ComprehensionState>)>,
}

impl PartialEq for SeenKey {
    fn eq(&self, other: &Self) -> bool {
        if self.next_token_index != other.next_token_index
            || self.column != other.column
            || self.paren_level != other.paren_level
            || self.lowest_level_on_line != other.lowest_level_on_line
        {
            return false;
        }
        match (&self.stacks, &other.stacks) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl Eq for SeenKey {}

impl Hash for SeenKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.next_token_index.hash(state);
        self.column.hash(state);
        self.paren_level.hash(state);
        self.lowest_level_on_line.hash(state);
    }
}

impl<'a> FormatDecisionState<'a> {
    /// State before any token of `line` has been placed at `first_indent`.
    #[must_use]
    pub fn new(line: &'a LogicalLine, style: &'a Style, first_indent: usize) -> Self {
        FormatDecisionState {
            line,
            style,
            next_token_index: 0,
            column: first_indent,
            first_indent,
            paren_level: 0,
            lowest_level_on_line: 0,
            ignore_stack_for_comparison: false,
            stack: vec![ParenState::new(first_indent, first_indent)],
            comp_stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn done(&self) -> bool {
        self.next_token_index >= self.line.tokens.len()
    }

    #[must_use]
    pub fn seen_key(&self) -> SeenKey {
        SeenKey {
            next_token_index: self.next_token_index,
            column: self.column,
            paren_level: self.paren_level,
            lowest_level_on_line: self.lowest_level_on_line,
            stacks: if self.ignore_stack_for_comparison {
                None
            } else {
                Some((self.stack.clone(), self.comp_stack.clone()))
            },
        }
    }

    fn cur(&self) -> &Token {
        &self.line.tokens[self.next_token_index]
    }

    fn prev_index(&self) -> Option<usize> {
        self.next_token_index.checked_sub(1)
    }

    fn top(&self) -> &ParenState {
        self.stack.last().unwrap_or_else(|| unreachable!("stack is never empty"))
    }

    fn top_mut(&mut self) -> &mut ParenState {
        self.stack.last_mut().unwrap_or_else(|| unreachable!("stack is never empty"))
    }

    /// Determine if a break before the next token is allowed.
    #[must_use]
    pub fn can_split(&self, must_split: bool) -> bool {
        let cur = self.cur();

        if !must_split
            && cur.has_subtype(subtypes::DICTIONARY_KEY_PART)
            && !cur.has_subtype(subtypes::DICTIONARY_KEY)
            && !self.style.allow_multiline_dictionary_keys
        {
            return false;
        }
        if !must_split
            && cur.has_subtype(subtypes::DICTIONARY_VALUE)
            && !self.style.allow_split_before_dict_value
        {
            return false;
        }
        if let Some(p) = self.prev_index() {
            if self.line.tokens[p].text == "." && cur.text == "." {
                return false;
            }
        }
        cur.can_break_before
    }

    /// Determine if the line must break before the next token. May latch
    /// `split_before_closing_bracket` on the innermost bracket.
    #[allow(clippy::too_many_lines)]
    pub fn must_split(&mut self) -> bool {
        let i = self.next_token_index;
        let line = self.line;
        let cur = &line.tokens[i];

        if cur.must_break_before {
            return true;
        }
        let Some(p) = self.prev_index() else {
            return false;
        };
        let prev = &line.tokens[p];

        if self.style.split_all_comma_separated_values && prev.text == "," {
            return true;
        }

        if self.style.split_all_top_level_comma_separated_values && prev.text == "," {
            let Some(opening) = opening_bracket_of(line, i) else {
                return true;
            };
            if cur.is_comment() {
                return false;
            }
            // A forced-multiline dict splits its entries regardless of fit.
            if self.style.force_multiline_dict && line.tokens[opening].text == "{" {
                return true;
            }
            if Some(i) != line.tokens[opening].matching_bracket {
                return !self.container_fits_on_start_line(opening);
            }
        }

        if self.top().split_before_closing_bracket
            && (matches!(cur.text.as_str(), "}" | "]") && self.style.split_before_closing_bracket
                || matches!(cur.text.as_str(), "}" | "]" | ")")
                    && self.style.indent_closing_brackets)
        {
            if !cur.has_subtype(subtypes::SUBSCRIPT_BRACKET)
                || (prev.text == "," && !self.style.disable_ending_comma_heuristic)
            {
                return cur.split_penalty < UNBREAKABLE;
            }
        }

        if cur.text == ")"
            && prev.text == ","
            && !self.style.disable_ending_comma_heuristic
            && !is_single_element_tuple(line, cur.matching_bracket.unwrap_or(i))
        {
            return true;
        }

        // Prevent splitting before the first argument in compound statements
        // with the exception of function declarations.
        if self.style.split_before_first_argument
            && is_compound_statement(line)
            && line.effective_first_value() != "def"
        {
            return false;
        }

        if self.style.dedent_closing_brackets
            || self.style.indent_closing_brackets
            || self.style.split_before_first_argument
        {
            let bracket = if cur.closes_scope() { i } else { p };
            let bracket_tok = &line.tokens[bracket];
            if !bracket_tok.has_subtype(subtypes::SUBSCRIPT_BRACKET) {
                if bracket_tok.opens_scope() {
                    if self.style.coalesce_brackets && cur.opens_scope() {
                        // Prefer to keep all opening brackets together.
                        return false;
                    }
                    let matching = bracket_tok.matching_bracket.unwrap_or(bracket);
                    let last_tok = if !is_last_scope_in_line(line, bracket)
                        || line.enclosing_bracket(bracket).is_some()
                    {
                        matching
                    } else {
                        line.last_token_in_line(matching)
                    };
                    if !self.fits_on_line(bracket, last_tok) {
                        // Split before the first element if the whole list
                        // can't fit on a single line.
                        self.top_mut().split_before_closing_bracket = true;
                        return true;
                    }
                } else if (self.style.dedent_closing_brackets
                    || self.style.indent_closing_brackets)
                    && cur.closes_scope()
                {
                    return self.top().split_before_closing_bracket;
                }
            }
        }

        if self.style.split_before_expression_after_opening_paren
            && cur.is_name()
            && prev.text == "("
            && line.enclosing_bracket(p).is_none()
        {
            if let Some(pp) = p.checked_sub(1) {
                let pptok = &line.tokens[pp];
                if !pptok.is_name()
                    && !pptok.is_keyword()
                    && expression_surrounded_by_parens(line, i)
                {
                    return true;
                }
            }
        }

        // Dict/Set splitting.
        if cur.has_subtype(subtypes::DICTIONARY_KEY) && !cur.is_comment() {
            if self.style.force_multiline_dict {
                return true;
            }
            if self.style.each_dict_entry_on_separate_line {
                // Entries split only when the whole dict is overlong.
                if let Some(opening) = opening_bracket_of(line, i) {
                    if line.tokens[opening].text == "{"
                        && !self.container_fits_on_start_line(opening)
                    {
                        return true;
                    }
                }
            }
        }

        if self.style.split_before_dict_set_generator
            && cur.has_subtype(subtypes::DICT_SET_GENERATOR)
        {
            return true;
        }

        if cur.has_subtype(subtypes::DICTIONARY_VALUE) && !cur.opens_scope() {
            if let Some(opening) = opening_bracket_of(line, i) {
                if !self.each_dict_entry_fits(opening) {
                    return self.style.allow_split_before_dict_value;
                }
            }
        }

        if prev.text == "{" {
            // Split if the dict/set cannot fit on one line and ends in a comma.
            let closing = prev.matching_bracket.unwrap_or(p);
            if !self.fits_on_line(p, closing) {
                let before_close = prev_non_comment(line, closing);
                if before_close.is_some_and(|b| line.tokens[b].text == ",") {
                    self.top_mut().split_before_closing_bracket = true;
                    return true;
                }
            }
        }

        if self.style.split_arguments_when_comma_terminated && matches!(prev.text.as_str(), "(" | ",")
        {
            if let Some(opening) = opening_bracket_of(line, i) {
                if opening > 0 && line.tokens[opening - 1].is_name() {
                    let closing = line.tokens[opening].matching_bracket.unwrap_or(opening);
                    let before_close = prev_non_comment(line, closing);
                    if before_close.is_some_and(|b| line.tokens[b].text == ",") {
                        return true;
                    }
                }
            }
        }

        // Containers holding a comment, and containers that cannot fit.
        if prev.opens_scope()
            && !cur.opens_scope()
            && !cur.is_comment()
            && !prev.has_subtype(subtypes::SUBSCRIPT_BRACKET)
        {
            let pp = p.checked_sub(1).map(|idx| &line.tokens[idx]);
            let matching = prev.matching_bracket.unwrap_or(p);
            if pp.is_none_or(|t| !t.is_keyword() && !t.is_name()) {
                // We want to split if there's a comment in the container.
                if (i..matching).any(|idx| line.tokens[idx].is_comment()) {
                    return true;
                }
            }
            if prev.text == "(" {
                if pp.is_none_or(|t| !t.is_name()) {
                    if self.fits_on_line(p, matching) {
                        return false;
                    }
                } else if !self.fits_on_line(p, matching) {
                    let limit = self.style.column_limit;
                    let remaining = limit.saturating_sub(self.column);
                    #[allow(clippy::cast_precision_loss)]
                    if (remaining as f64) / (limit as f64) < 0.3 {
                        // Try not to squish all of the arguments off to the
                        // right.
                        return true;
                    }
                }
            } else if !self.fits_on_line(p, matching) {
                return true;
            }
        }

        // Keep a comment that was on its own line on its own line.
        if cur.is_comment() && prev.lineno < cur.lineno.saturating_sub(cur.newline_count()) {
            return true;
        }

        false
    }

    /// Place the next token and advance. Returns the penalty of the choice
    /// and the whitespace placement to emit when committing.
    pub fn add_token(&mut self, newline: bool, must_split: bool) -> (u64, TokenPlacement) {
        let (mut penalty, placement) = if newline {
            self.add_token_on_newline(must_split)
        } else {
            (0, self.add_token_on_current_line())
        };
        penalty += self.comprehension_penalty(newline);
        penalty += self.move_to_next_token();
        (penalty, placement)
    }

    fn add_token_on_current_line(&mut self) -> TokenPlacement {
        let i = self.next_token_index;
        let cur = &self.line.tokens[i];
        let spaces = cur.spaces_required_before;
        let cur_is_comment = cur.is_comment();
        let prev_opens = self
            .prev_index()
            .is_some_and(|p| self.line.tokens[p].opens_scope());

        if prev_opens {
            let column = self.column;
            let continuation = self.style.continuation_indent_width;
            let top = self.top_mut();
            if cur_is_comment {
                top.closing_scope_indent = top.indent.saturating_sub(continuation);
            } else {
                // Align closing scopes that are on a newline with the
                // opening scope's visual indent.
                top.closing_scope_indent = column;
                top.indent = column + spaces;
            }
        }

        self.column += spaces;
        TokenPlacement {
            newlines: 0,
            spaces,
            indent_level: self.line.depth,
        }
    }

    fn add_token_on_newline(&mut self, must_split: bool) -> (u64, TokenPlacement) {
        let i = self.next_token_index;
        let cur = &self.line.tokens[i];
        let cur_penalty = cur.split_penalty;
        let cur_is_comment = cur.is_comment();
        let cur_text_is_branch_keyword = matches!(cur.text.as_str(), "if" | "for");
        let cur_opens = cur.opens_scope();

        self.column = self.newline_column();
        let placement = TokenPlacement {
            newlines: 1,
            spaces: self
                .column
                .saturating_sub(self.line.depth * self.style.indent_width),
            indent_level: self.line.depth,
        };

        if !cur_is_comment {
            let column = self.column;
            self.top_mut().last_space = column;
        }
        self.lowest_level_on_line = self.paren_level;

        let prev_opens = self.prev_opens_or_comment_after_open();
        if prev_opens {
            let dedent = if self.style.indent_closing_brackets {
                0
            } else {
                self.style.continuation_indent_width
            };
            let top = self.top_mut();
            top.closing_scope_indent = top.indent.saturating_sub(dedent);
            top.split_before_closing_bracket = true;
        }

        let mut penalty = cur_penalty;
        if must_split {
            // Don't penalize for a required split.
            return (penalty, placement);
        }

        // Each additional break inside the same bracket costs more.
        if !cur_text_is_branch_keyword {
            let added = self.style.split_penalty_for_added_line_split;
            let top = self.top_mut();
            top.num_line_splits += 1;
            penalty += added * u64::from(top.num_line_splits);
        }

        if cur_opens {
            if let Some(p) = self.prev_index() {
                if self.line.tokens[p].opens_scope() {
                    let pp_is_name = p
                        .checked_sub(1)
                        .is_some_and(|idx| self.line.tokens[idx].is_name());
                    if !pp_is_name {
                        // Prefer to keep opening brackets coalesced.
                        penalty += 10;
                        if self.style.coalesce_brackets {
                            penalty += UNBREAKABLE;
                        }
                    }
                }
            }
        }

        (penalty + 10, placement)
    }

    fn prev_opens_or_comment_after_open(&self) -> bool {
        let Some(p) = self.prev_index() else {
            return false;
        };
        let prev = &self.line.tokens[p];
        if prev.opens_scope() {
            return true;
        }
        prev.is_comment()
            && p.checked_sub(1)
                .is_some_and(|idx| self.line.tokens[idx].opens_scope())
    }

    /// Column for the next token when a break is taken before it.
    fn newline_column(&self) -> usize {
        let i = self.next_token_index;
        let cur = &self.line.tokens[i];
        let top = self.top();

        if cur.spaces_required_before > 2 || self.line.disable {
            return cur.spaces_required_before;
        }

        let cont_aligned = self.aligned_continuation_indent(top.indent);

        if cur.opens_scope() {
            return if self.paren_level > 0 {
                cont_aligned
            } else {
                self.first_indent
            };
        }

        if cur.closes_scope() {
            if self.prev_opens_or_comment_after_open() {
                return top
                    .indent
                    .saturating_sub(self.style.continuation_indent_width);
            }
            return top.closing_scope_indent;
        }

        if let Some(p) = self.prev_index() {
            let prev = &self.line.tokens[p];
            if prev.is_string() && cur.is_string() && cur.has_subtype(subtypes::DICTIONARY_VALUE) {
                return prev.column;
            }
            if self.style.indent_dictionary_value
                && prev.text == ":"
                && cur.has_subtype(subtypes::DICTIONARY_VALUE)
            {
                return top.indent;
            }
        }

        if is_compound_statement(self.line)
            && (!(self.style.dedent_closing_brackets || self.style.indent_closing_brackets)
                || self.style.split_before_first_argument)
        {
            let prefix = &self.line.first().whitespace_prefix;
            let last_line = prefix.rsplit('\n').next().unwrap_or(prefix);
            let token_indent = last_line.chars().count() + self.style.indent_width;
            if token_indent == top.indent {
                return token_indent + self.style.continuation_indent_width;
            }
        }

        cont_aligned
    }

    fn aligned_continuation_indent(&self, column: usize) -> usize {
        if column == 0 {
            return column;
        }
        let indent_width = self.style.indent_width;
        match self.style.continuation_align_style {
            ContinuationAlignStyle::Space => column,
            ContinuationAlignStyle::Fixed => {
                self.line.depth * indent_width + self.style.continuation_indent_width
            }
            ContinuationAlignStyle::ValignRight => {
                indent_width * column.div_ceil(indent_width)
            }
        }
    }

    /// Update bracket and column bookkeeping for the token just placed and
    /// return the excess-character penalty it incurs.
    pub fn move_to_next_token(&mut self) -> u64 {
        let i = self.next_token_index;
        let cur = &self.line.tokens[i];
        let opens = cur.opens_scope();
        let closes = cur.closes_scope();

        if !opens && !closes {
            self.lowest_level_on_line = self.lowest_level_on_line.min(self.paren_level);
        }

        if opens {
            let last_space = self.top().last_space;
            let new_indent = self.style.continuation_indent_width + last_space;
            self.stack.push(ParenState::new(new_indent, last_space));
            self.paren_level += 1;

            if cur.has_subtype(subtypes::COMP_START) {
                if let Some(closing) = cur.matching_bracket {
                    let trivial_expr = i + 2 < self.line.tokens.len()
                        && self.line.tokens[i + 2].has_subtype(subtypes::COMP_FOR);
                    self.comp_stack.push(ComprehensionState {
                        opening_bracket: i,
                        closing_bracket: closing,
                        for_index: None,
                        has_split_at_for: false,
                        has_interior_split: false,
                        trivial_expr,
                    });
                }
            }
        }

        if closes && self.stack.len() > 1 {
            let inner_last_space = self.top().last_space;
            let key_part = cur.has_subtype(subtypes::DICTIONARY_KEY_PART);
            let outer_index = self.stack.len() - 2;
            let outer = &mut self.stack[outer_index];
            outer.last_space = if key_part { outer.indent } else { inner_last_space };
            self.stack.pop();
            self.paren_level = self.paren_level.saturating_sub(1);
        }

        let cur = &self.line.tokens[i];
        let is_multiline = cur.newline_count() > 0;
        self.column += cur.width();

        self.next_token_index += 1;

        let mut penalty = 0;
        if !cur.is_suppression_comment() && self.column > self.style.column_limit {
            let excess = (self.column - self.style.column_limit) as u64;
            penalty = self.style.split_penalty_excess_character * excess;
        }

        if is_multiline {
            // The column is now the end of the token's last line.
            self.column = cur.last_line_width();
        }

        penalty
    }

    fn comprehension_penalty(&mut self, newline: bool) -> u64 {
        let i = self.next_token_index;
        let Some(top) = self.comp_stack.last().copied() else {
            return 0;
        };
        let mut penalty = 0;

        if i == top.closing_bracket {
            self.comp_stack.pop();
            // Lightly penalize comprehensions split across multiple lines.
            if top.has_interior_split {
                penalty += self.style.split_penalty_comprehension;
            }
            return penalty;
        }

        if newline {
            if let Some(last) = self.comp_stack.last_mut() {
                last.has_interior_split = true;
            }
        }

        let cur = &self.line.tokens[i];
        if cur.has_subtype(subtypes::COMP_FOR) {
            if top.for_index.is_some() {
                // Nested for clauses follow the newline structure of the
                // first one.
                if self.style.split_complex_comprehension
                    && top.has_split_at_for != newline
                    && (top.has_split_at_for || !top.trivial_expr)
                {
                    penalty += UNBREAKABLE;
                }
            } else {
                if let Some(last) = self.comp_stack.last_mut() {
                    last.for_index = Some(i);
                    last.has_split_at_for = newline;
                }
                // Try to keep trivial expressions on the same line as the
                // for clause.
                if self.style.split_complex_comprehension && newline && top.trivial_expr {
                    penalty += CONNECTED;
                }
            }
        }

        if cur.has_subtype(subtypes::COMP_IF)
            && self.style.split_complex_comprehension
            && top.has_split_at_for != newline
            && (top.has_split_at_for || !top.trivial_expr)
        {
            penalty += UNBREAKABLE;
        }

        penalty
    }

    /// Can the span `[start, end]` fit on the current line?
    fn fits_on_line(&self, start: usize, end: usize) -> bool {
        let tokens = &self.line.tokens;
        let length = tokens[end].total_length - tokens[start].total_length
            + tokens[start].text.chars().count();
        length + self.column <= self.style.column_limit
    }

    fn container_fits_on_start_line(&self, opening: usize) -> bool {
        let tokens = &self.line.tokens;
        let Some(closing) = tokens[opening].matching_bracket else {
            return true;
        };
        tokens[closing].total_length - tokens[opening].total_length + self.top().indent
            <= self.style.column_limit
    }

    /// Determine whether each entry of the dict opened at `opening` fits on
    /// a line of its own.
    fn each_dict_entry_fits(&self, opening: usize) -> bool {
        let tokens = &self.line.tokens;
        let Some(closing) = tokens[opening].matching_bracket else {
            return true;
        };
        let indent = if self.stack.len() >= 2 {
            self.stack[self.stack.len() - 2].indent
        } else {
            self.top().indent
        };

        let mut entry_start = opening + 1;
        let mut idx = opening + 1;
        while idx < closing {
            let tok = &tokens[idx];
            if tok.has_subtype(subtypes::DICT_SET_GENERATOR) {
                break;
            }
            if tok.has_subtype(subtypes::DICTIONARY_KEY) && idx > entry_start {
                let mut prev = prev_non_comment(self.line, idx).unwrap_or(entry_start);
                if tokens[prev].text == "," {
                    prev = prev_non_comment(self.line, prev).unwrap_or(entry_start);
                }
                let length = tokens[prev].total_length - tokens[entry_start].total_length
                    + tokens[entry_start].text.chars().count();
                if length + indent >= self.style.column_limit {
                    return false;
                }
                entry_start = idx;
            }
            if tok.opens_scope() {
                idx = tok.matching_bracket.unwrap_or(idx);
            }
            idx += 1;
        }

        let last = prev_non_comment(self.line, closing).unwrap_or(entry_start);
        let length = tokens[last].total_length - tokens[entry_start].total_length
            + tokens[entry_start].text.chars().count();
        length + indent <= self.style.column_limit
    }
}

/// Index of the opening bracket whose scope contains `index`; an opening
/// bracket is its own scope, a closing bracket belongs to its partner.
pub fn opening_bracket_of(line: &LogicalLine, index: usize) -> Option<usize> {
    let tok = &line.tokens[index];
    if tok.matching_bracket.is_some() {
        return if tok.opens_scope() {
            Some(index)
        } else {
            tok.matching_bracket
        };
    }
    line.enclosing_bracket(index)
}

pub fn prev_non_comment(line: &LogicalLine, index: usize) -> Option<usize> {
    let mut idx = index.checked_sub(1)?;
    while line.tokens[idx].is_comment() {
        idx = idx.checked_sub(1)?;
    }
    Some(idx)
}

pub fn is_compound_statement(line: &LogicalLine) -> bool {
    COMPOUND_STATEMENTS.contains(&line.effective_first_value())
}

fn is_single_element_tuple(line: &LogicalLine, open: usize) -> bool {
    let Some(close) = line.tokens[open].matching_bracket else {
        return false;
    };
    let mut commas = 0;
    let mut idx = open + 1;
    while idx < close {
        let tok = &line.tokens[idx];
        if tok.opens_scope() {
            idx = tok.matching_bracket.unwrap_or(idx);
        } else if tok.text == "," {
            commas += 1;
        }
        idx += 1;
    }
    commas == 1
}

fn is_last_scope_in_line(line: &LogicalLine, open: usize) -> bool {
    let Some(close) = line.tokens[open].matching_bracket else {
        return true;
    };
    line.tokens[close + 1..].iter().all(|t| !t.opens_scope())
}

/// An expression in parentheses extending to the end of the line.
fn expression_surrounded_by_parens(line: &LogicalLine, start: usize) -> bool {
    let mut idx = start;
    while idx < line.tokens.len() {
        let tok = &line.tokens[idx];
        if tok.text == "," {
            return false;
        }
        if tok.text == ")" {
            return idx + 1 >= line.tokens.len();
        }
        if tok.opens_scope() {
            let Some(close) = tok.matching_bracket else {
                return false;
            };
            idx = close + 1;
        } else {
            idx += 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::annotate::calculate_formatting_information;
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

    #[test]
    fn test_column_tracking_without_breaks() {
        let style = Style::default();
        let line = annotated("x = f(a)\n", &style);
        let mut state = FormatDecisionState::new(&line, &style, 0);
        state.move_to_next_token();
        while !state.done() {
            state.add_token(false, false);
        }
        assert_eq!(state.column, 8);
    }

    #[test]
    fn test_paren_stack_depth() {
        let style = Style::default();
        let line = annotated("f(g(h(a)))\n", &style);
        let mut state = FormatDecisionState::new(&line, &style, 0);
        state.move_to_next_token();
        let mut max_depth = 0;
        while !state.done() {
            state.add_token(false, false);
            max_depth = max_depth.max(state.stack.len());
        }
        assert_eq!(max_depth, 4);
        assert_eq!(state.stack.len(), 1);
    }

    #[test]
    fn test_newline_column_uses_continuation_indent() {
        let style = Style::default();
        let line = annotated("f(aaaa, bbbb)\n", &style);
        let mut state = FormatDecisionState::new(&line, &style, 0);
        state.move_to_next_token();
        // Place "(".
        state.add_token(false, false);
        // Break before the first argument: continuation indent from "f(".
        let (_, placement) = state.add_token(true, false);
        assert_eq!(placement.newlines, 1);
        assert_eq!(placement.spaces, 4);
        // Column is now the end of "aaaa" placed at the continuation indent.
        assert_eq!(state.column, 8);
    }

    #[test]
    fn test_excess_character_penalty() {
        let style = Style {
            column_limit: 20,
            ..Style::default()
        };
        let line = annotated("x = 'aaaaaaaaaaaaaaaaaaaaaaaaa'\n", &style);
        let mut state = FormatDecisionState::new(&line, &style, 0);
        state.move_to_next_token();
        let mut penalty = 0;
        while !state.done() {
            penalty += state.add_token(false, false).0;
        }
        assert!(penalty >= style.split_penalty_excess_character);
    }

    #[test]
    fn test_must_split_trailing_comma_paren() {
        let style = Style::default();
        let line = annotated("f(a, b, c,)\n", &style);
        let close = line.tokens.iter().position(|t| t.text == ")").unwrap();
        let mut state = FormatDecisionState::new(&line, &style, 0);
        state.move_to_next_token();
        while state.next_token_index < close {
            let must = state.must_split();
            state.add_token(must, must);
        }
        assert!(state.must_split(), "closing paren after trailing comma");
    }

    #[test]
    fn test_single_element_tuple_not_split() {
        let style = Style::default();
        let line = annotated("x = (1,)\n", &style);
        let close = line.tokens.iter().rposition(|t| t.text == ")").unwrap();
        let open = line.tokens[close].matching_bracket.unwrap();
        assert!(is_single_element_tuple(&line, open));
    }

    #[test]
    fn test_visual_alignment_after_open() {
        let style = Style::default();
        let line = annotated("foo(bar, baz)\n", &style);
        let mut state = FormatDecisionState::new(&line, &style, 0);
        state.move_to_next_token(); // foo
        state.add_token(false, false); // (
        state.add_token(false, false); // bar placed at column 4
        // The bracket's indent now points at "bar".
        assert_eq!(state.stack.last().unwrap().indent, 4);
    }

    #[test]
    fn test_opening_bracket_of() {
        let style = Style::default();
        let line = annotated("f(a, [b])\n", &style);
        let sq = line.tokens.iter().position(|t| t.text == "[").unwrap();
        let b = line.tokens.iter().position(|t| t.text == "b").unwrap();
        let close_sq = line.tokens.iter().position(|t| t.text == "]").unwrap();
        assert_eq!(opening_bracket_of(&line, b), Some(sq));
        assert_eq!(opening_bracket_of(&line, sq), Some(sq));
        assert_eq!(opening_bracket_of(&line, close_sq), Some(sq));
    }

    #[test]
    fn test_seen_key_ignores_stack_when_flagged() {
        let style = Style::default();
        let line = annotated("f(a, b)\n", &style);
        let mut a = FormatDecisionState::new(&line, &style, 0);
        a.move_to_next_token();
        let mut b = a.clone();
        b.ignore_stack_for_comparison = true;
        b.stack.push(ParenState::new(8, 8));
        assert_eq!(a.seen_key(), b.seen_key());
    }

    #[test]
    fn test_comprehension_state_pushed() {
        let style = Style::default();
        let line = annotated("x = [a for a in b]\n", &style);
        let mut state = FormatDecisionState::new(&line, &style, 0);
        state.move_to_next_token();
        let mut saw_comp = false;
        while !state.done() {
            state.add_token(false, false);
            saw_comp |= !state.comp_stack.is_empty();
        }
        assert!(saw_comp);
        assert!(state.comp_stack.is_empty());
    }
}
