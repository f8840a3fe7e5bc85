//! Blank-line planning between logical lines.
//!
//! Chooses how many newlines precede each logical line: configurable blank
//! lines around top-level definitions, a blank line before the first nested
//! definition, spacing between top-level imports and variables, docstring
//! rules, and retention of the original spacing everywhere else.

use crate::config::Style;
use crate::format::emitter;
use crate::format::logical_lines::LogicalLine;

pub const NO_BLANK_LINES: usize = 1;
pub const ONE_BLANK_LINE: usize = 2;

fn is_class_or_def(line: &LogicalLine) -> bool {
    matches!(line.effective_first_value(), "class" | "def") || line.first().text == "@"
}

/// Plans the newline count before each line as the reformatter walks the
/// file. Tracks nesting of definitions so "first nested def" is known.
#[derive(Default)]
pub struct BlankLinePlanner {
    nested_depth: Vec<usize>,
}

impl BlankLinePlanner {
    #[must_use]
    pub fn new() -> Self {
        BlankLinePlanner::default()
    }

    /// Decide and install the whitespace prefix of `line`'s first token.
    /// May adjust previously finished lines when blank lines belong before
    /// an attached comment run instead of the definition itself.
    pub fn plan(&mut self, line: &mut LogicalLine, final_lines: &mut [LogicalLine], style: &Style) {
        let depth = line.depth;
        while self.nested_depth.last().is_some_and(|&d| d > depth) {
            self.nested_depth.pop();
        }
        let mut first_nested = false;
        if is_class_or_def(line) {
            if self.nested_depth.is_empty() {
                self.nested_depth.push(depth);
            } else if self.nested_depth.last().is_some_and(|&d| d < depth) {
                first_nested = true;
                self.nested_depth.push(depth);
            }
        }

        let newlines = calculate_newlines(line, final_lines, style, first_nested);
        emitter::set_first_token_prefix(line, newlines, style);
    }
}

#[allow(clippy::too_many_lines)]
fn calculate_newlines(
    line: &LogicalLine,
    final_lines: &mut [LogicalLine],
    style: &Style,
    first_nested: bool,
) -> usize {
    let Some(prev_index) = final_lines.len().checked_sub(1) else {
        // The first line in the file gets no leading newlines.
        return 0;
    };
    let prev_line = &final_lines[prev_index];
    let first = line.first();

    if line.is_docstring {
        if prev_line.first().text == "class" && style.blank_line_before_class_docstring {
            return ONE_BLANK_LINE;
        }
        if prev_line.is_comment_line() && style.blank_line_before_module_docstring {
            return ONE_BLANK_LINE;
        }
        return NO_BLANK_LINES;
    }

    if first.is_name() && line.depth == 0 {
        if matches!(prev_line.effective_first_value(), "from" | "import") {
            // Configurable spacing between top-level imports and variables.
            return 1 + style.blank_lines_between_top_level_imports_and_variables;
        }
    }

    let prev_last_end = prev_line.last().end_lineno();

    if prev_line.is_docstring {
        if line.depth == 0 && is_class_or_def(line) {
            return 1 + style.blank_lines_around_top_level_definition;
        }
        if first_nested && !style.blank_line_before_nested_class_or_def {
            return NO_BLANK_LINES;
        }
        if first.lineno == prev_last_end + 1 {
            return NO_BLANK_LINES;
        }
        return ONE_BLANK_LINE;
    }

    if is_class_or_def(line) {
        if prev_line.first().text == "@" {
            // Keep a definition right under its decorators.
            return NO_BLANK_LINES;
        }
        if line.depth == 0 {
            let prev_last_is_standalone_comment =
                prev_line.is_comment_line() && !prev_line.disable;
            if prev_last_is_standalone_comment && first.lineno == prev_last_end + 1 {
                // The comment run is attached to this definition; the blank
                // lines move before the run.
                let mut run_start = prev_index;
                while run_start > 0 && final_lines[run_start - 1].is_comment_line() {
                    run_start -= 1;
                }
                let after_decorator =
                    run_start > 0 && final_lines[run_start - 1].first().text == "@";
                let newlines = if after_decorator {
                    NO_BLANK_LINES
                } else {
                    1 + style.blank_lines_around_top_level_definition
                };
                final_lines[run_start].tokens[0].adjust_newlines_before(newlines);
                return NO_BLANK_LINES;
            }
            return 1 + style.blank_lines_around_top_level_definition;
        }
        if first_nested {
            if style.blank_line_before_nested_class_or_def {
                return ONE_BLANK_LINE;
            }
            if is_class_or_def(prev_line) {
                // Keep the first nested definition right under its
                // enclosing header.
                return NO_BLANK_LINES;
            }
        }
    }

    // Otherwise retain the original vertical spacing, capped at one blank
    // line.
    if first.lineno > prev_last_end + 1 {
        return ONE_BLANK_LINE;
    }
    NO_BLANK_LINES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::annotate::calculate_formatting_information;
    use crate::format::logical_lines::build_logical_lines;
    use crate::format::subtype::assign_subtypes;
    use crate::parser::tokenize;

    fn newline_counts(source: &str, style: &Style) -> Vec<usize> {
        let mut lines = build_logical_lines(tokenize(source).unwrap()).unwrap();
        for line in &mut lines {
            assign_subtypes(line);
            calculate_formatting_information(line, style);
        }
        let mut planner = BlankLinePlanner::new();
        let mut done: Vec<LogicalLine> = Vec::new();
        for mut line in lines {
            planner.plan(&mut line, &mut done, style);
            done.push(line);
        }
        done.iter()
            .map(|l| {
                l.first()
                    .whitespace_prefix
                    .chars()
                    .take_while(|&c| c == '\n')
                    .count()
            })
            .collect()
    }

    #[test]
    fn test_first_line_has_no_newlines() {
        let counts = newline_counts("x = 1\n", &Style::default());
        assert_eq!(counts, vec![0]);
    }

    #[test]
    fn test_two_blank_lines_before_top_level_def() {
        let counts = newline_counts("x = 1\ndef f():\n    pass\n", &Style::default());
        assert_eq!(counts, vec![0, 3, 1]);
    }

    #[test]
    fn test_def_after_decorator_gets_no_blank() {
        let counts = newline_counts("@deco\ndef f():\n    pass\n", &Style::default());
        assert_eq!(counts[1], 1);
    }

    #[test]
    fn test_attached_comment_moves_blank_lines() {
        let source = "x = 1\n# about f\ndef f():\n    pass\n";
        let counts = newline_counts(source, &Style::default());
        // The comment gets the two blank lines; the def follows directly.
        assert_eq!(counts, vec![0, 3, 1, 1]);
    }

    #[test]
    fn test_imports_to_variables_spacing() {
        let counts = newline_counts("import os\nx = 1\n", &Style::default());
        assert_eq!(counts, vec![0, 2]);
    }

    #[test]
    fn test_original_single_blank_retained() {
        let counts = newline_counts("x = 1\n\ny = 2\n", &Style::default());
        assert_eq!(counts, vec![0, 2]);
    }

    #[test]
    fn test_extra_blanks_collapse_to_one() {
        let counts = newline_counts("x = 1\n\n\n\ny = 2\n", &Style::default());
        assert_eq!(counts, vec![0, 2]);
    }

    #[test]
    fn test_nested_def_blank_line_knob() {
        let source = "def f():\n    x = 1\n    def g():\n        pass\n";
        let counts = newline_counts(source, &Style::default());
        // No insertion unless the knob is set.
        assert_eq!(counts[2], 1);

        let style = Style {
            blank_line_before_nested_class_or_def: true,
            ..Style::default()
        };
        let counts = newline_counts(source, &style);
        assert_eq!(counts[2], 2);
    }

    #[test]
    fn test_first_method_stays_under_class_header() {
        let source = "class A:\n    def m(self):\n        pass\n";
        let counts = newline_counts(source, &Style::default());
        assert_eq!(counts[1], 1);
    }

    #[test]
    fn test_docstring_stays_attached() {
        let counts = newline_counts("def f():\n    'doc'\n    x = 1\n", &Style::default());
        assert_eq!(counts[1], 1);
    }

    #[test]
    fn test_blank_line_before_class_docstring_knob() {
        let style = Style {
            blank_line_before_class_docstring: true,
            ..Style::default()
        };
        let counts = newline_counts("class A:\n    'doc'\n", &style);
        assert_eq!(counts[1], 2);
    }
}
