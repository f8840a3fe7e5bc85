//! Formatter on/off directives and protected-line detection.
//!
//! Supports disabling reflow from within the source being formatted:
//! - a standalone comment containing `disable-formatter` starts a region
//!   that is emitted verbatim, ended by a comment containing
//!   `enable-formatter`
//! - a trailing `disable-formatter` comment disables its own line only
//! - lines matching the configured i18n comment regex, or containing a
//!   configured i18n function call, are left alone because moving the
//!   string away from its marker would break translation tooling
//!
//! Range-restricted formatting reuses the same mechanism: lines outside
//! the requested ranges are marked disabled.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Style;
use crate::format::logical_lines::LogicalLine;

/// Pattern for a directive that disables formatting.
static DISABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdisable-formatter\b").unwrap());

/// Pattern for a directive that re-enables formatting.
static ENABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\benable-formatter\b").unwrap());

/// Check whether a comment contains the disable directive.
#[must_use]
pub fn is_disable_comment(text: &str) -> bool {
    DISABLE_RE.is_match(text)
}

/// Check whether a comment contains the enable directive.
#[must_use]
pub fn is_enable_comment(text: &str) -> bool {
    ENABLE_RE.is_match(text)
}

/// Walk the logical lines and set `disable` from directive comments.
///
/// The state machine tracks whether formatting is currently enabled; a
/// standalone disable comment turns it off from that line onward, a
/// standalone enable comment turns it back on starting with its own line.
pub fn mark_disabled_lines(lines: &mut [LogicalLine], style: &Style) {
    let mut enabled = true;

    for line in lines.iter_mut() {
        if line.is_comment_line() {
            let text = &line.first().text;
            if is_enable_comment(text) {
                enabled = true;
            } else if is_disable_comment(text) {
                enabled = false;
                line.disable = true;
                continue;
            }
        }

        if !enabled {
            line.disable = true;
            continue;
        }

        // A trailing directive disables just this logical line.
        let has_line_level_disable = line
            .tokens
            .iter()
            .skip(1)
            .any(|tok| tok.is_comment() && is_disable_comment(&tok.text));
        if has_line_level_disable {
            line.disable = true;
        }
    }

    mark_i18n_lines(lines, style);
}

/// Disable lines containing i18n comments or i18n function calls.
fn mark_i18n_lines(lines: &mut [LogicalLine], style: &Style) {
    let comment_re = if style.i18n_comment.is_empty() {
        None
    } else {
        Regex::new(&style.i18n_comment).ok()
    };

    if comment_re.is_none() && style.i18n_function_call.is_empty() {
        return;
    }

    for line in lines.iter_mut() {
        if line.disable {
            continue;
        }
        if let Some(re) = &comment_re {
            if line
                .tokens
                .iter()
                .any(|tok| tok.is_comment() && re.is_match(&tok.text))
            {
                line.disable = true;
                continue;
            }
        }
        if !style.i18n_function_call.is_empty() {
            let call = line.tokens.windows(2).any(|pair| {
                pair[0].is_name()
                    && pair[1].text == "("
                    && style.i18n_function_call.contains(&pair[0].text)
            });
            if call {
                line.disable = true;
            }
        }
    }
}

/// Disable every logical line that does not intersect the requested
/// 1-based source lines. Only whitespace within the requested ranges may
/// change.
pub fn mark_lines_outside_ranges(lines: &mut [LogicalLine], selected: &BTreeSet<usize>) {
    for line in lines.iter_mut() {
        let start = line.lineno();
        let end = line.last().end_lineno();
        if selected.range(start..=end).next().is_none() {
            line.disable = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::logical_lines::build_logical_lines;
    use crate::parser::tokenize;

    fn marked(source: &str, style: &Style) -> Vec<LogicalLine> {
        let mut lines = build_logical_lines(tokenize(source).unwrap()).unwrap();
        mark_disabled_lines(&mut lines, style);
        lines
    }

    #[test]
    fn test_directive_patterns() {
        assert!(is_disable_comment("# disable-formatter"));
        assert!(is_enable_comment("# enable-formatter"));
        assert!(!is_disable_comment("# disable-formatters"));
        assert!(!is_disable_comment("# nothing to see"));
    }

    #[test]
    fn test_region_disable_enable() {
        let source = "\
a = 1
# disable-formatter
b   =   2
c =  3
# enable-formatter
d = 4
";
        let style = Style::default();
        let lines = marked(source, &style);
        let flags: Vec<bool> = lines.iter().map(|l| l.disable).collect();
        assert_eq!(flags, vec![false, true, true, true, false, false]);
    }

    #[test]
    fn test_trailing_comment_disables_single_line() {
        let source = "a  =  1  # disable-formatter\nb  =  2\n";
        let style = Style::default();
        let lines = marked(source, &style);
        assert!(lines[0].disable);
        assert!(!lines[1].disable);
    }

    #[test]
    fn test_region_without_enable_runs_to_eof() {
        let source = "# disable-formatter\na = 1\nb = 2\n";
        let style = Style::default();
        let lines = marked(source, &style);
        assert!(lines.iter().all(|l| l.disable));
    }

    #[test]
    fn test_i18n_comment_disables_line() {
        let style = Style {
            i18n_comment: r"#\..*".to_string(),
            ..Style::default()
        };
        let lines = marked("x = _('msg')  #. translator note\ny = 2\n", &style);
        assert!(lines[0].disable);
        assert!(!lines[1].disable);
    }

    #[test]
    fn test_i18n_function_call_disables_line() {
        let style = Style {
            i18n_function_call: vec!["N_".to_string()],
            ..Style::default()
        };
        let lines = marked("label = N_('translated')\nother = f('x')\n", &style);
        assert!(lines[0].disable);
        assert!(!lines[1].disable);
    }

    #[test]
    fn test_mark_lines_outside_ranges() {
        let mut lines =
            build_logical_lines(tokenize("a = 1\nb = 2\nc = 3\n").unwrap()).unwrap();
        let selected: BTreeSet<usize> = [2].into_iter().collect();
        mark_lines_outside_ranges(&mut lines, &selected);
        let flags: Vec<bool> = lines.iter().map(|l| l.disable).collect();
        assert_eq!(flags, vec![true, false, true]);
    }
}
