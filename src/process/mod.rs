//! End-to-end formatting pipeline.
//!
//! [`format_source`] takes source text through the full pipeline: tokenize,
//! build logical lines, tag subtypes, apply directives and line-range
//! restrictions, annotate, reflow, emit. CRLF line endings are preserved.

use std::collections::BTreeSet;

use crate::config::Style;
use crate::error::FormatError;
use crate::format::{
    assign_subtypes, build_logical_lines, calculate_formatting_information, reformat,
};
use crate::parser::tokenize;

/// Result of formatting one buffer.
#[derive(Debug, Clone)]
pub struct FormatResult {
    pub text: String,
    /// True when the output differs from the input.
    pub changed: bool,
}

/// Format Python source text.
///
/// When `line_ranges` is given, only logical lines intersecting those
/// 1-based source lines are reformatted; everything else is emitted
/// verbatim.
pub fn format_source(
    source: &str,
    style: &Style,
    line_ranges: Option<&BTreeSet<usize>>,
) -> Result<FormatResult, FormatError> {
    let uses_crlf = source.contains("\r\n");
    let normalized = if uses_crlf {
        source.replace("\r\n", "\n")
    } else {
        source.to_string()
    };

    let tokens = tokenize(&normalized)?;
    let mut lines = build_logical_lines(tokens)?;
    if lines.is_empty() {
        return Ok(FormatResult {
            text: source.to_string(),
            changed: false,
        });
    }

    for line in &mut lines {
        assign_subtypes(line);
    }
    crate::directive::mark_disabled_lines(&mut lines, style);
    if let Some(ranges) = line_ranges {
        crate::directive::mark_lines_outside_ranges(&mut lines, ranges);
    }
    for line in &mut lines {
        calculate_formatting_information(line, style);
    }

    let mut text = reformat(lines, style)?;
    if uses_crlf {
        text = text.replace('\n', "\r\n");
    }
    let changed = text != source;
    Ok(FormatResult { text, changed })
}

/// Format raw bytes, rejecting input that is not valid UTF-8.
pub fn format_bytes(
    bytes: &[u8],
    style: &Style,
    line_ranges: Option<&BTreeSet<usize>>,
) -> Result<FormatResult, FormatError> {
    let source =
        std::str::from_utf8(bytes).map_err(|e| FormatError::Encoding(e.valid_up_to()))?;
    format_source(source, style, line_ranges)
}

/// Parse `--lines START-END` specifications into a set of line numbers.
pub fn parse_line_ranges(specs: &[String]) -> Result<BTreeSet<usize>, FormatError> {
    let mut selected = BTreeSet::new();
    for spec in specs {
        let invalid = || FormatError::Config(format!("invalid line range: {spec}"));
        let (start, end) = spec.split_once('-').ok_or_else(invalid)?;
        let start: usize = start.trim().parse().map_err(|_| invalid())?;
        let end: usize = end.trim().parse().map_err(|_| invalid())?;
        if start == 0 || end < start {
            return Err(invalid());
        }
        selected.extend(start..=end);
    }
    Ok(selected)
}
