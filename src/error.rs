//! Error types and result aliases for pyprettier.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used throughout the crate
//! - [`FormatError`]: The error kinds a formatting run can produce

use anyhow::Result as AnyhowResult;
use thiserror::Error;

pub type Result<T> = AnyhowResult<T>;

/// Errors produced while formatting a single source buffer.
///
/// Per-file errors (`Parse`, `Encoding`, `Internal`) are reported and skip
/// that file; `Config` errors are fatal at startup.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The input is not syntactically valid Python.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Unknown knob, malformed value, or unknown base style.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The input bytes are not valid UTF-8.
    #[error("input is not valid UTF-8 at byte offset {0}")]
    Encoding(usize),

    /// The reflow frontier was exhausted without reaching the end of a
    /// logical line. The formatter fails for the file rather than emit
    /// corrupted source.
    #[error("line {0}: reflow search exhausted without a solution")]
    Internal(usize),
}

impl FormatError {
    /// Build a parse error at a source position.
    #[must_use]
    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        FormatError::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}
