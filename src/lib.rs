//! pyprettier - Auto-formatter for Python source code
//!
//! Reformats Python source so its whitespace conforms to a configurable
//! style: a best-first search chooses the cheapest legal set of line breaks
//! for each logical line, within the column limit and the style's rules.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]

pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod format;
pub mod parser;
pub mod process;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Style;
pub use error::{FormatError, Result};
pub use process::{format_bytes, format_source, FormatResult};
