//! Style configuration for pyprettier.
//!
//! This module provides the [`Style`] struct which controls all formatting
//! behavior. A concrete style is a predefined baseline (`pep8` or `google`)
//! overlaid with user overrides from:
//! - TOML files (`pyprettier.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the
//! file being formatted up to the filesystem root, plus the user's home
//! directory. Knob names are case-insensitive; unknown knobs and malformed
//! values are configuration errors.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::FormatError;

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["pyprettier.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    // Try HOME environment variable first (works on Unix and some Windows setups)
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

/// How continuation lines are aligned relative to the opening bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContinuationAlignStyle {
    /// Align with spaces to the visual column.
    Space,
    /// Always indent by `indent_width` plus `continuation_indent_width`.
    Fixed,
    /// Round the alignment column up to a multiple of `indent_width`.
    ValignRight,
}

impl ContinuationAlignStyle {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "space" => Some(ContinuationAlignStyle::Space),
            "fixed" => Some(ContinuationAlignStyle::Fixed),
            "valign-right" | "valign_right" => Some(ContinuationAlignStyle::ValignRight),
            _ => None,
        }
    }
}

/// Spacing before trailing comments: a fixed count, or a ladder of
/// alignment columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SpacesBeforeComment {
    Fixed(usize),
    Align(Vec<usize>),
}

impl SpacesBeforeComment {
    /// The minimum spacing the annotator requires before a comment.
    #[must_use]
    pub fn minimum(&self) -> usize {
        match self {
            SpacesBeforeComment::Fixed(n) => *n,
            SpacesBeforeComment::Align(_) => 2,
        }
    }

    /// Alignment columns, when configured as a ladder.
    #[must_use]
    pub fn alignment_columns(&self) -> Option<&[usize]> {
        match self {
            SpacesBeforeComment::Fixed(_) => None,
            SpacesBeforeComment::Align(cols) => Some(cols),
        }
    }
}

/// Main style configuration struct for pyprettier.
#[derive(Debug, Clone, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Style {
    /// Maximum physical-line width.
    pub column_limit: usize,
    /// Columns per indent level.
    pub indent_width: usize,
    /// Columns for continuation indent.
    pub continuation_indent_width: usize,
    /// Indent with tab characters.
    pub use_tabs: bool,
    pub continuation_align_style: ContinuationAlignStyle,
    pub spaces_before_comment: SpacesBeforeComment,

    /// Put closing brackets on their own dedented line.
    pub dedent_closing_brackets: bool,
    /// Put closing brackets on their own indented line.
    pub indent_closing_brackets: bool,
    /// Suppress breaks between adjacent opening brackets.
    pub coalesce_brackets: bool,

    pub split_before_arithmetic_operator: bool,
    pub split_before_bitwise_operator: bool,
    pub split_before_logical_operator: bool,
    pub split_before_dict_set_generator: bool,
    pub split_before_closing_bracket: bool,
    pub split_before_first_argument: bool,
    pub split_before_expression_after_opening_paren: bool,
    pub split_complex_comprehension: bool,

    pub split_all_comma_separated_values: bool,
    pub split_all_top_level_comma_separated_values: bool,
    pub split_arguments_when_comma_terminated: bool,
    pub disable_ending_comma_heuristic: bool,
    pub disable_split_list_with_comment: bool,
    pub each_dict_entry_on_separate_line: bool,
    pub force_multiline_dict: bool,

    pub allow_multiline_lambdas: bool,
    pub allow_multiline_dictionary_keys: bool,
    pub allow_split_before_dict_value: bool,
    pub allow_split_before_default_or_named_assigns: bool,

    pub arithmetic_precedence_indication: bool,
    pub no_spaces_around_selected_binary_operators: BTreeSet<String>,
    pub spaces_around_default_or_named_assign: bool,
    pub spaces_around_power_operator: bool,
    pub spaces_around_subscript_colon: bool,
    pub spaces_around_dict_delimiters: bool,
    pub spaces_around_list_delimiters: bool,
    pub spaces_around_tuple_delimiters: bool,
    pub space_inside_brackets: bool,
    pub space_between_ending_comma_and_closing_bracket: bool,

    pub blank_lines_around_top_level_definition: usize,
    pub blank_lines_between_top_level_imports_and_variables: usize,
    pub blank_line_before_module_docstring: bool,
    pub blank_line_before_class_docstring: bool,
    pub blank_line_before_nested_class_or_def: bool,

    pub join_multiple_lines: bool,
    pub indent_dictionary_value: bool,
    pub indent_blank_lines: bool,

    /// Regex identifying internationalization comments; matching lines are
    /// not reflowed.
    pub i18n_comment: String,
    /// Function names whose calls must not be reflowed.
    pub i18n_function_call: Vec<String>,

    pub split_penalty_after_opening_bracket: u64,
    pub split_penalty_after_unary_operator: u64,
    pub split_penalty_arithmetic_operator: u64,
    pub split_penalty_bitwise_operator: u64,
    pub split_penalty_comprehension: u64,
    pub split_penalty_excess_character: u64,
    pub split_penalty_for_added_line_split: u64,
    pub split_penalty_import_names: u64,
    pub split_penalty_logical_operator: u64,
}

impl Default for Style {
    fn default() -> Self {
        Style::pep8()
    }
}

impl Style {
    /// Minimum reasonable column limit (must fit at least some code)
    const MIN_COLUMN_LIMIT: usize = 20;
    /// Maximum reasonable column limit
    const MAX_COLUMN_LIMIT: usize = 1000;
    /// Maximum reasonable indent size
    const MAX_INDENT: usize = 16;

    /// The conventional baseline.
    #[must_use]
    pub fn pep8() -> Self {
        Style {
            column_limit: 79,
            indent_width: 4,
            continuation_indent_width: 4,
            use_tabs: false,
            continuation_align_style: ContinuationAlignStyle::Space,
            spaces_before_comment: SpacesBeforeComment::Fixed(2),
            dedent_closing_brackets: false,
            indent_closing_brackets: false,
            coalesce_brackets: false,
            split_before_arithmetic_operator: false,
            split_before_bitwise_operator: true,
            split_before_logical_operator: false,
            split_before_dict_set_generator: true,
            split_before_closing_bracket: true,
            split_before_first_argument: false,
            split_before_expression_after_opening_paren: false,
            split_complex_comprehension: false,
            split_all_comma_separated_values: false,
            split_all_top_level_comma_separated_values: false,
            split_arguments_when_comma_terminated: false,
            disable_ending_comma_heuristic: false,
            disable_split_list_with_comment: false,
            each_dict_entry_on_separate_line: true,
            force_multiline_dict: false,
            allow_multiline_lambdas: false,
            allow_multiline_dictionary_keys: false,
            allow_split_before_dict_value: true,
            allow_split_before_default_or_named_assigns: true,
            arithmetic_precedence_indication: false,
            no_spaces_around_selected_binary_operators: BTreeSet::new(),
            spaces_around_default_or_named_assign: false,
            spaces_around_power_operator: false,
            spaces_around_subscript_colon: false,
            spaces_around_dict_delimiters: false,
            spaces_around_list_delimiters: false,
            spaces_around_tuple_delimiters: false,
            space_inside_brackets: false,
            space_between_ending_comma_and_closing_bracket: true,
            blank_lines_around_top_level_definition: 2,
            blank_lines_between_top_level_imports_and_variables: 1,
            blank_line_before_module_docstring: false,
            blank_line_before_class_docstring: false,
            blank_line_before_nested_class_or_def: false,
            join_multiple_lines: true,
            indent_dictionary_value: false,
            indent_blank_lines: false,
            i18n_comment: String::new(),
            i18n_function_call: Vec::new(),
            split_penalty_after_opening_bracket: 300,
            split_penalty_after_unary_operator: 10_000,
            split_penalty_arithmetic_operator: 300,
            split_penalty_bitwise_operator: 300,
            split_penalty_comprehension: 80,
            split_penalty_excess_character: 7_000,
            split_penalty_for_added_line_split: 30,
            split_penalty_import_names: 0,
            split_penalty_logical_operator: 300,
        }
    }

    /// The second widely-used baseline sheet.
    #[must_use]
    pub fn google() -> Self {
        Style {
            column_limit: 80,
            split_before_bitwise_operator: false,
            split_complex_comprehension: true,
            split_penalty_comprehension: 2_100,
            blank_line_before_nested_class_or_def: true,
            indent_dictionary_value: true,
            i18n_comment: r"#\..*".to_string(),
            i18n_function_call: vec!["N_".to_string(), "_".to_string()],
            ..Style::pep8()
        }
    }

    /// Look up a predefined baseline by name (case-insensitive).
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pep8" => Some(Style::pep8()),
            "google" => Some(Style::google()),
            _ => None,
        }
    }

    /// Resolve a `--style` argument: a baseline name or a TOML file path.
    pub fn from_arg(arg: &str) -> crate::Result<Self> {
        if let Some(style) = Style::by_name(arg) {
            return Ok(style);
        }
        let path = Path::new(arg);
        if path.is_file() {
            return Style::from_toml_file(path);
        }
        Err(FormatError::Config(format!("unknown style: {arg}")).into())
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Style::from_toml_str(&contents)
    }

    /// Parse a TOML document of knob overrides on top of its baseline.
    ///
    /// `based_on_style` (if present) selects the baseline; every other key
    /// is applied case-insensitively. Unknown knobs and malformed values
    /// are [`FormatError::Config`] errors.
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let mut style = Style::default();
        style.merge_toml_str(contents, None)?;
        if let Some(error) = style.validate() {
            return Err(FormatError::Config(error).into());
        }
        Ok(style)
    }

    /// Apply knob overrides from TOML text on top of the current values.
    fn merge_toml_str(&mut self, contents: &str, origin: Option<&Path>) -> crate::Result<()> {
        let label = |msg: String| match origin {
            Some(path) => FormatError::Config(format!("{}: {msg}", path.display())),
            None => FormatError::Config(msg),
        };

        let value: toml::Value = contents
            .parse()
            .map_err(|e| label(format!("malformed TOML: {e}")))?;
        let Some(table) = value.as_table() else {
            return Err(label("expected a table of knobs".to_string()).into());
        };

        for (key, val) in table {
            if key.eq_ignore_ascii_case("based_on_style") {
                let name = val
                    .as_str()
                    .ok_or_else(|| label("based_on_style must be a string".to_string()))?;
                *self = Style::by_name(name)
                    .ok_or_else(|| label(format!("unknown base style: {name}")))?;
            }
        }
        for (key, val) in table {
            if key.eq_ignore_ascii_case("based_on_style") {
                continue;
            }
            self.apply_knob(key, val).map_err(|msg| label(msg))?;
        }
        Ok(())
    }

    /// Apply a single knob override. Knob names are case-insensitive.
    #[allow(clippy::too_many_lines)]
    pub fn apply_knob(&mut self, name: &str, value: &toml::Value) -> Result<(), String> {
        let key = name.to_ascii_lowercase();
        match key.as_str() {
            "column_limit" => self.column_limit = usize_knob(&key, value)?,
            "indent_width" => self.indent_width = usize_knob(&key, value)?,
            "continuation_indent_width" => {
                self.continuation_indent_width = usize_knob(&key, value)?;
            }
            "use_tabs" => self.use_tabs = bool_knob(&key, value)?,
            "continuation_align_style" => {
                let text = str_knob(&key, value)?;
                self.continuation_align_style = ContinuationAlignStyle::parse(&text)
                    .ok_or_else(|| format!("invalid value for {key}: {text}"))?;
            }
            "spaces_before_comment" => {
                self.spaces_before_comment = match value {
                    toml::Value::Integer(n) if *n >= 0 => {
                        #[allow(clippy::cast_sign_loss)]
                        SpacesBeforeComment::Fixed(*n as usize)
                    }
                    toml::Value::Array(_) => {
                        let mut cols = int_list_knob(&key, value)?;
                        cols.sort_unstable();
                        SpacesBeforeComment::Align(cols)
                    }
                    _ => return Err(format!("{key} must be an integer or list of integers")),
                };
            }
            "dedent_closing_brackets" => self.dedent_closing_brackets = bool_knob(&key, value)?,
            "indent_closing_brackets" => self.indent_closing_brackets = bool_knob(&key, value)?,
            "coalesce_brackets" => self.coalesce_brackets = bool_knob(&key, value)?,
            "split_before_arithmetic_operator" => {
                self.split_before_arithmetic_operator = bool_knob(&key, value)?;
            }
            "split_before_bitwise_operator" => {
                self.split_before_bitwise_operator = bool_knob(&key, value)?;
            }
            "split_before_logical_operator" => {
                self.split_before_logical_operator = bool_knob(&key, value)?;
            }
            "split_before_dict_set_generator" => {
                self.split_before_dict_set_generator = bool_knob(&key, value)?;
            }
            "split_before_closing_bracket" => {
                self.split_before_closing_bracket = bool_knob(&key, value)?;
            }
            "split_before_first_argument" => {
                self.split_before_first_argument = bool_knob(&key, value)?;
            }
            "split_before_expression_after_opening_paren" => {
                self.split_before_expression_after_opening_paren = bool_knob(&key, value)?;
            }
            "split_complex_comprehension" => {
                self.split_complex_comprehension = bool_knob(&key, value)?;
            }
            "split_all_comma_separated_values" => {
                self.split_all_comma_separated_values = bool_knob(&key, value)?;
            }
            "split_all_top_level_comma_separated_values" => {
                self.split_all_top_level_comma_separated_values = bool_knob(&key, value)?;
            }
            "split_arguments_when_comma_terminated" => {
                self.split_arguments_when_comma_terminated = bool_knob(&key, value)?;
            }
            "disable_ending_comma_heuristic" => {
                self.disable_ending_comma_heuristic = bool_knob(&key, value)?;
            }
            "disable_split_list_with_comment" => {
                self.disable_split_list_with_comment = bool_knob(&key, value)?;
            }
            "each_dict_entry_on_separate_line" => {
                self.each_dict_entry_on_separate_line = bool_knob(&key, value)?;
            }
            "force_multiline_dict" => self.force_multiline_dict = bool_knob(&key, value)?,
            "allow_multiline_lambdas" => self.allow_multiline_lambdas = bool_knob(&key, value)?,
            "allow_multiline_dictionary_keys" => {
                self.allow_multiline_dictionary_keys = bool_knob(&key, value)?;
            }
            "allow_split_before_dict_value" => {
                self.allow_split_before_dict_value = bool_knob(&key, value)?;
            }
            "allow_split_before_default_or_named_assigns" => {
                self.allow_split_before_default_or_named_assigns = bool_knob(&key, value)?;
            }
            "arithmetic_precedence_indication" => {
                self.arithmetic_precedence_indication = bool_knob(&key, value)?;
            }
            "no_spaces_around_selected_binary_operators" => {
                self.no_spaces_around_selected_binary_operators = str_set_knob(&key, value)?;
            }
            "spaces_around_default_or_named_assign" => {
                self.spaces_around_default_or_named_assign = bool_knob(&key, value)?;
            }
            "spaces_around_power_operator" => {
                self.spaces_around_power_operator = bool_knob(&key, value)?;
            }
            "spaces_around_subscript_colon" => {
                self.spaces_around_subscript_colon = bool_knob(&key, value)?;
            }
            "spaces_around_dict_delimiters" => {
                self.spaces_around_dict_delimiters = bool_knob(&key, value)?;
            }
            "spaces_around_list_delimiters" => {
                self.spaces_around_list_delimiters = bool_knob(&key, value)?;
            }
            "spaces_around_tuple_delimiters" => {
                self.spaces_around_tuple_delimiters = bool_knob(&key, value)?;
            }
            "space_inside_brackets" => self.space_inside_brackets = bool_knob(&key, value)?,
            "space_between_ending_comma_and_closing_bracket" => {
                self.space_between_ending_comma_and_closing_bracket = bool_knob(&key, value)?;
            }
            "blank_lines_around_top_level_definition" => {
                self.blank_lines_around_top_level_definition = usize_knob(&key, value)?;
            }
            "blank_lines_between_top_level_imports_and_variables" => {
                self.blank_lines_between_top_level_imports_and_variables =
                    usize_knob(&key, value)?;
            }
            "blank_line_before_module_docstring" => {
                self.blank_line_before_module_docstring = bool_knob(&key, value)?;
            }
            "blank_line_before_class_docstring" => {
                self.blank_line_before_class_docstring = bool_knob(&key, value)?;
            }
            "blank_line_before_nested_class_or_def" => {
                self.blank_line_before_nested_class_or_def = bool_knob(&key, value)?;
            }
            "join_multiple_lines" => self.join_multiple_lines = bool_knob(&key, value)?,
            "indent_dictionary_value" => self.indent_dictionary_value = bool_knob(&key, value)?,
            "indent_blank_lines" => self.indent_blank_lines = bool_knob(&key, value)?,
            "i18n_comment" => self.i18n_comment = str_knob(&key, value)?,
            "i18n_function_call" => {
                self.i18n_function_call = str_set_knob(&key, value)?.into_iter().collect();
            }
            "split_penalty_after_opening_bracket" => {
                self.split_penalty_after_opening_bracket = u64_knob(&key, value)?;
            }
            "split_penalty_after_unary_operator" => {
                self.split_penalty_after_unary_operator = u64_knob(&key, value)?;
            }
            "split_penalty_arithmetic_operator" => {
                self.split_penalty_arithmetic_operator = u64_knob(&key, value)?;
            }
            "split_penalty_bitwise_operator" => {
                self.split_penalty_bitwise_operator = u64_knob(&key, value)?;
            }
            "split_penalty_comprehension" => {
                self.split_penalty_comprehension = u64_knob(&key, value)?;
            }
            "split_penalty_excess_character" => {
                self.split_penalty_excess_character = u64_knob(&key, value)?;
            }
            "split_penalty_for_added_line_split" => {
                self.split_penalty_for_added_line_split = u64_knob(&key, value)?;
            }
            "split_penalty_import_names" => {
                self.split_penalty_import_names = u64_knob(&key, value)?;
            }
            "split_penalty_logical_operator" => {
                self.split_penalty_logical_operator = u64_knob(&key, value)?;
            }
            _ => return Err(format!("unknown knob: {name}")),
        }
        Ok(())
    }

    /// Validate configuration values are within reasonable bounds
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.indent_width == 0 {
            return Some("indent_width must be at least 1".to_string());
        }
        if self.indent_width > Self::MAX_INDENT {
            return Some(format!(
                "indent_width {} exceeds maximum of {}",
                self.indent_width,
                Self::MAX_INDENT
            ));
        }
        if self.continuation_indent_width > Self::MAX_INDENT {
            return Some(format!(
                "continuation_indent_width {} exceeds maximum of {}",
                self.continuation_indent_width,
                Self::MAX_INDENT
            ));
        }
        if self.column_limit < Self::MIN_COLUMN_LIMIT {
            return Some(format!(
                "column_limit {} is below minimum of {}",
                self.column_limit,
                Self::MIN_COLUMN_LIMIT
            ));
        }
        if self.column_limit > Self::MAX_COLUMN_LIMIT {
            return Some(format!(
                "column_limit {} exceeds maximum of {}",
                self.column_limit,
                Self::MAX_COLUMN_LIMIT
            ));
        }
        if self.dedent_closing_brackets && self.indent_closing_brackets {
            return Some(
                "dedent_closing_brackets and indent_closing_brackets are mutually exclusive"
                    .to_string(),
            );
        }
        if !self.i18n_comment.is_empty() {
            if let Err(e) = regex::Regex::new(&self.i18n_comment) {
                return Some(format!("i18n_comment is not a valid regex: {e}"));
            }
        }
        None
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the file's directory up to the root, then adds home
    /// directory config. Returns the list of config file paths in order of
    /// priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        // Add home directory config first (lowest priority)
        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        // Start from the file's parent directory (or the path itself if it's a directory)
        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::env::current_dir().ok()
        };

        // Collect config files from parent directories (from root to current)
        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Reverse so we go from root to current (less specific to more specific)
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones. Returns the default style if no
    /// files are found; malformed files are configuration errors.
    pub fn from_discovered_files(start_path: &Path) -> crate::Result<Self> {
        let config_files = Self::discover_config_files(start_path);
        let mut style = Style::default();

        for path in &config_files {
            let contents = std::fs::read_to_string(path)?;
            style.merge_toml_str(&contents, Some(path))?;
        }

        if let Some(error) = style.validate() {
            return Err(FormatError::Config(error).into());
        }
        Ok(style)
    }
}

fn usize_knob(key: &str, value: &toml::Value) -> Result<usize, String> {
    match value {
        toml::Value::Integer(n) if *n >= 0 => {
            #[allow(clippy::cast_sign_loss)]
            Ok(*n as usize)
        }
        _ => Err(format!("{key} must be a non-negative integer")),
    }
}

fn u64_knob(key: &str, value: &toml::Value) -> Result<u64, String> {
    match value {
        toml::Value::Integer(n) if *n >= 0 => {
            #[allow(clippy::cast_sign_loss)]
            Ok(*n as u64)
        }
        _ => Err(format!("{key} must be a non-negative integer")),
    }
}

fn bool_knob(key: &str, value: &toml::Value) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("{key} must be a boolean"))
}

fn str_knob(key: &str, value: &toml::Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("{key} must be a string"))
}

fn int_list_knob(key: &str, value: &toml::Value) -> Result<Vec<usize>, String> {
    let arr = value
        .as_array()
        .ok_or_else(|| format!("{key} must be a list of integers"))?;
    arr.iter().map(|v| usize_knob(key, v)).collect()
}

/// Accepts a list of strings or a comma-separated string.
fn str_set_knob(key: &str, value: &toml::Value) -> Result<BTreeSet<String>, String> {
    match value {
        toml::Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()),
        toml::Value::Array(items) => items.iter().map(|v| str_knob(key, v)).collect(),
        _ => Err(format!("{key} must be a string or list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = Style::default();
        assert_eq!(style.column_limit, 79);
        assert_eq!(style.indent_width, 4);
        assert!(style.each_dict_entry_on_separate_line);
        assert!(!style.force_multiline_dict);
        assert!(style.join_multiple_lines);
    }

    #[test]
    fn test_google_style() {
        let style = Style::google();
        assert_eq!(style.column_limit, 80);
        assert!(style.split_complex_comprehension);
        assert!(style.indent_dictionary_value);
        assert_eq!(style.i18n_function_call, vec!["N_", "_"]);
    }

    #[test]
    fn test_by_name_case_insensitive() {
        assert!(Style::by_name("PEP8").is_some());
        assert!(Style::by_name("Google").is_some());
        assert!(Style::by_name("unknown").is_none());
    }

    #[test]
    fn test_from_toml_str_overrides() {
        let style = Style::from_toml_str(
            "based_on_style = \"google\"\nCOLUMN_LIMIT = 100\nuse_tabs = true\n",
        )
        .unwrap();
        assert_eq!(style.column_limit, 100);
        assert!(style.use_tabs);
        // Inherited from the google baseline.
        assert!(style.split_complex_comprehension);
    }

    #[test]
    fn test_unknown_knob_is_error() {
        let err = Style::from_toml_str("not_a_knob = 3\n").unwrap_err();
        assert!(err.to_string().contains("unknown knob"));
    }

    #[test]
    fn test_unknown_base_style_is_error() {
        let err = Style::from_toml_str("based_on_style = \"klingon\"\n").unwrap_err();
        assert!(err.to_string().contains("unknown base style"));
    }

    #[test]
    fn test_malformed_value_is_error() {
        let err = Style::from_toml_str("column_limit = \"wide\"\n").unwrap_err();
        assert!(err.to_string().contains("column_limit"));
    }

    #[test]
    fn test_spaces_before_comment_forms() {
        let style = Style::from_toml_str("spaces_before_comment = 4\n").unwrap();
        assert_eq!(style.spaces_before_comment, SpacesBeforeComment::Fixed(4));

        let style = Style::from_toml_str("spaces_before_comment = [30, 15, 45]\n").unwrap();
        assert_eq!(
            style.spaces_before_comment,
            SpacesBeforeComment::Align(vec![15, 30, 45])
        );
    }

    #[test]
    fn test_no_spaces_operators_accepts_both_forms() {
        let style = Style::from_toml_str("no_spaces_around_selected_binary_operators = \"*,/\"\n")
            .unwrap();
        assert!(style.no_spaces_around_selected_binary_operators.contains("*"));
        assert!(style.no_spaces_around_selected_binary_operators.contains("/"));

        let style =
            Style::from_toml_str("no_spaces_around_selected_binary_operators = [\"**\"]\n")
                .unwrap();
        assert!(style.no_spaces_around_selected_binary_operators.contains("**"));
    }

    #[test]
    fn test_validate_bounds() {
        let style = Style {
            column_limit: 5,
            ..Style::default()
        };
        assert!(style.validate().is_some());

        let style = Style {
            indent_width: 0,
            ..Style::default()
        };
        assert!(style.validate().is_some());

        let style = Style {
            dedent_closing_brackets: true,
            indent_closing_brackets: true,
            ..Style::default()
        };
        assert!(style.validate().is_some());
    }

    #[test]
    fn test_validate_i18n_regex() {
        let style = Style {
            i18n_comment: "([unclosed".to_string(),
            ..Style::default()
        };
        assert!(style.validate().unwrap().contains("i18n_comment"));
    }

    #[test]
    fn test_continuation_align_style_parse() {
        assert_eq!(
            ContinuationAlignStyle::parse("VALIGN-RIGHT"),
            Some(ContinuationAlignStyle::ValignRight)
        );
        assert_eq!(
            ContinuationAlignStyle::parse("fixed"),
            Some(ContinuationAlignStyle::Fixed)
        );
        assert_eq!(ContinuationAlignStyle::parse("diagonal"), None);
    }

    #[test]
    fn test_discover_config_files_nonexistent_path() {
        let path = PathBuf::from("/nonexistent/path/file.py");
        // Should not panic, just return whatever is discoverable.
        let _ = Style::discover_config_files(&path);
    }

    #[test]
    fn test_from_discovered_files_returns_default_when_empty() {
        let path = PathBuf::from("/nonexistent/unique/path/file.py");
        let style = Style::from_discovered_files(&path).unwrap();
        assert_eq!(style.column_limit, 79);
    }
}
