//! pyprettier - Auto-formatter for Python source code

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glob::Pattern;
use pyprettier::process::{format_bytes, parse_line_ranges, FormatResult};
use pyprettier::{parse_args, CliArgs, Result, Style};
use rayon::prelude::*;
use similar::TextDiff;
use walkdir::WalkDir;

/// Python file extensions to process
const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Ignore file holding glob patterns of paths to skip
const IGNORE_FILE_NAME: &str = ".pyprettierignore";

/// Default maximum file size in bytes (100 MB)
/// Files larger than this are skipped to prevent memory exhaustion
const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// What happened to one file.
struct FileOutcome {
    path: PathBuf,
    result: Result<Option<FormatResult>>,
}

fn main() -> ExitCode {
    let args = parse_args();

    let use_stdin =
        args.inputs.is_empty() || (args.inputs.len() == 1 && args.inputs[0].as_os_str() == "-");

    if args.inputs.is_empty() && io::stdin().is_terminal() {
        let mut cli = pyprettier::build_cli();
        let _ = cli.print_help();
        return ExitCode::SUCCESS;
    }

    let line_ranges = match parse_line_ranges(&args.lines) {
        Ok(ranges) if ranges.is_empty() => None,
        Ok(ranges) => Some(ranges),
        Err(e) => {
            eprintln!("pyprettier: {e}");
            return ExitCode::from(2);
        }
    };

    if use_stdin {
        return match process_stdin(&args, line_ranges.as_ref()) {
            Ok(changed) => exit_code(&args, changed, false),
            Err(e) => {
                eprintln!("pyprettier: {e}");
                ExitCode::from(2)
            }
        };
    }

    // An explicit --style applies to every file; otherwise each file
    // discovers its own config from its parent directories.
    let base_style = match args.style.as_deref().map(Style::from_arg) {
        None => None,
        Some(Ok(style)) => Some(style),
        Some(Err(e)) => {
            eprintln!("pyprettier: {e}");
            return ExitCode::from(2);
        }
    };

    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                eprintln!("Warning: failed to configure thread pool: {e}");
            }
        }
    }

    let files = collect_files(&args);
    if files.is_empty() {
        if !args.quiet {
            eprintln!("No Python files found to format.");
        }
        return ExitCode::SUCCESS;
    }

    // Format in parallel; report in input order so aggregate output (diffs)
    // is deterministic.
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| FileOutcome {
            path: path.clone(),
            result: process_single_file(path, base_style.as_ref(), &args, line_ranges.as_ref()),
        })
        .collect();

    let mut any_changed = false;
    let mut any_failed = false;
    for outcome in outcomes {
        match outcome.result {
            Ok(Some(result)) => {
                any_changed |= result.changed;
                report_file(&outcome.path, &result, &args);
            }
            Ok(None) => {}
            Err(e) => {
                any_failed = true;
                eprintln!("Error formatting {}: {e}", outcome.path.display());
            }
        }
    }

    exit_code(&args, any_changed, any_failed)
}

fn exit_code(args: &CliArgs, any_changed: bool, any_failed: bool) -> ExitCode {
    if any_failed {
        ExitCode::from(2)
    } else if (args.diff || args.check) && any_changed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve the style for one file: explicit style, or discovery from the
/// file's parent directories.
fn style_for(path: &Path, base_style: Option<&Style>, debug: bool) -> Result<Style> {
    if let Some(style) = base_style {
        return Ok(style.clone());
    }
    if debug {
        let discovered = Style::discover_config_files(path);
        if discovered.is_empty() {
            eprintln!("[DEBUG] No config files discovered for: {}", path.display());
        } else {
            eprintln!("[DEBUG] Discovered config files for {}:", path.display());
            for file in &discovered {
                eprintln!("[DEBUG]   - {}", file.display());
            }
        }
    }
    Style::from_discovered_files(path)
}

/// Load glob patterns from the exclude flags plus the ignore file.
fn exclude_patterns(args: &CliArgs) -> Vec<Pattern> {
    let mut patterns: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let ignore_path = Path::new(IGNORE_FILE_NAME);
    if let Ok(contents) = std::fs::read_to_string(ignore_path) {
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Ok(pattern) = Pattern::new(trimmed) {
                patterns.push(pattern);
            }
        }
    }
    patterns
}

/// Collect all files to process, handling directories and the recursive flag
fn collect_files(args: &CliArgs) -> Vec<PathBuf> {
    let patterns = exclude_patterns(args);
    let mut files = Vec::new();

    for input in &args.inputs {
        if input.is_file() {
            if !is_excluded(input, &patterns) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            if args.recursive {
                // Excluded directories are pruned before descent.
                let walker = WalkDir::new(input)
                    .follow_links(true)
                    .max_depth(256)
                    .into_iter()
                    .filter_entry(|entry| !is_excluded(entry.path(), &patterns));
                for entry in walker.filter_map(std::result::Result::ok) {
                    let path = entry.path();
                    if path.is_file() && is_python_file(path) {
                        files.push(path.to_path_buf());
                    }
                }
            } else if let Ok(entries) = std::fs::read_dir(input) {
                for entry in entries.filter_map(std::result::Result::ok) {
                    let path = entry.path();
                    if path.is_file() && is_python_file(&path) && !is_excluded(&path, &patterns) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        // Match against full path
        if pattern.matches(&path_str) {
            return true;
        }

        // Match against file name only
        if let Some(file_name) = path.file_name() {
            if pattern.matches(&file_name.to_string_lossy()) {
                return true;
            }
        }

        // Match against each path component (for directory patterns)
        for component in path.components() {
            if let std::path::Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}

fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Format one file. Returns None when the file was skipped.
fn process_single_file(
    path: &PathBuf,
    base_style: Option<&Style>,
    args: &CliArgs,
    line_ranges: Option<&BTreeSet<usize>>,
) -> Result<Option<FormatResult>> {
    // Check file size BEFORE reading to prevent memory exhaustion
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > DEFAULT_MAX_FILE_SIZE {
        if !args.quiet {
            eprintln!(
                "Skipping {} ({} MB exceeds limit of {} MB)",
                path.display(),
                metadata.len() / (1024 * 1024),
                DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
            );
        }
        return Ok(None);
    }

    let style = style_for(path, base_style, args.debug)?;
    let contents = std::fs::read(path)?;
    let result = format_bytes(&contents, &style, line_ranges)?;

    if args.in_place && result.changed {
        // Never rewrite a file that has not changed.
        std::fs::write(path, result.text.as_bytes())?;
    }
    Ok(Some(result))
}

/// Print the per-file output for the selected mode.
fn report_file(path: &Path, result: &FormatResult, args: &CliArgs) {
    if args.check {
        if result.changed && !args.quiet {
            eprintln!("would reformat {}", path.display());
        }
        return;
    }
    if args.diff {
        if result.changed {
            print_diff(path, result);
        }
        return;
    }
    if args.in_place {
        if result.changed && !args.quiet {
            eprintln!("reformatted {}", path.display());
        }
        return;
    }
    // Default mode: formatted source to stdout.
    let _ = io::stdout().write_all(result.text.as_bytes());
}

/// Unified diff of the original file against the formatted text.
fn print_diff(path: &Path, result: &FormatResult) {
    let Ok(original) = std::fs::read_to_string(path) else {
        return;
    };
    let diff = TextDiff::from_lines(original.as_str(), result.text.as_str());
    let name = path.display().to_string();
    print!(
        "{}",
        diff.unified_diff()
            .context_radius(3)
            .header(&format!("{name} (original)"), &format!("{name} (reformatted)"))
    );
}

/// Format stdin to stdout. Returns whether the input changed.
fn process_stdin(args: &CliArgs, line_ranges: Option<&BTreeSet<usize>>) -> Result<bool> {
    let mut contents = Vec::new();
    io::stdin().read_to_end(&mut contents)?;

    if contents.len() as u64 > DEFAULT_MAX_FILE_SIZE {
        anyhow::bail!(
            "stdin input too large ({} MB exceeds limit of {} MB)",
            contents.len() as u64 / (1024 * 1024),
            DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
        );
    }

    let style = match args.style.as_deref() {
        Some(arg) => Style::from_arg(arg)?,
        None => Style::from_discovered_files(&std::env::current_dir().unwrap_or_default())?,
    };

    let result = format_bytes(&contents, &style, line_ranges)?;
    if args.check {
        return Ok(result.changed);
    }
    if args.diff {
        if result.changed {
            let original = String::from_utf8_lossy(&contents).to_string();
            let diff = TextDiff::from_lines(original.as_str(), result.text.as_str());
            print!(
                "{}",
                diff.unified_diff()
                    .context_radius(3)
                    .header("stdin (original)", "stdin (reformatted)")
            );
        }
        return Ok(result.changed);
    }
    io::stdout().write_all(result.text.as_bytes())?;
    Ok(result.changed)
}
