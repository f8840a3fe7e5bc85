//! Command-line interface for pyprettier.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to format (`-` reads from stdin)
    pub inputs: Vec<PathBuf>,

    /// Rewrite files in place
    pub in_place: bool,

    /// Print a unified diff instead of the formatted source
    pub diff: bool,

    /// Print nothing; exit nonzero when any file would change
    pub check: bool,

    /// Process directories recursively
    pub recursive: bool,

    /// Glob patterns of files and directories to skip
    pub exclude: Vec<String>,

    /// Line ranges to restrict formatting to (`START-END`)
    pub lines: Vec<String>,

    /// Style name (`pep8`, `google`) or path to a TOML style file
    pub style: Option<String>,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Suppress informational output
    pub quiet: bool,

    /// Enable debug output
    pub debug: bool,
}

/// Build the clap command definition
#[must_use]
pub fn build_cli() -> Command {
    Command::new("pyprettier")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Auto-formatter for Python source code")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to format ('-' for stdin)")
                .num_args(0..)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("in-place")
                .short('i')
                .long("in-place")
                .help("Rewrite files in place")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["diff", "check"]),
        )
        .arg(
            Arg::new("diff")
                .short('d')
                .long("diff")
                .help("Print a unified diff for each changed file")
                .action(ArgAction::SetTrue)
                .conflicts_with("check"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Exit nonzero if any file would be reformatted")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Process directories recursively")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/dirs matching pattern (repeatable)")
                .action(ArgAction::Append)
                .value_name("PATTERN"),
        )
        .arg(
            Arg::new("lines")
                .short('l')
                .long("lines")
                .help("Format only these lines, e.g. 5-20 (repeatable)")
                .action(ArgAction::Append)
                .value_name("START-END"),
        )
        .arg(
            Arg::new("style")
                .long("style")
                .help("Style name (pep8, google) or a pyprettier.toml path")
                .value_name("STYLE"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Parallel jobs (0=auto, 1=sequential)")
                .value_parser(clap::value_parser!(usize))
                .value_name("NUM"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress informational output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from the process environment
#[must_use]
pub fn parse_args() -> CliArgs {
    parse_args_from(std::env::args_os())
}

/// Parse CLI arguments from an explicit iterator (used by tests)
pub fn parse_args_from<I, T>(iter: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_cli().get_matches_from(iter);

    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        in_place: matches.get_flag("in-place"),
        diff: matches.get_flag("diff"),
        check: matches.get_flag("check"),
        recursive: matches.get_flag("recursive"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        lines: matches
            .get_many::<String>("lines")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        style: matches.get_one::<String>("style").cloned(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        quiet: matches.get_flag("quiet"),
        debug: matches.get_flag("debug"),
    }
}
