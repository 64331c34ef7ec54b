//! tdoc command line
//!
//! `tdoc validate` runs the static checks over a file or directory; `tdoc debug`
//! inspects an application statically or runs it under instrumentation. Both return
//! whether the target passed, which the binary turns into the exit status.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use tdoc_core::report::light_rule;
use tdoc_debug::{
    analyze_file, emit, DebugConfig, DebugReport, DebugSession, Debugger, ProcessHost,
};
use tdoc_validate::scan::{collect_files, validate_all};
use tdoc_validate::{ScanOptions, ScanSummary, ValidateOptions, Validator};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "TDOC_LOG";

/// Command-line definition
#[must_use]
pub fn cli() -> Command {
    Command::new("tdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validate and debug Textual TUI applications")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("validate")
                .about("Check application sources for structural, widget, style and handler issues")
                .arg(Arg::new("file").value_parser(value_parser!(PathBuf)).help("File to validate"))
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory to scan for Python files"),
                )
                .group(ArgGroup::new("target").args(["file", "dir"]).required(true))
                .arg(
                    Arg::new("recursive")
                        .long("recursive")
                        .action(ArgAction::SetTrue)
                        .requires("dir")
                        .help("Scan directory recursively"),
                )
                .arg(
                    Arg::new("fix")
                        .long("fix")
                        .action(ArgAction::SetTrue)
                        .help("Attempt to fix issues automatically"),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .action(ArgAction::SetTrue)
                        .help("Enable verbose output"),
                )
                .arg(
                    Arg::new("pattern")
                        .long("pattern")
                        .default_value("*.py")
                        .help("File pattern to match"),
                ),
        )
        .subcommand(
            Command::new("debug")
                .about("Inspect widgets, trace events and profile an application")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to Textual application file"),
                )
                .arg(flag("inspect", "Inspect widget tree"))
                .arg(flag("events", "Trace event handlers"))
                .arg(flag("layout", "Analyze layout structure"))
                .arg(flag("profile", "Profile performance"))
                .arg(flag("live", "Run the application under instrumentation"))
                .arg(flag("analyze", "Full analysis mode (inspect, layout, verbose)"))
                .arg(flag("verbose", "Enable verbose output"))
                .arg(flag("validate", "Print the validation report first"))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Also write the report to this file"),
                )
                .arg(
                    Arg::new("log")
                        .long("log")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the report to this file instead of stdout"),
                )
                .arg(
                    Arg::new("iterations")
                        .long("iterations")
                        .default_value("1")
                        .value_parser(value_parser!(usize))
                        .help("Number of runs when profiling"),
                ),
        )
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

/// Install the stderr log subscriber
///
/// The filter comes from `TDOC_LOG`; otherwise `info`, or `debug` when verbose.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run `validate`; `Ok(true)` when every file passed
///
/// # Errors
/// Unreadable directory, invalid pattern, or a failed write to `out`.
pub fn validate(args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let options = ValidateOptions::default()
        .with_fix(args.get_flag("fix"))
        .with_verbose(args.get_flag("verbose"));
    let validator = Validator::new(options);

    let files = if let Some(file) = args.get_one::<PathBuf>("file") {
        vec![file.clone()]
    } else if let Some(dir) = args.get_one::<PathBuf>("dir") {
        let pattern = args
            .get_one::<String>("pattern")
            .map_or("*.py", String::as_str);
        let scan = ScanOptions::default()
            .with_pattern(pattern)
            .with_recursive(args.get_flag("recursive"));
        collect_files(dir, &scan).with_context(|| format!("cannot scan {}", dir.display()))?
    } else {
        bail!("must specify either a file or a directory to validate");
    };

    writeln!(out, "\nValidating {} file(s)...", files.len())?;
    let results = validate_all(&validator, &files);
    let total = results.len();
    for (i, result) in results.iter().enumerate() {
        writeln!(out, "\n[{}/{total}] Validating: {}", i + 1, result.path.display())?;
        write!(out, "{}", result.report())?;
    }

    let summary = ScanSummary::from_results(&results);
    write!(out, "\n{summary}")?;
    Ok(summary.all_passed())
}

/// Assemble the debugger configuration from `debug` flags and the environment
#[must_use]
pub fn debug_config(args: &ArgMatches) -> DebugConfig {
    let mut config = DebugConfig::new()
        .from_env()
        .with_trace_events(args.get_flag("events"))
        .with_trace_widgets(args.get_flag("inspect"))
        .with_trace_layout(args.get_flag("layout"))
        .with_profiling(args.get_flag("profile"))
        .with_verbose(args.get_flag("verbose"))
        .with_iterations(args.get_one::<usize>("iterations").copied().unwrap_or(1));
    if args.get_flag("analyze") {
        config = config.analyze();
    }
    if let Some(path) = args.get_one::<PathBuf>("log") {
        config = config.with_log_file(path);
    }
    if let Some(path) = args.get_one::<PathBuf>("output") {
        config = config.with_output_file(path);
    }
    config
}

/// Run `debug`; `Ok(true)` unless the application crashed
///
/// # Errors
/// Missing or unparsable file, or an unwritable report destination.
pub async fn debug(args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        bail!("no application file given");
    };
    if !path.is_file() {
        bail!("file not found: {}", path.display());
    }
    let config = debug_config(args);
    let display_name = file_name(path);

    writeln!(out, "\nTextual Debugger")?;
    writeln!(out, "Analyzing: {}", path.display())?;
    writeln!(out, "Options: {}", enabled_options(args).join(", "))?;
    writeln!(out, "{}\n", light_rule())?;

    if args.get_flag("validate") {
        let result = Validator::default().validate_file(path);
        write!(out, "{}", result.report())?;
    }

    let session = if args.get_flag("live") {
        let mut host = ProcessHost::new(path, &config);
        let session = Debugger::new(&config)
            .start(&mut host)
            .await
            .context("debug session failed")?;
        if session.crashed() && !host.diagnostics().is_empty() {
            tracing::debug!("application output:\n{}", host.diagnostics().join("\n"));
        }
        session
    } else {
        let analysis = analyze_file(path)?;
        let name = analysis
            .app_classes
            .first()
            .cloned()
            .unwrap_or_else(|| display_name.clone());
        DebugSession::from_static(name, analysis, &config)
    };

    let text = DebugReport::new(&display_name, &session, &config).generate_text();
    emit(&text, &config, out)?;
    Ok(!session.crashed())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn enabled_options(args: &ArgMatches) -> Vec<&'static str> {
    let mut options: Vec<&'static str> = [
        "inspect", "events", "layout", "profile", "live", "analyze", "verbose", "validate",
    ]
    .into_iter()
    .filter(|name| args.get_flag(name))
    .collect();
    if args.get_one::<PathBuf>("output").is_some() {
        options.push("output");
    }
    if args.get_one::<PathBuf>("log").is_some() {
        options.push("log");
    }
    if options.is_empty() {
        options.push("none");
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_needs_a_target() {
        assert!(cli().try_get_matches_from(["tdoc", "validate"]).is_err());
        assert!(cli()
            .try_get_matches_from(["tdoc", "validate", "app.py", "--dir", "src"])
            .is_err());
        assert!(cli()
            .try_get_matches_from(["tdoc", "validate", "app.py", "--recursive"])
            .is_err());
    }

    #[test]
    fn analyze_enables_tree_layout_verbose() {
        let matches = cli()
            .try_get_matches_from(["tdoc", "debug", "app.py", "--analyze", "--iterations", "0"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let config = debug_config(args);
        assert!(config.trace_widgets);
        assert!(config.trace_layout);
        assert!(config.verbose);
        assert_eq!(config.iterations, 1);
    }

    #[test]
    fn option_listing() {
        let matches = cli()
            .try_get_matches_from(["tdoc", "debug", "app.py", "--events", "--log", "d.log"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(enabled_options(args), vec!["events", "log"]);
    }
}
