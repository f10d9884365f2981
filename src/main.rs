//! jsonschema-diff command-line interface.
//!
//! Loads two schemas (file paths or literal JSON), builds the engine
//! configuration from flags, runs the comparison and prints the rendered
//! groups.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jsonschema_diff::{
    compare, format_report, load_schema, ConfigBuilder, OutputFormat, OutputOptions,
};
use std::process;
use tracing_subscriber::EnvFilter;

/// jsonschema-diff - Semantic diff for JSON Schema documents
///
/// Shows what changed between two schemas keyword by keyword, merging
/// related keywords and adding the unchanged keywords needed to read each
/// change.
#[derive(Parser)]
#[command(name = "jsonschema-diff")]
#[command(version)]
#[command(about = "Semantic diff for JSON Schema documents", long_about = None)]
struct Cli {
    /// Old schema: a file path or a literal JSON document
    #[arg(value_name = "OLD")]
    old: String,

    /// New schema: a file path or a literal JSON document
    #[arg(value_name = "NEW")]
    new: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "terminal")]
    format: OutputFormatArg,

    /// Disable colors in terminal output
    #[arg(long)]
    no_color: bool,

    /// Print the comparator legend after the diff
    #[arg(long)]
    legend: bool,

    /// Exit with code 1 when differences are found
    #[arg(long)]
    exit_code: bool,

    /// Show added or removed subschemas one keyword per line
    #[arg(long)]
    expand: bool,

    /// Indent width of nested lines
    #[arg(long, default_value = "2")]
    indent: usize,

    /// Hide changes under this path pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Show only changes under this path pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    only: Vec<String>,

    /// Disable built-in keyword combinations
    #[arg(long)]
    no_combine: bool,

    /// Disable built-in context rules
    #[arg(long)]
    no_context: bool,

    /// Verbose output (show progress and debug logs)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (only show changes, suppress summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Output format argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormatArg {
    /// Colored terminal output
    Terminal,
    /// JSON representation
    Json,
    /// Plain text (no colors)
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Terminal => OutputFormat::Terminal,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    if cli.verbose {
        eprintln!("Parsing {}...", cli.old);
    }
    let old = load_schema(&cli.old).context("Failed to load old schema")?;

    if cli.verbose {
        eprintln!("Parsing {}...", cli.new);
    }
    let new = load_schema(&cli.new).context("Failed to load new schema")?;

    let mut builder = ConfigBuilder::new()
        .builtin_combinations(!cli.no_combine)
        .builtin_context(!cli.no_context)
        .indent(cli.indent)
        .expand_composites(cli.expand);
    for pattern in &cli.ignore {
        builder = builder.ignore(pattern);
    }
    for pattern in &cli.only {
        builder = builder.only(pattern);
    }
    let config = builder.build().context("Invalid configuration")?;

    if cli.verbose {
        eprintln!("Computing diff...");
    }
    let report = compare(&old, &new, &config);

    if cli.no_color {
        colored::control::set_override(false);
    }
    let output_options = OutputOptions {
        summary: !cli.quiet,
        legend: cli.legend,
    };
    let output_format: OutputFormat = cli.format.into();
    let output = format_report(&report, &output_format, &output_options)
        .context("Failed to format diff output")?;
    println!("{}", output);

    if cli.exit_code && report.has_differences() {
        Ok(1)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(
            OutputFormat::from(OutputFormatArg::Terminal),
            OutputFormat::Terminal
        );
        assert_eq!(OutputFormat::from(OutputFormatArg::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(OutputFormatArg::Plain), OutputFormat::Plain);
    }

    #[test]
    fn test_cli_parses_repeatable_patterns() {
        let cli = Cli::try_parse_from([
            "jsonschema-diff",
            "old.json",
            "new.json",
            "--ignore",
            "**.description",
            "--ignore",
            "title",
            "--only",
            "user",
        ])
        .unwrap();
        assert_eq!(cli.ignore, vec!["**.description", "title"]);
        assert_eq!(cli.only, vec!["user"]);
        assert_eq!(cli.indent, 2);
    }
}
