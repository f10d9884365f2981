//! Rendering of comparison reports.
//!
//! The pipeline ends in [`build_groups`], which turns the ordered node list
//! into [`RenderGroup`]s of prefixed lines. [`format_report`] then lays the
//! groups out as plain text, colored terminal text or JSON.
//!
//! A group starts at every real change. Context entries for that change
//! follow it as their own lines; list and mapping elements of a modified
//! keyword follow as indented body lines:
//!
//! ```text
//! r .type: "string/email" -> "integer"
//!   .pattern: "^a"
//!
//! m .required:
//!     "id"
//! -   "name"
//! +   "email"
//! ```
//!
//! # Examples
//!
//! ```
//! use jsonschema_diff::{compare, format_report, EngineConfig, OutputFormat, OutputOptions};
//! use serde_json::json;
//!
//! let report = compare(&json!({"minimum": 1}), &json!({"minimum": 2}), &EngineConfig::default());
//! let output = format_report(&report, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
//! assert!(output.starts_with("r .minimum: 1 -> 2"));
//! ```

use crate::compare::StrategyKind;
use crate::config::FormatOptions;
use crate::diff::{DiffNode, DiffStats, ElementDiff, Operation, Report};
use crate::error::OutputError;
use crate::tree::to_compact;
use colored::*;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored terminal output with ANSI escape codes
    Terminal,
    /// JSON representation of the report
    Json,
    /// Plain text, no colors (suitable for piping)
    Plain,
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            "plain" | "text" => Ok(OutputFormat::Plain),
            _ => Err(OutputError::UnknownFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// What surrounds the rendered groups in text formats.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Append the `Summary:` line
    pub summary: bool,
    /// Append the comparator legend
    pub legend: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            summary: true,
            legend: false,
        }
    }
}

/// One output line: status prefix, indentation and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderLine {
    #[serde(serialize_with = "serialize_status")]
    pub status: char,
    pub indent: usize,
    pub text: String,
}

fn serialize_status<S: Serializer>(status: &char, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&status.to_string())
}

impl RenderLine {
    pub fn new(status: char, indent: usize, text: impl Into<String>) -> Self {
        Self {
            status,
            indent,
            text: text.into(),
        }
    }
}

impl fmt::Display for RenderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.status, " ".repeat(self.indent), self.text)
    }
}

/// Lines printed together, without blank lines between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderGroup {
    pub lines: Vec<RenderLine>,
}

/// Groups the final node list into printable lines.
pub fn build_groups(nodes: &[DiffNode], format: &FormatOptions) -> Vec<RenderGroup> {
    let mut groups: Vec<RenderGroup> = Vec::new();
    for node in nodes {
        if node.is_context() {
            let line = RenderLine::new(
                ' ',
                0,
                format!("{}: {}", location(node), side(node.old_value.as_ref())),
            );
            match groups.last_mut() {
                Some(group) => group.lines.push(line),
                None => groups.push(RenderGroup { lines: vec![line] }),
            }
        } else {
            groups.push(RenderGroup {
                lines: node_lines(node, format),
            });
        }
    }
    groups
}

fn location(node: &DiffNode) -> String {
    let rendered = node.display_path();
    if rendered.is_empty() {
        "(root)".to_string()
    } else {
        rendered
    }
}

fn side(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_string(), to_compact)
}

fn node_lines(node: &DiffNode, format: &FormatOptions) -> Vec<RenderLine> {
    let status = node.operation.symbol();
    let path = location(node);

    if node.operation == Operation::Modified {
        let mut lines = vec![RenderLine::new(status, 0, format!("{}:", path))];
        lines.extend(
            node.elements
                .iter()
                .map(|e| RenderLine::new(e.operation.symbol(), format.indent, element_text(e))),
        );
        return lines;
    }

    if format.expand_composites && node.is_composite {
        let value = match node.operation {
            Operation::Added => node.new_value.as_ref(),
            Operation::Removed => node.old_value.as_ref(),
            _ => None,
        };
        if let Some(value) = value {
            let mut lines = vec![RenderLine::new(status, 0, format!("{}:", path))];
            lines.extend(composite_body(value).into_iter().map(|text| RenderLine::new(status, format.indent, text)));
            return lines;
        }
    }

    let text = match node.operation {
        Operation::Added => format!("{}: {}", path, side(node.new_value.as_ref())),
        Operation::Removed | Operation::Unchanged => {
            format!("{}: {}", path, side(node.old_value.as_ref()))
        }
        _ => format!(
            "{}: {} -> {}",
            path,
            side(node.old_value.as_ref()),
            side(node.new_value.as_ref())
        ),
    };
    vec![RenderLine::new(status, 0, text)]
}

fn element_text(element: &ElementDiff) -> String {
    let value = match element.operation {
        Operation::Changed => format!(
            "{} -> {}",
            side(element.old_value.as_ref()),
            side(element.new_value.as_ref())
        ),
        Operation::Added => side(element.new_value.as_ref()),
        _ => side(element.old_value.as_ref()),
    };
    match &element.key {
        Some(key) => format!("{}: {}", Value::from(key.as_str()), value),
        None => value,
    }
}

fn composite_body(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!(".{}: {}", k, to_compact(v)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| format!("[{}]: {}", i, to_compact(v)))
            .collect(),
        other => vec![to_compact(other)],
    }
}

/// Formats a report according to the specified format and options.
///
/// # Arguments
///
/// * `report` - The comparison result
/// * `format` - The output format (Terminal, JSON, or Plain)
/// * `options` - Summary and legend toggles for the text formats
///
/// # Returns
///
/// Returns the formatted string on success, or an OutputError on failure.
pub fn format_report(
    report: &Report,
    format: &OutputFormat,
    options: &OutputOptions,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Terminal => Ok(format_text(report, options, true)),
        OutputFormat::Json => format_json(report),
        OutputFormat::Plain => Ok(format_text(report, options, false)),
    }
}

fn format_text(report: &Report, options: &OutputOptions, colored: bool) -> String {
    if report.groups.is_empty() {
        let message = "No changes detected.";
        return if colored {
            message.dimmed().to_string()
        } else {
            message.to_string()
        };
    }

    let mut sections: Vec<String> = report
        .groups
        .iter()
        .map(|group| {
            group
                .lines
                .iter()
                .map(|line| {
                    if colored {
                        colorize(line)
                    } else {
                        line.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    if options.summary {
        sections.push(format_summary(&report.stats));
    }
    if options.legend && !report.strategies_used.is_empty() {
        sections.push(format_legend(&report.strategies_used));
    }
    sections.join("\n\n")
}

/// Colors a whole line by its status prefix.
fn colorize(line: &RenderLine) -> String {
    let text = line.to_string();
    match line.status {
        '+' => text.green().to_string(),
        '-' => text.red().to_string(),
        'r' => text.cyan().to_string(),
        'm' => text.yellow().to_string(),
        '?' => text.magenta().bold().to_string(),
        _ => text.dimmed().to_string(),
    }
}

fn format_json(report: &Report) -> Result<String, OutputError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| OutputError::JsonSerializationError { source: e })
}

/// Formats summary statistics.
fn format_summary(stats: &DiffStats) -> String {
    if stats.is_empty() {
        return "Summary: No changes".to_string();
    }

    let parts: Vec<String> = [
        (stats.added, "added"),
        (stats.removed, "removed"),
        (stats.changed, "changed"),
        (stats.modified, "modified"),
        (stats.undefined, "undefined"),
    ]
    .iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{} {}", count, label))
    .collect();

    format!("Summary: {}", parts.join(", "))
}

/// One line per dispatched strategy.
fn format_legend(strategies: &[StrategyKind]) -> String {
    let mut out = String::from("Legend:");
    for strategy in strategies {
        out.push_str(&format!("\n  {:<8} {}", strategy.name(), strategy.description()));
    }
    out
}
