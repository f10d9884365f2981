//! jsonschema-diff - semantic diff for JSON Schema documents.
//!
//! Two schemas are walked side by side. Each differing keyword is compared
//! with a strategy picked by a precedence search over (keyword, old type, new
//! type) rules, related keywords are merged into single display units, and
//! unchanged keywords that explain a change are attached as context. The
//! result is a list of prefixed, human-readable lines.
//!
//! # Example
//!
//! ```
//! use jsonschema_diff::{compare, format_report, EngineConfig, OutputFormat, OutputOptions};
//! use serde_json::json;
//!
//! let old = json!({"properties": {"age": {"minimum": 0, "maximum": 120}}});
//! let new = json!({"properties": {"age": {"minimum": 18, "maximum": 65}}});
//!
//! let report = compare(&old, &new, &EngineConfig::default());
//! assert_eq!(report.lines(), vec![r#"r ["age"].range: "0-120" -> "18-65""#]);
//!
//! let output = format_report(&report, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
//! println!("{}", output);
//! ```

pub mod combine;
pub mod compare;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod filter;
pub mod output;
pub mod parser;
pub mod path;
pub mod tree;
pub mod walker;

// Re-export commonly used types for convenience
pub use combine::{CombinationRule, CombineMode, CombinePolicy, Interval, ValueFormat};
pub use compare::{ComparatorRegistry, ComparisonRule, StrategyKind, Tier};
pub use config::{ConfigBuilder, EngineConfig, FormatOptions};
pub use context::ContextRule;
pub use diff::{compare, Diagnostic, DiffNode, DiffStats, ElementDiff, Operation, Report};
pub use error::{ConfigError, OutputError, ParseError, SchemaDiffError};
pub use filter::FilterConfig;
pub use output::{format_report, OutputFormat, OutputOptions, RenderGroup, RenderLine};
pub use parser::{load_schema, parse_file, parse_json, parse_toml, parse_yaml};
pub use path::{Path, Step};
pub use tree::JsonType;
