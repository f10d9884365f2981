use jsonschema_diff::{
    compare, format_report, ConfigBuilder, EngineConfig, OutputFormat, OutputOptions,
};
use serde_json::{json, Value};

fn render(old: Value, new: Value, options: &OutputOptions) -> String {
    let report = compare(&old, &new, &EngineConfig::default());
    format_report(&report, &OutputFormat::Plain, options).unwrap()
}

#[test]
fn test_plain_summary_counts_real_changes_only() {
    let output = render(
        json!({"type": "string", "pattern": "^a"}),
        json!({"type": "string", "pattern": "^b"}),
        &OutputOptions::default(),
    );
    assert_eq!(
        output,
        "r .pattern: \"^a\" -> \"^b\"\n  .type: \"string\"\n\nSummary: 1 changed"
    );
}

#[test]
fn test_summary_disabled() {
    let options = OutputOptions {
        summary: false,
        legend: false,
    };
    let output = render(json!({"minimum": 1}), json!({}), &options);
    assert_eq!(output, "- .minimum: 1");
}

#[test]
fn test_legend_absent_without_dispatch() {
    let options = OutputOptions {
        summary: false,
        legend: true,
    };
    // Wholesale removal never reaches a comparator.
    let output = render(
        json!({"properties": {"a": {"type": "string"}}}),
        json!({"properties": {}}),
        &options,
    );
    assert!(!output.contains("Legend"));
}

#[test]
fn test_indent_width_applies_to_elements() {
    let config = ConfigBuilder::new().indent(4).build().unwrap();
    let report = compare(&json!({"required": ["a"]}), &json!({"required": []}), &config);
    assert_eq!(report.lines(), vec!["m .required:", "-     \"a\""]);
}

#[test]
fn test_undefined_lines_in_json_output() {
    let config = ConfigBuilder::new()
        .builtin_comparators(false)
        .default_comparator(false)
        .builtin_combinations(false)
        .build()
        .unwrap();
    let report = compare(&json!({"title": "a"}), &json!({}), &config);
    let output = format_report(&report, &OutputFormat::Json, &OutputOptions::default()).unwrap();
    let parsed: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["nodes"][0]["operation"], "undefined");
    assert_eq!(parsed["groups"][0]["lines"][0]["status"], "?");
    assert_eq!(parsed["diagnostics"][0]["keyword"], "title");
    assert_eq!(parsed["diagnostics"][0]["old_type"], "string");
    assert!(parsed["diagnostics"][0]["new_type"].is_null());
}
