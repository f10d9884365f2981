//! End-to-end comparisons through the public `compare` entry point.

use jsonschema_diff::{compare, ConfigBuilder, EngineConfig, Operation};
use serde_json::json;

#[test]
fn test_root_type_replaced() {
    let report = compare(
        &json!({"type": "string"}),
        &json!({"type": "integer"}),
        &EngineConfig::default(),
    );
    assert_eq!(report.lines(), vec![r#"r .type: "string" -> "integer""#]);
    assert_eq!(report.groups.len(), 1);
}

#[test]
fn test_type_and_format_combined_with_added_minimum() {
    let report = compare(
        &json!({"type": "string", "format": "email"}),
        &json!({"type": "integer", "minimum": 0}),
        &EngineConfig::default(),
    );
    assert_eq!(
        report.lines(),
        vec![r#"r .type: "string/email" -> "integer""#, "+ .minimum: 0"]
    );
    assert_eq!(report.groups.len(), 2);
}

#[test]
fn test_range_combined_on_change() {
    let report = compare(
        &json!({"properties": {"age": {"minimum": 0, "maximum": 120}}}),
        &json!({"properties": {"age": {"minimum": 18, "maximum": 65}}}),
        &EngineConfig::default(),
    );
    assert_eq!(report.lines(), vec![r#"r ["age"].range: "0-120" -> "18-65""#]);
}

#[test]
fn test_property_removed_wholesale() {
    let report = compare(
        &json!({"properties": {
            "name": {"type": "string"},
            "email": {"type": "string", "format": "email"}
        }}),
        &json!({"properties": {"name": {"type": "string"}}}),
        &EngineConfig::default(),
    );
    assert_eq!(
        report.lines(),
        vec![r#"- ["email"]: {"type":"string","format":"email"}"#]
    );
    assert_eq!(report.stats.removed, 1);
}

#[test]
fn test_context_with_and_without_combination() {
    let old = json!({"type": "string", "format": "email"});
    let new = json!({"type": "integer", "format": "email"});

    let report = compare(&old, &new, &EngineConfig::default());
    assert_eq!(
        report.lines(),
        vec![r#"r .type: "string/email" -> "integer/email""#]
    );

    let config = ConfigBuilder::new()
        .builtin_combinations(false)
        .build()
        .unwrap();
    let report = compare(&old, &new, &config);
    assert_eq!(
        report.lines(),
        vec![r#"r .type: "string" -> "integer""#, r#"  .format: "email""#]
    );
    assert_eq!(report.stats.changed, 1);
    assert_eq!(report.stats.context, 1);
}

#[test]
fn test_full_document() {
    let old = json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "format": "uuid"},
            "age": {"type": "integer", "minimum": 0, "maximum": 120},
            "email": {"type": "string", "format": "email"},
            "role": {"enum": ["admin", "user"]}
        },
        "required": ["id", "email"]
    });
    let new = json!({
        "type": "object",
        "properties": {
            "id": {"type": "integer", "format": "uuid"},
            "age": {"type": "integer", "minimum": 18, "maximum": 65},
            "role": {"enum": ["admin", "user", "guest"]}
        },
        "required": ["id", "name"]
    });
    let report = compare(&old, &new, &EngineConfig::default());
    assert_eq!(
        report.lines(),
        vec![
            r#"r ["id"].type: "string/uuid" -> "integer/uuid""#,
            r#"r ["age"].range: "0-120" -> "18-65""#,
            r#"- ["email"]: {"type":"string","format":"email"}"#,
            r#"m ["role"].enum:"#,
            r#"    "admin""#,
            r#"    "user""#,
            r#"+   "guest""#,
            "m .required:",
            r#"    "id""#,
            r#"-   "email""#,
            r#"+   "name""#,
        ]
    );
    assert_eq!(report.groups.len(), 5);
    assert_eq!(report.stats.total_changes(), 5);
}

#[test]
fn test_enum_change_pulls_in_type() {
    let report = compare(
        &json!({"type": "string", "enum": ["a"]}),
        &json!({"type": "string", "enum": ["a", "b"]}),
        &EngineConfig::default(),
    );
    assert_eq!(
        report.lines(),
        vec!["m .enum:", r#"    "a""#, r#"+   "b""#, r#"  .type: "string""#]
    );
}

#[test]
fn test_nested_definitions() {
    let report = compare(
        &json!({"$defs": {"address": {"properties": {"zip": {"type": "string", "pattern": "^[0-9]{5}$"}}}}}),
        &json!({"$defs": {"address": {"properties": {"zip": {"type": "string", "pattern": "^[0-9]{4}$"}}}}}),
        &EngineConfig::default(),
    );
    assert_eq!(
        report.lines(),
        vec![
            r#"r .$defs["address"]["zip"].pattern: "^[0-9]{5}$" -> "^[0-9]{4}$""#,
            r#"  .$defs["address"]["zip"].type: "string""#,
        ]
    );
}

#[test]
fn test_undefined_comparator_is_reported() {
    let config = ConfigBuilder::new()
        .default_comparator(false)
        .builtin_combinations(false)
        .build()
        .unwrap();
    let report = compare(
        &json!({"title": "Old", "minimum": 1}),
        &json!({"title": "New", "minimum": 2}),
        &config,
    );
    assert_eq!(
        report.lines(),
        vec![r#"? .title: "Old" -> "New""#, "r .minimum: 1 -> 2"]
    );
    assert!(!report.is_complete());
    assert!(report.has_differences());
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].keyword, "title");
    assert_eq!(report.stats.undefined, 1);
}

#[test]
fn test_ignore_filter_drops_changes() {
    let config = ConfigBuilder::new().ignore("**.description").build().unwrap();
    let report = compare(
        &json!({"properties": {"a": {"description": "x", "type": "string"}}}),
        &json!({"properties": {"a": {"description": "y", "type": "integer"}}}),
        &config,
    );
    let changes: Vec<_> = report.changes().collect();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].operation, Operation::Changed);
    assert_eq!(changes[0].display_path(), r#"["a"].type"#);
}

#[test]
fn test_tiny_and_huge_number_changes_are_reported() {
    let report = compare(
        &json!({"multipleOf": 1e-11}),
        &json!({"multipleOf": 2e-11}),
        &EngineConfig::default(),
    );
    assert!(report.has_differences());
    assert_eq!(report.lines(), vec!["r .multipleOf: 1e-11 -> 2e-11"]);

    let old: serde_json::Value = serde_json::from_str(r#"{"const": 9007199254740993}"#).unwrap();
    let new: serde_json::Value = serde_json::from_str(r#"{"const": 9007199254740992}"#).unwrap();
    let report = compare(&old, &new, &EngineConfig::default());
    assert!(report.has_differences());
    assert_eq!(report.stats.changed, 1);
}
