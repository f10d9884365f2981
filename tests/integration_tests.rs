//! Integration tests for the jsonschema-diff CLI.
//!
//! These tests run the binary end to end: argument parsing, schema loading,
//! rendering and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Helper to create a Command for the jsonschema-diff binary
fn schema_diff() -> Command {
    let mut cmd = Command::cargo_bin("jsonschema-diff").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

const USER_DIFF: &str = r#"r ["id"].type: "string/uuid" -> "integer/uuid"

r ["age"].range: "0-120" -> "18-65"

- ["email"]: {"type":"string","format":"email"}

m ["role"].enum:
    "admin"
    "user"
+   "guest"

m .required:
    "id"
-   "email"
+   "name"

Summary: 1 removed, 2 changed, 2 modified
"#;

#[test]
fn test_full_plain_output() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "plain"])
        .assert()
        .success()
        .code(0)
        .stdout(USER_DIFF);
}

#[test]
fn test_yaml_and_json_inputs_agree() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.yaml"])
        .args(["--format", "plain"])
        .assert()
        .code(0)
        .stdout(USER_DIFF);
}

#[test]
fn test_reordered_schema_has_no_changes() {
    schema_diff()
        .args([
            "tests/fixtures/user_v1.json",
            "tests/fixtures/user_v1_reordered.json",
        ])
        .args(["--format", "plain", "--exit-code"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No changes detected."));
}

#[test]
fn test_exit_code_flag() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "plain", "--exit-code"])
        .assert()
        .code(1);
}

#[test]
fn test_literal_json_arguments() {
    schema_diff()
        .args([r#"{"type":"string"}"#, r#"{"type":"integer"}"#, "--no-color"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains(r#"r .type: "string" -> "integer""#))
        .stdout(predicate::str::contains("Summary: 1 changed"));
}

#[test]
fn test_schema_file_from_tempdir() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"type": "string", "maxLength": 10}}"#).unwrap();
    let path = file.path().to_string_lossy().to_string();

    schema_diff()
        .args([path.as_str(), r#"{"type":"string","maxLength":20}"#])
        .args(["--format", "plain", "--quiet"])
        .assert()
        .code(0)
        .stdout("r .maxLength: 10 -> 20\n");
}

#[test]
fn test_file_not_found_exit_2() {
    schema_diff()
        .args(["tests/fixtures/nonexistent.json", "tests/fixtures/user_v1.json"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_invalid_json_exit_2() {
    schema_diff()
        .args(["tests/fixtures/invalid.json", "tests/fixtures/user_v1.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid JSON"));
}

#[test]
fn test_invalid_literal_exit_2() {
    schema_diff()
        .args(["{broken", r#"{"type":"string"}"#])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("neither an existing file nor valid JSON"));
}

#[test]
fn test_zero_indent_rejected() {
    schema_diff()
        .args([r#"{}"#, r#"{}"#, "--indent", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Indent width"));
}

#[test]
fn test_no_combine_and_context() {
    schema_diff()
        .args([
            r#"{"type":"string","format":"email"}"#,
            r#"{"type":"integer","format":"email"}"#,
        ])
        .args(["--format", "plain", "--quiet", "--no-combine"])
        .assert()
        .stdout("r .type: \"string\" -> \"integer\"\n  .format: \"email\"\n");

    schema_diff()
        .args([
            r#"{"type":"string","format":"email"}"#,
            r#"{"type":"integer","format":"email"}"#,
        ])
        .args(["--format", "plain", "--quiet", "--no-combine", "--no-context"])
        .assert()
        .stdout("r .type: \"string\" -> \"integer\"\n");
}

#[test]
fn test_ignore_and_only() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "plain", "--quiet", "--only", "age"])
        .assert()
        .stdout("r [\"age\"].range: \"0-120\" -> \"18-65\"\n");

    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "plain", "--ignore", "required", "--ignore", "role"])
        .assert()
        .stdout(predicate::str::contains("required").not())
        .stdout(predicate::str::contains("guest").not())
        .stdout(predicate::str::contains("Summary: 1 removed, 2 changed"));
}

#[test]
fn test_legend_flag() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "plain", "--legend"])
        .assert()
        .stdout(predicate::str::contains("Legend:"))
        .stdout(predicate::str::contains("range"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_expand_flag() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "plain", "--expand"])
        .assert()
        .stdout(predicate::str::contains("- [\"email\"]:\n-   .type: \"string\"\n-   .format: \"email\""));
}

#[test]
fn test_json_output_format() {
    let output = schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stats"]["removed"], 1);
    assert_eq!(report["stats"]["modified"], 2);
    assert_eq!(report["nodes"][0]["keyword"], "type");
    assert_eq!(report["nodes"][0]["absorbed"], serde_json::json!(["type", "format"]));
    assert!(report["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn test_verbose_flag() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v1.json"])
        .args(["--format", "plain", "--verbose"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Parsing"))
        .stderr(predicate::str::contains("Computing diff"));
}

#[test]
fn test_quiet_flag() {
    schema_diff()
        .args(["tests/fixtures/user_v1.json", "tests/fixtures/user_v2.json"])
        .args(["--format", "plain", "--quiet"])
        .assert()
        .stdout(predicate::str::contains("Summary").not());
}
