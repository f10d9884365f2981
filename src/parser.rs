//! Loading schema documents.
//!
//! Schemas are read into `serde_json::Value` with document key order kept.
//! JSON, YAML and TOML files are supported; the format is detected by file
//! extension, and files with an unknown extension are tried as JSON then
//! YAML. A CLI argument that is not an existing file is parsed as a literal
//! JSON document.
//!
//! # Examples
//!
//! ```
//! use jsonschema_diff::parser::load_schema;
//!
//! let schema = load_schema(r#"{"type": "string"}"#).unwrap();
//! assert_eq!(schema["type"], "string");
//! ```

use crate::error::ParseError;
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;

/// Parses a schema file.
///
/// # Errors
///
/// This function will return an error if:
/// - The file does not exist (`ParseError::FileNotFound`)
/// - The file cannot be read (`ParseError::ReadError`)
/// - The content is invalid for its detected format
/// - The extension is unknown and the content is neither JSON nor YAML
///   (`ParseError::UnknownFormat`)
pub fn parse_file(path: &Path) -> Result<Value, ParseError> {
    let name = path.to_string_lossy().to_string();
    if !path.exists() {
        return Err(ParseError::file_not_found(name));
    }

    let content = fs::read_to_string(path).map_err(|e| ParseError::read_error(&name, e))?;
    tracing::debug!(path = %name, bytes = content.len(), "read schema file");

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("json") => parse_json(&content).map_err(|e| ParseError::json_error(name, e)),
        Some("yaml") | Some("yml") => {
            parse_yaml(&content).map_err(|e| ParseError::yaml_error(name, e))
        }
        Some("toml") => parse_toml(&content).map_err(|e| ParseError::toml_error(name, e)),
        _ => parse_json(&content)
            .ok()
            .or_else(|| parse_yaml(&content).ok())
            .ok_or_else(|| ParseError::unknown_format(name)),
    }
}

/// Resolves a schema argument: an existing file path, otherwise literal JSON.
pub fn load_schema(arg: &str) -> Result<Value, ParseError> {
    let path = Path::new(arg);
    if path.is_file() {
        return parse_file(path);
    }
    parse_json(arg).map_err(|e| {
        if looks_like_path(arg) {
            ParseError::file_not_found(arg)
        } else {
            ParseError::invalid_literal(arg, e)
        }
    })
}

/// A bare word ending in a known extension is reported as a missing file
/// rather than as bad JSON.
fn looks_like_path(arg: &str) -> bool {
    let trimmed = arg.trim_start();
    !trimmed.starts_with('{')
        && !trimmed.starts_with('[')
        && [".json", ".yaml", ".yml", ".toml"]
            .iter()
            .any(|ext| arg.to_lowercase().ends_with(ext))
}

pub fn parse_json(content: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parses YAML. Non-string mapping keys are converted to their string form.
pub fn parse_yaml(content: &str) -> Result<Value, serde_yaml::Error> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    Ok(yaml_to_json(value))
}

pub fn parse_toml(content: &str) -> Result<Value, toml::de::Error> {
    toml::from_str(content)
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => serde_yaml::to_string(&other)
                        .map(|s| s.trim().to_string())
                        .unwrap_or_default(),
                };
                map.insert(key, yaml_to_json(v));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}
