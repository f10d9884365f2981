//! Custom error types for jsonschema-diff.
//!
//! Loading and configuration errors are fatal and surface as `Err`. A
//! comparator that cannot be resolved during a run is not an error here: it
//! becomes an `Undefined` node plus a [`crate::diff::Diagnostic`].

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read file {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not detect file format for {path}")]
    UnknownFormat { path: String },

    #[error("Argument is neither an existing file nor valid JSON: {input}")]
    InvalidLiteral {
        input: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while building an [`crate::config::EngineConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Combination rule '{rule}' cannot combine '{keyword}': \
         expected a {expected} comparator, found {found}"
    )]
    CombinationRuleConflict {
        rule: String,
        keyword: String,
        expected: String,
        found: String,
    },

    #[error("Combination rule '{rule}' needs at least two keywords")]
    TooFewKeywords { rule: String },

    #[error("Combination rule '{rule}' lists '{keyword}' more than once")]
    DuplicateKeyword { rule: String, keyword: String },

    #[error("Combination rule '{rule}' has an empty display name or keyword")]
    EmptyName { rule: String },

    #[error("Template of combination rule '{rule}' references unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder { rule: String, placeholder: String },

    #[error("Template of combination rule '{rule}' is malformed: {template}")]
    MalformedTemplate { rule: String, template: String },

    #[error("Comparison rule {rule} does not map to a precedence tier")]
    InvalidComparisonRule { rule: String },

    #[error("Invalid context rule: {message}")]
    InvalidContextRule { message: String },

    #[error("Indent width must be at least 1")]
    InvalidIndent,
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Unknown output format: {format}")]
    UnknownFormat { format: String },

    #[error("Failed to serialize to JSON: {source}")]
    JsonSerializationError {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaDiffError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ParseError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn read_error(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn json_error(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonError {
            path: path.into(),
            source,
        }
    }

    pub fn yaml_error(path: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::YamlError {
            path: path.into(),
            source,
        }
    }

    pub fn toml_error(path: impl Into<String>, source: toml::de::Error) -> Self {
        Self::TomlError {
            path: path.into(),
            source,
        }
    }

    pub fn unknown_format(path: impl Into<String>) -> Self {
        Self::UnknownFormat { path: path.into() }
    }

    pub fn invalid_literal(input: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidLiteral {
            input: input.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::file_not_found("schema.json");
        assert_eq!(err.to_string(), "File not found: schema.json");
    }

    #[test]
    fn test_unknown_format_error() {
        let err = ParseError::unknown_format("/path/to/schema.txt");
        assert!(err.to_string().contains("Could not detect file format"));
        assert!(err.to_string().contains("/path/to/schema.txt"));
    }

    #[test]
    fn test_invalid_literal_error() {
        let source = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err = ParseError::invalid_literal("{nope", source);
        assert!(err.to_string().contains("neither an existing file nor valid JSON"));
        assert!(err.to_string().contains("{nope"));
    }

    #[test]
    fn test_output_error_display() {
        let err = OutputError::UnknownFormat {
            format: "xml".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown output format: xml");
    }

    #[test]
    fn test_schema_diff_error_from_parse_error() {
        let parse_err = ParseError::file_not_found("schema.json");
        let err: SchemaDiffError = parse_err.into();
        assert!(matches!(err, SchemaDiffError::Parse(_)));
    }

    #[test]
    fn test_config_error_wrapped() {
        let err: SchemaDiffError = ConfigError::InvalidIndent.into();
        assert!(err.to_string().contains("Invalid configuration"));
        assert!(err.to_string().contains("Indent width"));
    }

    #[test]
    fn test_placeholder_error_mentions_braces() {
        let err = ConfigError::UnknownPlaceholder {
            rule: "range".to_string(),
            placeholder: "mid".to_string(),
        };
        assert!(err.to_string().contains("{mid}"));
    }
}
