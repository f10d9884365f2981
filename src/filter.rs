//! Path filtering for schema differences.
//!
//! Patterns are matched against the flat token list of a node's location:
//! property names, schema container names, array indices and finally the
//! keyword. `["age"].minimum` has the tokens `age`, `minimum`;
//! `.$defs["id"].type` has `$defs`, `id`, `type`.
//!
//! # Pattern Syntax
//!
//! - `foo` - matches literal segment "foo"
//! - `*` - matches any single segment
//! - `**` - matches any number of segments (including zero)
//! - `foo.bar` or `["foo"].bar` - nested segments; both notations mix freely
//!
//! A pattern also matches everything below the location it names, so
//! `--ignore address` hides every change inside the `address` property.
//!
//! # Examples
//!
//! ```
//! use jsonschema_diff::filter::PathPattern;
//!
//! let pattern = PathPattern::parse("**.description");
//! assert!(pattern.matches(&["user".to_string(), "description".to_string()]));
//!
//! let pattern = PathPattern::parse(r#"["address"]"#);
//! assert!(pattern.matches(&["address".to_string(), "zip".to_string(), "type".to_string()]));
//! ```

/// A single segment in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches an exact token
    Literal(String),
    /// Matches any single token (*)
    SingleWildcard,
    /// Matches any number of tokens (**)
    DoubleWildcard,
}

impl PatternSegment {
    fn from_token(token: &str) -> Self {
        match token {
            "**" => PatternSegment::DoubleWildcard,
            "*" => PatternSegment::SingleWildcard,
            _ => PatternSegment::Literal(token.to_string()),
        }
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pub segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Parses dotted and bracketed notation. Quoted bracket contents are
    /// taken literally, so `["a.b"]` is one segment.
    pub fn parse(pattern: &str) -> Self {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                    let quoted = chars.peek() == Some(&'"');
                    if quoted {
                        chars.next();
                    }
                    let mut inner = String::new();
                    while let Some(c) = chars.next() {
                        match c {
                            '\\' if quoted => {
                                if let Some(escaped) = chars.next() {
                                    inner.push(escaped);
                                }
                            }
                            '"' if quoted => {}
                            ']' => break,
                            c => inner.push(c),
                        }
                    }
                    tokens.push(inner);
                }
                c => current.push(c),
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }

        Self {
            segments: tokens.iter().map(|t| PatternSegment::from_token(t)).collect(),
        }
    }

    /// True if the pattern matches `path` or one of its ancestors.
    pub fn matches(&self, path: &[String]) -> bool {
        (0..=path.len()).any(|end| Self::matches_exact(&self.segments, &path[..end]))
    }

    fn matches_exact(pattern: &[PatternSegment], path: &[String]) -> bool {
        match (pattern.first(), path.first()) {
            (None, None) => true,
            (None, Some(_)) => false,
            (Some(_), None) => pattern
                .iter()
                .all(|s| matches!(s, PatternSegment::DoubleWildcard)),
            (Some(seg), Some(token)) => match seg {
                PatternSegment::Literal(lit) => {
                    lit == token && Self::matches_exact(&pattern[1..], &path[1..])
                }
                PatternSegment::SingleWildcard => Self::matches_exact(&pattern[1..], &path[1..]),
                PatternSegment::DoubleWildcard => {
                    Self::matches_exact(&pattern[1..], path)
                        || Self::matches_exact(pattern, &path[1..])
                }
            },
        }
    }
}

/// Ignore/only patterns applied to raw nodes before combination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Patterns for locations to hide
    pub ignore_patterns: Vec<PathPattern>,
    /// Patterns for locations to keep (if non-empty, only these are shown)
    pub only_patterns: Vec<PathPattern>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.ignore_patterns.push(PathPattern::parse(pattern));
        self
    }

    pub fn only(mut self, pattern: &str) -> Self {
        self.only_patterns.push(PathPattern::parse(pattern));
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.ignore_patterns.is_empty() || !self.only_patterns.is_empty()
    }

    /// Ignore patterns win over only patterns.
    pub fn should_include(&self, tokens: &[String]) -> bool {
        if self.ignore_patterns.iter().any(|p| p.matches(tokens)) {
            return false;
        }
        self.only_patterns.is_empty() || self.only_patterns.iter().any(|p| p.matches(tokens))
    }
}
