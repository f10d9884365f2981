//! Locations inside a schema.
//!
//! A [`Path`] is the ordered list of [`Step`]s from the schema root to a
//! schema object. Keywords are not steps: a [`crate::diff::DiffNode`] pairs
//! the path of the object that owns a keyword with the keyword itself.
//!
//! Rendering:
//!
//! - `Property("age")` → `["age"]`
//! - `Index(0)` → `[0]`
//! - `Virtual("$defs")` → `.$defs`
//! - a terminal keyword → `.type`
//!
//! so the `format` keyword of `$defs.address.properties.zip` renders as
//! `.$defs["address"]["zip"].format`.

use serde::Serialize;
use std::fmt;

/// One step from a schema object to a nested schema object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Step {
    /// A named property, as reached through `properties`.
    Property { name: String },
    /// A position in a schema array (`items` tuples, `prefixItems`, `anyOf`, ...).
    Index { value: usize },
    /// A schema-only container such as `$defs` or `additionalProperties`;
    /// never part of an instance document.
    Virtual { name: String },
}

impl Step {
    pub fn property(name: impl Into<String>) -> Self {
        Step::Property { name: name.into() }
    }

    pub fn index(value: usize) -> Self {
        Step::Index { value }
    }

    pub fn virtual_key(name: impl Into<String>) -> Self {
        Step::Virtual { name: name.into() }
    }

    /// Plain token used by path filters.
    pub fn token(&self) -> String {
        match self {
            Step::Property { name } | Step::Virtual { name } => name.clone(),
            Step::Index { value } => value.to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Property { name } => write!(f, "[{}]", serde_json::Value::from(name.as_str())),
            Step::Index { value } => write!(f, "[{}]", value),
            Step::Virtual { name } => write!(f, ".{}", name),
        }
    }
}

/// Immutable path to a schema object. Equality is structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Returns a new path extended by `step`.
    pub fn child(&self, step: Step) -> Path {
        let mut steps = self.steps.clone();
        steps.push(step);
        Path { steps }
    }

    pub fn parent(&self) -> Option<Path> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Path {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Canonical display of the path followed by an optional keyword.
    pub fn render(&self, keyword: Option<&str>) -> String {
        let mut out = self.to_string();
        if let Some(keyword) = keyword {
            out.push('.');
            out.push_str(keyword);
        }
        out
    }

    /// Flat tokens (step names, indices, then the keyword) for pattern matching.
    pub fn tokens(&self, keyword: Option<&str>) -> Vec<String> {
        let mut tokens: Vec<String> = self.steps.iter().map(Step::token).collect();
        if let Some(keyword) = keyword {
            tokens.push(keyword.to_string());
        }
        tokens
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_renders_keyword_only() {
        assert_eq!(Path::root().render(Some("type")), ".type");
        assert_eq!(Path::root().render(None), "");
    }

    #[test]
    fn test_property_and_index_steps() {
        let path = Path::root()
            .child(Step::property("tags"))
            .child(Step::index(2));
        assert_eq!(path.render(Some("type")), r#"["tags"][2].type"#);
    }

    #[test]
    fn test_virtual_steps_render_inline() {
        let path = Path::root()
            .child(Step::virtual_key("$defs"))
            .child(Step::property("x"));
        assert_eq!(path.to_string(), r#".$defs["x"]"#);
    }

    #[test]
    fn test_property_names_are_escaped() {
        let path = Path::root().child(Step::property("a\"b"));
        assert_eq!(path.to_string(), r#"["a\"b"]"#);
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = Path::root().child(Step::property("user"));
        let child = parent.child(Step::property("name"));
        assert_eq!(parent.depth(), 1);
        assert_eq!(child.depth(), 2);
        assert_eq!(child.parent(), Some(parent));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_tokens() {
        let path = Path::root()
            .child(Step::virtual_key("anyOf"))
            .child(Step::index(0));
        assert_eq!(path.tokens(Some("type")), vec!["anyOf", "0", "type"]);
    }
}
