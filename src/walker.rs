//! Parallel walk over the old and new schema trees.
//!
//! The walker descends into every keyword that holds subschemas and hands
//! every other keyword to the comparator registry. Keys are visited in old
//! document order, then keys that only exist in the new schema, so output
//! order is stable across runs.
//!
//! | container                                                 | steps                          |
//! |-----------------------------------------------------------|--------------------------------|
//! | `properties`                                              | `Property(name)`               |
//! | `patternProperties`, `$defs`, `definitions`, `dependentSchemas` | `Virtual(kw)`, `Property(name)` |
//! | `items` (object), `not`, `if`, `additionalProperties`, ... | `Virtual(kw)`                  |
//! | `items` (array)                                           | `Index(i)`                     |
//! | `prefixItems`, `allOf`, `anyOf`, `oneOf`                  | `Virtual(kw)`, `Index(i)`      |

use crate::compare::StrategyKind;
use crate::config::EngineConfig;
use crate::diff::{Diagnostic, DiffNode, Operation};
use crate::path::{Path, Step};
use crate::tree::{semantic_equals, type_of};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Keywords whose value maps names to subschemas.
pub const PROPERTY_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
];

/// Keywords whose value is a single subschema.
pub const SUBSCHEMA_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "contains",
    "not",
    "if",
    "then",
    "else",
    "additionalProperties",
    "unevaluatedItems",
    "unevaluatedProperties",
    "propertyNames",
    "contentSchema",
];

/// Keywords whose value is an array of subschemas.
pub const SUBSCHEMA_LIST_KEYWORDS: &[&str] = &["prefixItems", "allOf", "anyOf", "oneOf"];

/// True for keywords that hold nested schemas rather than constraint values.
pub fn is_container_keyword(keyword: &str) -> bool {
    PROPERTY_MAP_KEYWORDS.contains(&keyword)
        || SUBSCHEMA_KEYWORDS.contains(&keyword)
        || SUBSCHEMA_LIST_KEYWORDS.contains(&keyword)
}

/// The old and new schema objects found at one path.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaScope<'a> {
    pub old: Option<&'a Map<String, Value>>,
    pub new: Option<&'a Map<String, Value>>,
}

impl<'a> SchemaScope<'a> {
    pub fn old_value(&self, keyword: &str) -> Option<&'a Value> {
        self.old.and_then(|m| m.get(keyword))
    }

    pub fn new_value(&self, keyword: &str) -> Option<&'a Value> {
        self.new.and_then(|m| m.get(keyword))
    }

    /// Value shown for context: old side first, new side as fallback.
    pub fn value(&self, keyword: &str) -> Option<&'a Value> {
        self.old_value(keyword).or_else(|| self.new_value(keyword))
    }

    /// True if either side defines `keyword`.
    pub fn contains(&self, keyword: &str) -> bool {
        self.value(keyword).is_some()
    }
}

/// How a container keyword's value must be shaped for the walker to descend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    SchemaMap,
    Schema,
    SchemaList,
}

fn shape_of(value: &Value) -> Option<Shape> {
    match value {
        Value::Object(_) | Value::Bool(_) => Some(Shape::Schema),
        Value::Array(_) => Some(Shape::SchemaList),
        _ => None,
    }
}

/// Raw comparison result plus the per-path scopes later passes consult.
#[derive(Debug)]
pub struct PropertyTree<'a> {
    scopes: HashMap<Path, SchemaScope<'a>>,
    nodes: Vec<DiffNode>,
    diagnostics: Vec<Diagnostic>,
    strategies: BTreeSet<StrategyKind>,
    config: &'a EngineConfig,
}

impl<'a> PropertyTree<'a> {
    /// Walks both schemas and records one raw node per differing keyword.
    pub fn walk(old: &'a Value, new: &'a Value, config: &'a EngineConfig) -> Self {
        let mut tree = Self {
            scopes: HashMap::new(),
            nodes: Vec::new(),
            diagnostics: Vec::new(),
            strategies: BTreeSet::new(),
            config,
        };
        tree.walk_schema(Path::root(), Some(old), Some(new));
        tree
    }

    pub fn nodes(&self) -> &[DiffNode] {
        &self.nodes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Strategies the registry dispatched to, in declaration order.
    pub fn strategies_used(&self) -> Vec<StrategyKind> {
        self.strategies.iter().copied().collect()
    }

    /// Schema objects at `path`; empty if the walker never reached it.
    pub fn scope(&self, path: &Path) -> SchemaScope<'a> {
        self.scopes.get(path).copied().unwrap_or_default()
    }

    fn walk_schema(&mut self, path: Path, old: Option<&'a Value>, new: Option<&'a Value>) {
        match (old, new) {
            (Some(o), Some(n)) if semantic_equals(o, n) => {}
            (Some(Value::Object(o)), Some(Value::Object(n))) => {
                self.scopes.insert(
                    path.clone(),
                    SchemaScope {
                        old: Some(o),
                        new: Some(n),
                    },
                );
                self.walk_keywords(&path, o, n);
            }
            (Some(o), Some(n)) => {
                self.nodes
                    .push(DiffNode::changed(path, None, o.clone(), n.clone()));
            }
            (Some(o), None) => {
                tracing::trace!(path = %path, "subschema removed");
                self.nodes.push(DiffNode::removed(path, None, o.clone()));
            }
            (None, Some(n)) => {
                tracing::trace!(path = %path, "subschema added");
                self.nodes.push(DiffNode::added(path, None, n.clone()));
            }
            (None, None) => {}
        }
    }

    fn walk_keywords(
        &mut self,
        path: &Path,
        old: &'a Map<String, Value>,
        new: &'a Map<String, Value>,
    ) {
        let new_only = new.keys().filter(|k| !old.contains_key(*k));
        let keywords: Vec<&'a String> = old.keys().chain(new_only).collect();

        for keyword in keywords {
            let (o, n) = (old.get(keyword), new.get(keyword));
            if let (Some(o), Some(n)) = (o, n) {
                if semantic_equals(o, n) {
                    continue;
                }
            }
            if !self.descend(path, keyword, o, n) {
                self.compare_keyword(path, keyword, o, n);
            }
        }
    }

    /// Walks into a container keyword. Returns false when the keyword holds
    /// something other than subschemas, or its shape differs between sides.
    fn descend(
        &mut self,
        path: &Path,
        keyword: &str,
        old: Option<&'a Value>,
        new: Option<&'a Value>,
    ) -> bool {
        let expected = if PROPERTY_MAP_KEYWORDS.contains(&keyword) {
            Shape::SchemaMap
        } else if SUBSCHEMA_LIST_KEYWORDS.contains(&keyword) {
            Shape::SchemaList
        } else if SUBSCHEMA_KEYWORDS.contains(&keyword) {
            // `items` may hold a single schema or a tuple.
            match old.or(new).and_then(shape_of) {
                Some(shape) if keyword == "items" => shape,
                _ => Shape::Schema,
            }
        } else {
            return false;
        };

        let fits = |value: Option<&Value>| match (expected, value) {
            (_, None) => true,
            (Shape::SchemaMap, Some(v)) => v.is_object(),
            (shape, Some(v)) => shape_of(v) == Some(shape),
        };
        if !fits(old) || !fits(new) {
            tracing::debug!(path = %path, keyword, "container shape differs, comparing as a value");
            return false;
        }

        match expected {
            Shape::SchemaMap => {
                let base = if keyword == "properties" {
                    path.clone()
                } else {
                    path.child(Step::virtual_key(keyword))
                };
                let empty = Map::new();
                let o = old.and_then(Value::as_object);
                let n = new.and_then(Value::as_object);
                let o_map = o.unwrap_or(&empty);
                let n_map = n.unwrap_or(&empty);
                let names: Vec<String> = o_map
                    .keys()
                    .chain(n_map.keys().filter(|k| !o_map.contains_key(*k)))
                    .cloned()
                    .collect();
                for name in names {
                    let child = base.child(Step::property(name.as_str()));
                    let o_child = o.and_then(|m| m.get(&name));
                    let n_child = n.and_then(|m| m.get(&name));
                    self.walk_schema(child, o_child, n_child);
                }
            }
            Shape::Schema => {
                self.walk_schema(path.child(Step::virtual_key(keyword)), old, new);
            }
            Shape::SchemaList => {
                let base = if keyword == "items" {
                    path.clone()
                } else {
                    path.child(Step::virtual_key(keyword))
                };
                let o = old.and_then(Value::as_array);
                let n = new.and_then(Value::as_array);
                let len = o.map_or(0, Vec::len).max(n.map_or(0, Vec::len));
                for i in 0..len {
                    let o_child = o.and_then(|a| a.get(i));
                    let n_child = n.and_then(|a| a.get(i));
                    self.walk_schema(base.child(Step::index(i)), o_child, n_child);
                }
            }
        }
        true
    }

    fn compare_keyword(
        &mut self,
        path: &Path,
        keyword: &str,
        old: Option<&'a Value>,
        new: Option<&'a Value>,
    ) {
        let (old_type, new_type) = (type_of(old), type_of(new));
        let Some(resolution) = self
            .config
            .registry()
            .resolve(keyword, old_type, new_type)
        else {
            let diagnostic = Diagnostic::unresolved(path, keyword, old_type, new_type);
            tracing::warn!("{}", diagnostic.message);
            self.diagnostics.push(diagnostic);
            self.nodes.push(DiffNode::new(
                path.clone(),
                Some(keyword.to_string()),
                Operation::Undefined,
                old.cloned(),
                new.cloned(),
            ));
            return;
        };

        self.strategies.insert(resolution.strategy);
        let comparison = resolution.strategy.compare(old, new);
        if comparison.operation == Operation::Unchanged {
            return;
        }
        let node = DiffNode::new(
            path.clone(),
            Some(keyword.to_string()),
            comparison.operation,
            old.cloned(),
            new.cloned(),
        )
        .with_strategy(resolution.strategy)
        .with_elements(comparison.elements);
        self.nodes.push(node);
    }
}
