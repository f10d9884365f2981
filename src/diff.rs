//! Difference model and the comparison pipeline.
//!
//! [`compare`] walks both schemas into raw [`DiffNode`]s, drops filtered
//! paths, merges keyword groups, attaches context and finally groups the
//! result into printable lines:
//!
//! ```text
//! PropertyTree → filter → Combiner → ContextResolver → render groups
//! ```
//!
//! # Examples
//!
//! ```
//! use jsonschema_diff::{compare, EngineConfig};
//! use serde_json::json;
//!
//! let old = json!({"type": "string"});
//! let new = json!({"type": "integer"});
//! let report = compare(&old, &new, &EngineConfig::default());
//!
//! assert_eq!(report.stats.changed, 1);
//! assert_eq!(report.lines(), vec![r#"r .type: "string" -> "integer""#]);
//! ```

use crate::combine::Combiner;
use crate::compare::StrategyKind;
use crate::config::EngineConfig;
use crate::context::ContextResolver;
use crate::output::{build_groups, RenderGroup};
use crate::path::Path;
use crate::tree::JsonType;
use crate::walker::PropertyTree;
use serde::Serialize;
use serde_json::Value;

/// The kind of difference a node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Present in new but not old
    Added,
    /// Present in old but not new
    Removed,
    /// Present in both with different values (full replacement)
    Changed,
    /// Partial change inside a list or mapping value
    Modified,
    /// Same on both sides; only ever shown as context
    Unchanged,
    /// No comparator could be resolved
    Undefined,
}

impl Operation {
    /// Status prefix used in rendered lines.
    pub fn symbol(&self) -> char {
        match self {
            Operation::Added => '+',
            Operation::Removed => '-',
            Operation::Changed => 'r',
            Operation::Modified => 'm',
            Operation::Unchanged => ' ',
            Operation::Undefined => '?',
        }
    }

    /// True for every operation except `Unchanged`.
    pub fn is_change(&self) -> bool {
        !matches!(self, Operation::Unchanged)
    }

    /// Operation implied by which sides hold a value.
    pub fn from_presence(old: bool, new: bool) -> Option<Operation> {
        match (old, new) {
            (false, true) => Some(Operation::Added),
            (true, false) => Some(Operation::Removed),
            (true, true) => Some(Operation::Changed),
            (false, false) => None,
        }
    }
}

/// Per-element detail of a `Modified` list or mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementDiff {
    pub operation: Operation,
    /// Mapping key; `None` for list elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl ElementDiff {
    pub fn list(operation: Operation, value: &Value) -> Self {
        let (old_value, new_value) = match operation {
            Operation::Added => (None, Some(value.clone())),
            _ => (Some(value.clone()), None),
        };
        Self {
            operation,
            key: None,
            old_value,
            new_value,
        }
    }

    pub fn entry(
        operation: Operation,
        key: &str,
        old_value: Option<&Value>,
        new_value: Option<&Value>,
    ) -> Self {
        Self {
            operation,
            key: Some(key.to_string()),
            old_value: old_value.cloned(),
            new_value: new_value.cloned(),
        }
    }
}

/// One difference (or one context entry) at one path.
///
/// `path` locates the schema object that owns `keyword`. A node without a
/// keyword stands for the object at `path` as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffNode {
    pub path: Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub operation: Operation,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    /// Whole object/array added, removed or replaced at once
    pub is_composite: bool,
    /// Strategy that produced the node, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementDiff>,
    /// Source keywords merged into this node by a combination rule
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub absorbed: Vec<String>,
}

impl DiffNode {
    pub fn new(
        path: Path,
        keyword: Option<String>,
        operation: Operation,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        let is_composite = keyword.is_none()
            && old_value
                .iter()
                .chain(new_value.iter())
                .any(|v| JsonType::of(v).is_container());
        Self {
            path,
            keyword,
            operation,
            old_value,
            new_value,
            is_composite,
            strategy: None,
            elements: Vec::new(),
            absorbed: Vec::new(),
        }
    }

    pub fn added(path: Path, keyword: Option<String>, value: Value) -> Self {
        Self::new(path, keyword, Operation::Added, None, Some(value))
    }

    pub fn removed(path: Path, keyword: Option<String>, value: Value) -> Self {
        Self::new(path, keyword, Operation::Removed, Some(value), None)
    }

    pub fn changed(path: Path, keyword: Option<String>, old: Value, new: Value) -> Self {
        Self::new(path, keyword, Operation::Changed, Some(old), Some(new))
    }

    /// A context-only entry: the keyword did not change and is shown to
    /// explain a neighbouring change.
    pub fn context(path: Path, keyword: impl Into<String>, value: Value) -> Self {
        Self::new(
            path,
            Some(keyword.into()),
            Operation::Unchanged,
            Some(value.clone()),
            Some(value),
        )
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_elements(mut self, elements: Vec<ElementDiff>) -> Self {
        self.elements = elements;
        self
    }

    pub fn is_context(&self) -> bool {
        self.operation == Operation::Unchanged
    }

    pub fn is_combined(&self) -> bool {
        !self.absorbed.is_empty()
    }

    /// Schema keywords this node accounts for: the absorbed ones for a
    /// combined node, otherwise its own keyword.
    pub fn keywords(&self) -> Vec<&str> {
        if self.is_combined() {
            self.absorbed.iter().map(String::as_str).collect()
        } else {
            self.keyword.iter().map(String::as_str).collect()
        }
    }

    /// Rendered location, e.g. `["age"].range`.
    pub fn display_path(&self) -> String {
        self.path.render(self.keyword.as_deref())
    }
}

/// A comparator that could not be resolved for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: Path,
    pub keyword: String,
    pub old_type: Option<JsonType>,
    pub new_type: Option<JsonType>,
    pub message: String,
}

impl Diagnostic {
    pub fn unresolved(
        path: &Path,
        keyword: &str,
        old_type: Option<JsonType>,
        new_type: Option<JsonType>,
    ) -> Self {
        let side = |t: Option<JsonType>| t.map_or("absent", |t| t.name());
        Self {
            path: path.clone(),
            keyword: keyword.to_string(),
            old_type,
            new_type,
            message: format!(
                "no comparator for '{}' ({} -> {}) at {}",
                keyword,
                side(old_type),
                side(new_type),
                path.render(Some(keyword))
            ),
        }
    }
}

/// Statistics about the final node list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub modified: usize,
    pub undefined: usize,
    /// Context-only entries
    pub context: usize,
}

impl DiffStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: &[DiffNode]) -> Self {
        let mut stats = Self::new();
        for node in nodes {
            match node.operation {
                Operation::Added => stats.added += 1,
                Operation::Removed => stats.removed += 1,
                Operation::Changed => stats.changed += 1,
                Operation::Modified => stats.modified += 1,
                Operation::Undefined => stats.undefined += 1,
                Operation::Unchanged => stats.context += 1,
            }
        }
        stats
    }

    /// Returns the number of real differences (context excluded, undefined included).
    pub fn total_changes(&self) -> usize {
        self.added + self.removed + self.changed + self.modified + self.undefined
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }
}

/// Result of one comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Final ordered nodes: real changes, each followed by its context
    pub nodes: Vec<DiffNode>,
    pub groups: Vec<RenderGroup>,
    pub stats: DiffStats,
    pub diagnostics: Vec<Diagnostic>,
    /// Strategies the registry dispatched to, in declaration order
    pub strategies_used: Vec<StrategyKind>,
}

impl Report {
    /// True if any real or undefined difference was found.
    pub fn has_differences(&self) -> bool {
        !self.stats.is_empty()
    }

    /// False when some comparator could not be resolved.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Real changes only, in output order.
    pub fn changes(&self) -> impl Iterator<Item = &DiffNode> {
        self.nodes.iter().filter(|n| !n.is_context())
    }

    /// Every rendered line without group separators.
    pub fn lines(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.lines.iter().map(|l| l.to_string()))
            .collect()
    }
}

/// Compares two schemas.
///
/// This is the single entry point shared by the CLI and any embedding
/// tool. It never fails: unresolved comparators are reported through
/// [`Report::diagnostics`] and rendered with a `?` prefix.
pub fn compare(old: &Value, new: &Value, config: &EngineConfig) -> Report {
    let tree = PropertyTree::walk(old, new, config);

    let raw: Vec<DiffNode> = tree
        .nodes()
        .iter()
        .filter(|node| {
            config
                .filter()
                .should_include(&node.path.tokens(node.keyword.as_deref()))
        })
        .cloned()
        .collect();
    tracing::debug!(raw = tree.nodes().len(), kept = raw.len(), "schema walk finished");

    let combined = Combiner::new(&tree, config.combinations())
        .with_filter(config.filter())
        .combine(raw);
    let nodes = ContextResolver::new(&tree, config.context_rules())
        .with_filter(config.filter())
        .resolve(combined);

    let groups = build_groups(&nodes, config.format());
    let stats = DiffStats::from_nodes(&nodes);

    Report {
        groups,
        stats,
        diagnostics: tree.diagnostics().to_vec(),
        strategies_used: tree.strategies_used(),
        nodes,
    }
}
