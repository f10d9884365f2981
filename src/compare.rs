//! Comparator selection and the comparison strategies.
//!
//! Every keyword encounter is resolved to exactly one [`StrategyKind`] by a
//! five-tier search, most specific first:
//!
//! 1. `(keyword, old type, new type)`
//! 2. `keyword`
//! 3. `(old type, new type)`
//! 4. a single type, old side first, then new side
//! 5. the fallback strategy, if enabled
//!
//! The first tier with a match wins outright. Within a tier the most
//! recently registered rule wins, so user rules shadow built-ins of the same
//! tier without removing them.

use crate::diff::{ElementDiff, Operation};
use crate::error::ConfigError;
use crate::tree::{numbers_equal, semantic_equals, JsonType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The closed set of comparison strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Deep structural equality; any difference is a full replacement
    Default,
    /// Numeric bounds compared by value (`1` equals `1.0`)
    Range,
    /// Element-wise sequence diff of arrays
    List,
    /// Entry-wise diff of plain objects
    Mapping,
}

/// What kind of values a strategy hands to a combination template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Any,
    Numeric,
    Sequence,
    Mapping,
}

impl ValueClass {
    pub fn name(&self) -> &'static str {
        match self {
            ValueClass::Any => "any",
            ValueClass::Numeric => "numeric",
            ValueClass::Sequence => "sequence",
            ValueClass::Mapping => "mapping",
        }
    }

    /// Whether a combination template can format values of this class.
    pub fn is_templatable(&self) -> bool {
        matches!(self, ValueClass::Any | ValueClass::Numeric)
    }
}

/// Outcome of running a strategy on one keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub operation: Operation,
    pub elements: Vec<ElementDiff>,
}

impl Comparison {
    fn plain(operation: Operation) -> Self {
        Self {
            operation,
            elements: Vec::new(),
        }
    }
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Default,
        StrategyKind::Range,
        StrategyKind::List,
        StrategyKind::Mapping,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Default => "default",
            StrategyKind::Range => "range",
            StrategyKind::List => "list",
            StrategyKind::Mapping => "mapping",
        }
    }

    /// Legend text describing how changes found by this strategy are shown.
    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::Default => {
                "Values compared as a whole; a difference is shown as `old -> new`"
            }
            StrategyKind::Range => {
                "Numeric bounds compared by value; paired bounds may be merged into one range"
            }
            StrategyKind::List => {
                "Arrays diffed element by element; each element carries its own status"
            }
            StrategyKind::Mapping => {
                "Objects diffed entry by entry; each entry carries its own status"
            }
        }
    }

    pub fn value_class(&self) -> ValueClass {
        match self {
            StrategyKind::Default => ValueClass::Any,
            StrategyKind::Range => ValueClass::Numeric,
            StrategyKind::List => ValueClass::Sequence,
            StrategyKind::Mapping => ValueClass::Mapping,
        }
    }

    /// Runs the strategy. An absent side yields `Added`/`Removed`, never a
    /// comparison against `null`.
    pub fn compare(&self, old: Option<&Value>, new: Option<&Value>) -> Comparison {
        let (old, new) = match (old, new) {
            (Some(old), Some(new)) => (old, new),
            (None, Some(_)) => return Comparison::plain(Operation::Added),
            (Some(_), None) => return Comparison::plain(Operation::Removed),
            (None, None) => return Comparison::plain(Operation::Undefined),
        };

        match (self, old, new) {
            (StrategyKind::Range, Value::Number(a), Value::Number(b)) => {
                if numbers_equal(a, b) {
                    Comparison::plain(Operation::Unchanged)
                } else {
                    Comparison::plain(Operation::Changed)
                }
            }
            (StrategyKind::List, Value::Array(a), Value::Array(b)) => compare_lists(a, b),
            (StrategyKind::Mapping, Value::Object(a), Value::Object(b)) => compare_mappings(a, b),
            // Mismatched shapes fall back to whole-value replacement.
            _ => compare_default(old, new),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn compare_default(old: &Value, new: &Value) -> Comparison {
    if semantic_equals(old, new) {
        Comparison::plain(Operation::Unchanged)
    } else {
        Comparison::plain(Operation::Changed)
    }
}

/// Longest-common-subsequence diff. Within a mismatched run, removals come
/// before additions.
fn compare_lists(old: &[Value], new: &[Value]) -> Comparison {
    let (n, m) = (old.len(), new.len());
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if semantic_equals(&old[i], &new[j]) {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut elements = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if semantic_equals(&old[i], &new[j]) {
            elements.push(ElementDiff::list(Operation::Unchanged, &old[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            elements.push(ElementDiff::list(Operation::Removed, &old[i]));
            i += 1;
        } else {
            elements.push(ElementDiff::list(Operation::Added, &new[j]));
            j += 1;
        }
    }
    elements.extend(old[i..].iter().map(|v| ElementDiff::list(Operation::Removed, v)));
    elements.extend(new[j..].iter().map(|v| ElementDiff::list(Operation::Added, v)));

    let operation = if elements.iter().any(|e| e.operation.is_change()) {
        Operation::Modified
    } else {
        Operation::Unchanged
    };
    Comparison {
        operation,
        elements,
    }
}

/// Entry-wise diff; old keys in document order first, then new-only keys.
fn compare_mappings(old: &Map<String, Value>, new: &Map<String, Value>) -> Comparison {
    let mut elements = Vec::with_capacity(old.len().max(new.len()));
    for (key, old_value) in old {
        let element = match new.get(key) {
            Some(new_value) if semantic_equals(old_value, new_value) => {
                ElementDiff::entry(Operation::Unchanged, key, Some(old_value), Some(new_value))
            }
            Some(new_value) => {
                ElementDiff::entry(Operation::Changed, key, Some(old_value), Some(new_value))
            }
            None => ElementDiff::entry(Operation::Removed, key, Some(old_value), None),
        };
        elements.push(element);
    }
    for (key, new_value) in new {
        if !old.contains_key(key) {
            elements.push(ElementDiff::entry(Operation::Added, key, None, Some(new_value)));
        }
    }

    let operation = if elements.iter().any(|e| e.operation.is_change()) {
        Operation::Modified
    } else {
        Operation::Unchanged
    };
    Comparison {
        operation,
        elements,
    }
}

/// Precedence tier of a rule; lower is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    KeywordAndTypes = 1,
    Keyword = 2,
    TypePair = 3,
    SingleType = 4,
    Fallback = 5,
}

/// Static mapping from a (keyword, old type, new type) pattern to a strategy.
/// `None` fields are wildcards; which fields are set decides the tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRule {
    pub keyword: Option<String>,
    pub old_type: Option<JsonType>,
    pub new_type: Option<JsonType>,
    pub strategy: StrategyKind,
}

impl ComparisonRule {
    pub fn exact(
        keyword: impl Into<String>,
        old_type: JsonType,
        new_type: JsonType,
        strategy: StrategyKind,
    ) -> Self {
        Self {
            keyword: Some(keyword.into()),
            old_type: Some(old_type),
            new_type: Some(new_type),
            strategy,
        }
    }

    pub fn keyword(keyword: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            keyword: Some(keyword.into()),
            old_type: None,
            new_type: None,
            strategy,
        }
    }

    pub fn types(old_type: JsonType, new_type: JsonType, strategy: StrategyKind) -> Self {
        Self {
            keyword: None,
            old_type: Some(old_type),
            new_type: Some(new_type),
            strategy,
        }
    }

    pub fn old_type(old_type: JsonType, strategy: StrategyKind) -> Self {
        Self {
            keyword: None,
            old_type: Some(old_type),
            new_type: None,
            strategy,
        }
    }

    pub fn new_type(new_type: JsonType, strategy: StrategyKind) -> Self {
        Self {
            keyword: None,
            old_type: None,
            new_type: Some(new_type),
            strategy,
        }
    }

    /// The tier this rule competes in, or `None` for a pattern no tier covers
    /// (for example a keyword with a single type).
    pub fn tier(&self) -> Option<Tier> {
        match (&self.keyword, self.old_type, self.new_type) {
            (Some(_), Some(_), Some(_)) => Some(Tier::KeywordAndTypes),
            (Some(_), None, None) => Some(Tier::Keyword),
            (None, Some(_), Some(_)) => Some(Tier::TypePair),
            (None, Some(_), None) | (None, None, Some(_)) => Some(Tier::SingleType),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |t: Option<JsonType>| t.map_or("*", |t| t.name());
        write!(
            f,
            "({}, {}, {}) -> {}",
            self.keyword.as_deref().unwrap_or("*"),
            part(self.old_type),
            part(self.new_type),
            self.strategy
        )
    }
}

/// A resolved strategy together with the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub strategy: StrategyKind,
    pub tier: Tier,
}

/// The rule table. Read-only once an engine configuration is built.
#[derive(Debug, Clone, Default)]
pub struct ComparatorRegistry {
    rules: Vec<ComparisonRule>,
    fallback: Option<StrategyKind>,
}

impl ComparatorRegistry {
    pub fn new(fallback: Option<StrategyKind>) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Registry holding the built-in rules and the default fallback.
    pub fn builtin() -> Self {
        let mut registry = Self::new(Some(StrategyKind::Default));
        registry.rules = builtin_rules();
        registry
    }

    /// Appends a rule. Existing rules are never removed.
    pub fn register(&mut self, rule: ComparisonRule) -> Result<(), ConfigError> {
        if rule.tier().is_none() || rule.keyword.as_deref() == Some("") {
            return Err(ConfigError::InvalidComparisonRule {
                rule: rule.to_string(),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn set_fallback(&mut self, fallback: Option<StrategyKind>) {
        self.fallback = fallback;
    }

    pub fn fallback(&self) -> Option<StrategyKind> {
        self.fallback
    }

    pub fn rules(&self) -> &[ComparisonRule] {
        &self.rules
    }

    /// Resolves the strategy for one keyword encounter. `None` types mean
    /// the keyword is absent on that side.
    pub fn resolve(
        &self,
        keyword: &str,
        old: Option<JsonType>,
        new: Option<JsonType>,
    ) -> Option<Resolution> {
        let resolution = self
            .find_in_tier(Tier::KeywordAndTypes, |r| {
                r.keyword.as_deref() == Some(keyword)
                    && old.is_some()
                    && r.old_type == old
                    && r.new_type == new
            })
            .or_else(|| self.find_in_tier(Tier::Keyword, |r| r.keyword.as_deref() == Some(keyword)))
            .or_else(|| {
                self.find_in_tier(Tier::TypePair, |r| {
                    old.is_some() && new.is_some() && r.old_type == old && r.new_type == new
                })
            })
            .or_else(|| {
                self.find_in_tier(Tier::SingleType, |r| {
                    r.new_type.is_none() && old.is_some() && r.old_type == old
                })
            })
            .or_else(|| {
                self.find_in_tier(Tier::SingleType, |r| {
                    r.old_type.is_none() && new.is_some() && r.new_type == new
                })
            })
            .or_else(|| {
                self.fallback.map(|strategy| Resolution {
                    strategy,
                    tier: Tier::Fallback,
                })
            });

        match resolution {
            Some(r) => tracing::trace!(keyword, tier = ?r.tier, strategy = %r.strategy, "comparator resolved"),
            None => tracing::trace!(keyword, "no comparator tier matched"),
        }
        resolution
    }

    /// Most recently registered rule of `tier` accepted by `pred`.
    fn find_in_tier<F>(&self, tier: Tier, pred: F) -> Option<Resolution>
    where
        F: Fn(&ComparisonRule) -> bool,
    {
        self.rules
            .iter()
            .rev()
            .filter(|r| r.tier() == Some(tier))
            .find(|&r| pred(r))
            .map(|r| Resolution {
                strategy: r.strategy,
                tier,
            })
    }

    /// Strategy a keyword gets regardless of value types (tier 2), used to
    /// validate combination rules before any schema is seen.
    pub fn resolve_keyword(&self, keyword: &str) -> Option<StrategyKind> {
        self.rules
            .iter()
            .rev()
            .find(|r| r.tier() == Some(Tier::Keyword) && r.keyword.as_deref() == Some(keyword))
            .map(|r| r.strategy)
    }
}

/// Keywords whose values are numeric bounds.
pub const RANGE_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "minProperties",
    "maxProperties",
    "minContains",
    "maxContains",
    "multipleOf",
];

fn builtin_rules() -> Vec<ComparisonRule> {
    let mut rules: Vec<ComparisonRule> = RANGE_KEYWORDS
        .iter()
        .map(|k| ComparisonRule::keyword(*k, StrategyKind::Range))
        .collect();
    rules.push(ComparisonRule::types(
        JsonType::Object,
        JsonType::Object,
        StrategyKind::Mapping,
    ));
    rules.push(ComparisonRule::old_type(JsonType::Array, StrategyKind::List));
    rules.push(ComparisonRule::new_type(JsonType::Array, StrategyKind::List));
    rules
}
