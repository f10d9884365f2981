//! Merging related keyword changes into one display unit.
//!
//! A [`CombinationRule`] names a group of keywords (`type` and `format`,
//! `minimum` and `maximum`, ...) that read better as one value. When the
//! keywords of a group change together at one path, their nodes collapse
//! into a single node named after the rule. Its values are produced either
//! by a [`Template`] or, for numeric bounds, by an [`Interval`].

use crate::compare::{ComparatorRegistry, ValueClass};
use crate::diff::{DiffNode, Operation};
use crate::error::ConfigError;
use crate::filter::FilterConfig;
use crate::path::Path;
use crate::tree::{to_compact, to_template_text};
use crate::walker::PropertyTree;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Which members of a group must have changed for the group to combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Combine whenever any member changed
    All,
    /// Combine only if the main (first) keyword changed
    MainOnly,
    /// Combine only if some secondary keyword changed
    SubOnly,
    /// Never combine for this operation
    None,
}

/// Combine mode per operation of the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinePolicy {
    pub on_add: CombineMode,
    pub on_remove: CombineMode,
    pub on_change: CombineMode,
}

impl CombinePolicy {
    pub fn all() -> Self {
        Self {
            on_add: CombineMode::All,
            on_remove: CombineMode::All,
            on_change: CombineMode::All,
        }
    }

    /// Combine only when the group was changed on both sides.
    pub fn change_only() -> Self {
        Self {
            on_add: CombineMode::None,
            on_remove: CombineMode::None,
            on_change: CombineMode::All,
        }
    }

    pub fn mode_for(&self, operation: Operation) -> CombineMode {
        match operation {
            Operation::Added => self.on_add,
            Operation::Removed => self.on_remove,
            Operation::Changed | Operation::Modified => self.on_change,
            Operation::Unchanged | Operation::Undefined => CombineMode::None,
        }
    }
}

impl Default for CombinePolicy {
    fn default() -> Self {
        Self::all()
    }
}

/// Display template such as `{main}/{sub}`.
///
/// Placeholders are `{main}` (first keyword), `{sub}` (second keyword), a
/// zero-based index like `{2}`, or a keyword of the rule by name. Missing
/// values at the end are dropped together with their separators, so
/// `{main}/{sub}` renders `"string"` when only `type` exists. Any other
/// missing value renders empty and keeps its separator: `"/email"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    prefix: String,
    slots: Vec<(String, usize)>,
    suffix: String,
}

impl Template {
    /// Parses `source` against the keywords of `rule`.
    pub fn parse(rule: &str, source: &str, keywords: &[String]) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::MalformedTemplate {
            rule: rule.to_string(),
            template: source.to_string(),
        };

        let mut prefix = None;
        let mut slots = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(malformed()),
                            Some(c) => name.push(c),
                        }
                    }
                    let index = match name.as_str() {
                        "main" => Some(0),
                        "sub" => Some(1),
                        n => n
                            .parse::<usize>()
                            .ok()
                            .or_else(|| keywords.iter().position(|k| k == n)),
                    }
                    .filter(|i| *i < keywords.len())
                    .ok_or_else(|| ConfigError::UnknownPlaceholder {
                        rule: rule.to_string(),
                        placeholder: name.clone(),
                    })?;

                    let sep = std::mem::take(&mut literal);
                    if prefix.is_none() {
                        prefix = Some(sep);
                        slots.push((String::new(), index));
                    } else {
                        slots.push((sep, index));
                    }
                }
                '}' => return Err(malformed()),
                c => literal.push(c),
            }
        }

        if slots.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            source: source.to_string(),
            prefix: prefix.unwrap_or_default(),
            slots,
            suffix: literal,
        })
    }

    /// `{main}<sep>{sub}` without going through the parser.
    fn pair(separator: &str) -> Self {
        Self {
            source: format!("{{main}}{}{{sub}}", separator),
            prefix: String::new(),
            slots: vec![(String::new(), 0), (separator.to_string(), 1)],
            suffix: String::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fills the template; `None` when every referenced value is missing.
    pub fn render(&self, values: &[Option<String>]) -> Option<String> {
        let value = |index: usize| values.get(index).and_then(Option::as_ref);
        let last = self.slots.iter().rposition(|(_, index)| value(*index).is_some())?;

        let mut body = String::new();
        for (position, (sep, index)) in self.slots[..=last].iter().enumerate() {
            if position > 0 {
                body.push_str(sep);
            }
            if let Some(v) = value(*index) {
                body.push_str(v);
            }
        }
        Some(format!("{}{}{}", self.prefix, body, self.suffix))
    }
}

/// Numeric bounds read from a lower and an upper keyword, optionally with
/// `exclusiveMinimum`-style companions.
///
/// A numeric companion replaces its bound and makes it exclusive (2019-09
/// and later); `true` makes the plain bound exclusive (draft-07). Two
/// inclusive bounds with a non-negative lower bound render as `0-120`;
/// anything else renders as an interval with open ends at infinity, e.g.
/// `(0 ... 10]` or `[18 ... ∞)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub lower: String,
    pub upper: String,
    pub exclusive_lower: Option<String>,
    pub exclusive_upper: Option<String>,
}

impl Interval {
    pub fn inclusive(lower: &str, upper: &str) -> Self {
        Self {
            lower: lower.to_string(),
            upper: upper.to_string(),
            exclusive_lower: None,
            exclusive_upper: None,
        }
    }

    pub fn with_exclusive(lower: &str, upper: &str, exclusive_lower: &str, exclusive_upper: &str) -> Self {
        Self {
            exclusive_lower: Some(exclusive_lower.to_string()),
            exclusive_upper: Some(exclusive_upper.to_string()),
            ..Self::inclusive(lower, upper)
        }
    }

    /// Member keywords: lower, upper, then the exclusive companions.
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords = vec![self.lower.clone(), self.upper.clone()];
        keywords.extend(self.exclusive_lower.iter().cloned());
        keywords.extend(self.exclusive_upper.iter().cloned());
        keywords
    }

    /// `None` when neither bound is set.
    pub fn render<'v>(&self, value: &dyn Fn(&str) -> Option<&'v Value>) -> Option<String> {
        let companion = |keyword: &Option<String>| keyword.as_deref().and_then(value);
        let lower = bound(value(self.lower.as_str()), companion(&self.exclusive_lower));
        let upper = bound(value(self.upper.as_str()), companion(&self.exclusive_upper));

        match (lower, upper) {
            (None, None) => None,
            (Some((lo, true)), Some((hi, true))) if !lo.starts_with('-') => {
                Some(format!("{}-{}", lo, hi))
            }
            (lower, upper) => {
                let (open, lo) = match lower {
                    Some((lo, true)) => ('[', lo),
                    Some((lo, false)) => ('(', lo),
                    None => ('(', "-∞".to_string()),
                };
                let (close, hi) = match upper {
                    Some((hi, true)) => (']', hi),
                    Some((hi, false)) => (')', hi),
                    None => (')', "∞".to_string()),
                };
                Some(format!("{}{} ... {}{}", open, lo, hi, close))
            }
        }
    }
}

/// One side of an interval as `(text, inclusive)`.
fn bound(plain: Option<&Value>, exclusive: Option<&Value>) -> Option<(String, bool)> {
    let plain = plain.filter(|v| v.is_number());
    match exclusive {
        Some(n @ Value::Number(_)) => Some((to_compact(n), false)),
        Some(Value::Bool(true)) => plain.map(|v| (to_compact(v), false)),
        _ => plain.map(|v| (to_compact(v), true)),
    }
}

/// How a combined node turns member values into one display value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueFormat {
    Template(Template),
    Interval(Interval),
}

impl ValueFormat {
    /// Renders one side. `value` yields the member values of that side.
    pub fn render<'v>(
        &self,
        keywords: &[String],
        value: &dyn Fn(&str) -> Option<&'v Value>,
    ) -> Option<String> {
        match self {
            ValueFormat::Template(template) => {
                let values: Vec<Option<String>> = keywords
                    .iter()
                    .map(|k| value(k.as_str()).map(to_template_text))
                    .collect();
                template.render(&values)
            }
            ValueFormat::Interval(interval) => interval.render(value),
        }
    }
}

/// A named group of keywords displayed as one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationRule {
    pub keywords: Vec<String>,
    pub display_name: String,
    pub format: ValueFormat,
    pub policy: CombinePolicy,
}

impl CombinationRule {
    pub fn new<S: AsRef<str>>(
        keywords: &[S],
        display_name: impl Into<String>,
        template: &str,
        policy: CombinePolicy,
    ) -> Result<Self, ConfigError> {
        let display_name = display_name.into();
        let keywords: Vec<String> = keywords.iter().map(|k| k.as_ref().to_string()).collect();
        check_members(&display_name, &keywords)?;

        let template = Template::parse(&display_name, template, &keywords)?;
        Ok(Self {
            keywords,
            display_name,
            format: ValueFormat::Template(template),
            policy,
        })
    }

    /// A rule rendering its members as numeric bounds.
    pub fn interval(
        interval: Interval,
        display_name: impl Into<String>,
        policy: CombinePolicy,
    ) -> Result<Self, ConfigError> {
        let display_name = display_name.into();
        let keywords = interval.keywords();
        check_members(&display_name, &keywords)?;
        Ok(Self {
            keywords,
            display_name,
            format: ValueFormat::Interval(interval),
            policy,
        })
    }

    fn builtin_pair(keywords: [&str; 2], display_name: &str, separator: &str, policy: CombinePolicy) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            display_name: display_name.to_string(),
            format: ValueFormat::Template(Template::pair(separator)),
            policy,
        }
    }

    fn builtin_interval(interval: Interval, display_name: &str, policy: CombinePolicy) -> Self {
        Self {
            keywords: interval.keywords(),
            display_name: display_name.to_string(),
            format: ValueFormat::Interval(interval),
            policy,
        }
    }

    pub fn main_keyword(&self) -> &str {
        &self.keywords[0]
    }

    /// Rejects rules with a keyword that has no comparator, whose keywords
    /// compare values a template cannot format, or that mix numeric and
    /// non-numeric comparators.
    pub fn validate(&self, registry: &ComparatorRegistry) -> Result<(), ConfigError> {
        let mut first_class: Option<ValueClass> = None;
        for keyword in &self.keywords {
            let Some(strategy) = registry
                .resolve_keyword(keyword)
                .or_else(|| registry.fallback())
            else {
                return Err(ConfigError::CombinationRuleConflict {
                    rule: self.display_name.clone(),
                    keyword: keyword.clone(),
                    expected: "keyword or fallback".to_string(),
                    found: "none".to_string(),
                });
            };
            let class = strategy.value_class();
            if !class.is_templatable() {
                return Err(ConfigError::CombinationRuleConflict {
                    rule: self.display_name.clone(),
                    keyword: keyword.clone(),
                    expected: "scalar".to_string(),
                    found: class.name().to_string(),
                });
            }
            match first_class {
                Some(expected) if expected != class => {
                    return Err(ConfigError::CombinationRuleConflict {
                        rule: self.display_name.clone(),
                        keyword: keyword.clone(),
                        expected: expected.name().to_string(),
                        found: class.name().to_string(),
                    });
                }
                Some(_) => {}
                None => first_class = Some(class),
            }
        }
        Ok(())
    }
}

fn check_members(display_name: &str, keywords: &[String]) -> Result<(), ConfigError> {
    if display_name.is_empty() || keywords.iter().any(String::is_empty) {
        return Err(ConfigError::EmptyName {
            rule: display_name.to_string(),
        });
    }
    if keywords.len() < 2 {
        return Err(ConfigError::TooFewKeywords {
            rule: display_name.to_string(),
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = keywords.iter().find(|k| !seen.insert(k.as_str())) {
        return Err(ConfigError::DuplicateKeyword {
            rule: display_name.to_string(),
            keyword: dup.clone(),
        });
    }
    Ok(())
}

/// The combination rules enabled by default, in application order.
pub fn builtin_rules() -> Vec<CombinationRule> {
    let bounds = |interval: Interval, name: &str| {
        CombinationRule::builtin_interval(interval, name, CombinePolicy::change_only())
    };
    vec![
        CombinationRule::builtin_pair(["type", "format"], "type", "/", CombinePolicy::all()),
        bounds(
            Interval::with_exclusive("minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum"),
            "range",
        ),
        bounds(Interval::inclusive("minLength", "maxLength"), "rangeLength"),
        bounds(Interval::inclusive("minItems", "maxItems"), "rangeItems"),
        bounds(Interval::inclusive("minProperties", "maxProperties"), "rangeProperties"),
    ]
}

/// Applies combination rules to raw nodes.
pub struct Combiner<'t, 'a> {
    tree: &'t PropertyTree<'a>,
    rules: &'t [CombinationRule],
    filter: Option<&'t FilterConfig>,
}

impl<'t, 'a> Combiner<'t, 'a> {
    pub fn new(tree: &'t PropertyTree<'a>, rules: &'t [CombinationRule]) -> Self {
        Self {
            tree,
            rules,
            filter: None,
        }
    }

    /// Keywords the filter hides are never folded into a combined value.
    pub fn with_filter(mut self, filter: &'t FilterConfig) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Rules run in declaration order; a keyword absorbed by one rule is
    /// invisible to later rules at the same path.
    pub fn combine(&self, nodes: Vec<DiffNode>) -> Vec<DiffNode> {
        let mut slots: Vec<Option<DiffNode>> = nodes.into_iter().map(Some).collect();
        let mut absorbed: HashMap<Path, HashSet<String>> = HashMap::new();

        for rule in self.rules {
            let mut paths: Vec<Path> = Vec::new();
            for node in slots.iter().flatten() {
                if is_member(node, rule) && !paths.contains(&node.path) {
                    paths.push(node.path.clone());
                }
            }
            for path in paths {
                let taken = absorbed.entry(path.clone()).or_default();
                if let Some((index, node, keywords)) = self.apply(rule, &path, &slots, taken) {
                    for slot in slots.iter_mut() {
                        let absorbed_here = slot.as_ref().is_some_and(|n| {
                            n.path == path
                                && !n.is_combined()
                                && n.keyword.as_ref().is_some_and(|k| keywords.contains(k))
                        });
                        if absorbed_here {
                            *slot = None;
                        }
                    }
                    tracing::debug!(path = %path, rule = %rule.display_name, "combined keywords");
                    taken.extend(keywords);
                    slots[index] = Some(node);
                }
            }
        }

        slots.into_iter().flatten().collect()
    }

    /// Builds the combined node for `rule` at `path`, returning the slot it
    /// replaces and the keywords it absorbs.
    fn apply(
        &self,
        rule: &CombinationRule,
        path: &Path,
        slots: &[Option<DiffNode>],
        taken: &HashSet<String>,
    ) -> Option<(usize, DiffNode, Vec<String>)> {
        let scope = self.tree.scope(path);
        let present: Vec<String> = rule
            .keywords
            .iter()
            .filter(|k| !taken.contains(*k) && scope.contains(k))
            .filter(|k| {
                self.filter
                    .map_or(true, |f| f.should_include(&path.tokens(Some(k.as_str()))))
            })
            .cloned()
            .collect();
        if present.len() < 2 {
            return None;
        }

        let mut members: Vec<(usize, &DiffNode)> = Vec::new();
        for (index, node) in slots.iter().enumerate() {
            let Some(node) = node else { continue };
            let Some(keyword) = node.keyword.as_ref() else { continue };
            if node.path != *path || node.is_combined() || !present.contains(keyword) {
                continue;
            }
            // A present keyword with a node this rule cannot fold in would
            // otherwise be shown twice.
            if !is_member(node, rule) {
                return None;
            }
            members.push((index, node));
        }
        let (first, _) = *members.first()?;

        let group_op = members
            .iter()
            .map(|(_, n)| n.operation)
            .reduce(|a, b| if a == b { a } else { Operation::Changed })?;
        let main = rule.main_keyword();
        let allowed = match rule.policy.mode_for(group_op) {
            CombineMode::All => true,
            CombineMode::MainOnly => members.iter().any(|(_, n)| n.keyword.as_deref() == Some(main)),
            CombineMode::SubOnly => members.iter().any(|(_, n)| n.keyword.as_deref() != Some(main)),
            CombineMode::None => false,
        };
        if !allowed {
            return None;
        }

        // Members on opposite sides with nothing shared would render as one
        // value turning into another, hiding which keyword each came from.
        let mixed = members.iter().any(|(_, n)| n.operation != members[0].1.operation);
        let shared = present
            .iter()
            .any(|k| scope.old_value(k).is_some() && scope.new_value(k).is_some());
        if mixed && !shared && matches!(rule.format, ValueFormat::Template(_)) {
            return None;
        }

        let side = |get: &dyn Fn(&str) -> Option<&'a Value>| {
            rule.format.render(&rule.keywords, &|k: &str| {
                if present.iter().any(|p| p == k) {
                    get(k)
                } else {
                    None
                }
            })
        };
        let old_text = side(&|k: &str| scope.old_value(k));
        let new_text = side(&|k: &str| scope.new_value(k));
        if old_text == new_text {
            return None;
        }
        let operation = Operation::from_presence(old_text.is_some(), new_text.is_some())?;

        let mut node = DiffNode::new(
            path.clone(),
            Some(rule.display_name.clone()),
            operation,
            old_text.map(Value::String),
            new_text.map(Value::String),
        );
        node.absorbed = present.clone();
        Some((first, node, present))
    }
}

fn is_member(node: &DiffNode, rule: &CombinationRule) -> bool {
    !node.is_combined()
        && matches!(
            node.operation,
            Operation::Added | Operation::Removed | Operation::Changed
        )
        && node
            .keyword
            .as_ref()
            .is_some_and(|k| rule.keywords.contains(k))
}
