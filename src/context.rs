//! Context entries shown next to real changes.
//!
//! A changed `type` is easier to read when the unchanged `format` beside it
//! is shown too. Rules say which keywords explain which; the resolver adds
//! every keyword reachable from a change through those rules, reading values
//! from the schema objects themselves rather than from rendered output.

use crate::diff::DiffNode;
use crate::error::ConfigError;
use crate::filter::FilterConfig;
use crate::path::Path;
use crate::walker::{is_container_keyword, PropertyTree};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextRule {
    /// Any member pulls in every other member.
    Clique { keywords: Vec<String> },
    /// `trigger` pulls in each of `dependents`, in order.
    Directed {
        trigger: String,
        dependents: Vec<String>,
    },
}

impl ContextRule {
    pub fn clique<S: AsRef<str>>(keywords: &[S]) -> Result<Self, ConfigError> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.as_ref().to_string()).collect();
        let rule = ContextRule::Clique { keywords };
        rule.validate()?;
        Ok(rule)
    }

    pub fn directed<S: AsRef<str>>(trigger: &str, dependents: &[S]) -> Result<Self, ConfigError> {
        let rule = ContextRule::Directed {
            trigger: trigger.to_string(),
            dependents: dependents.iter().map(|k| k.as_ref().to_string()).collect(),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::InvalidContextRule { message });
        match self {
            ContextRule::Clique { keywords } => {
                if keywords.len() < 2 {
                    return invalid(format!("clique {:?} needs at least two keywords", keywords));
                }
                if keywords.iter().any(String::is_empty) {
                    return invalid("clique contains an empty keyword".to_string());
                }
            }
            ContextRule::Directed { trigger, dependents } => {
                if trigger.is_empty() || dependents.iter().any(String::is_empty) {
                    return invalid("directed rule contains an empty keyword".to_string());
                }
                if dependents.is_empty() {
                    return invalid(format!("'{}' has no dependents", trigger));
                }
                if dependents.contains(trigger) {
                    return invalid(format!("'{}' lists itself as a dependent", trigger));
                }
            }
        }
        Ok(())
    }

    /// Keywords this rule adds when `keyword` is part of the output.
    fn dependents_of<'r>(&'r self, keyword: &'r str) -> Box<dyn Iterator<Item = &'r String> + 'r> {
        match self {
            ContextRule::Clique { keywords } if keywords.iter().any(|k| k == keyword) => {
                Box::new(keywords.iter().filter(move |k| *k != keyword))
            }
            ContextRule::Directed { trigger, dependents } if trigger == keyword => {
                Box::new(dependents.iter())
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn is_clique(&self) -> bool {
        matches!(self, ContextRule::Clique { .. })
    }
}

/// Built-in context rules: cliques first, then directed rules.
pub fn builtin_rules() -> Vec<ContextRule> {
    let directed = |trigger: &str, dependents: &[&str]| ContextRule::Directed {
        trigger: trigger.to_string(),
        dependents: dependents.iter().map(|d| d.to_string()).collect(),
    };
    let clique = |keywords: &[&str]| ContextRule::Clique {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    };
    vec![
        clique(&["readOnly", "writeOnly"]),
        clique(&["minContains", "maxContains"]),
        clique(&["exclusiveMinimum", "exclusiveMaximum"]),
        directed("type", &["format"]),
        directed("format", &["type"]),
        directed("pattern", &["type"]),
        directed("multipleOf", &["type"]),
        directed("contentMediaType", &["type", "contentEncoding"]),
        directed("contentEncoding", &["type", "contentMediaType"]),
        directed("contains", &["minContains", "maxContains"]),
        directed("uniqueItems", &["type"]),
        directed("enum", &["type"]),
        directed("const", &["type"]),
        directed("minimum", &["maximum"]),
        directed("maximum", &["minimum"]),
    ]
}

/// Attaches context nodes after the changes that need them.
pub struct ContextResolver<'t, 'a> {
    tree: &'t PropertyTree<'a>,
    rules: &'t [ContextRule],
    filter: Option<&'t FilterConfig>,
}

impl<'t, 'a> ContextResolver<'t, 'a> {
    pub fn new(tree: &'t PropertyTree<'a>, rules: &'t [ContextRule]) -> Self {
        Self {
            tree,
            rules,
            filter: None,
        }
    }

    /// Hidden locations are not shown as context either.
    pub fn with_filter(mut self, filter: &'t FilterConfig) -> Self {
        self.filter = Some(filter);
        self
    }

    fn is_hidden(&self, path: &Path, keyword: &str) -> bool {
        self.filter
            .is_some_and(|f| !f.should_include(&path.tokens(Some(keyword))))
    }

    /// Returns the changes in their original order, each followed by the
    /// context it pulls in. A keyword already present in the output, as a
    /// change or as context, is never added again.
    pub fn resolve(&self, nodes: Vec<DiffNode>) -> Vec<DiffNode> {
        let mut seen: HashSet<(Path, String)> = nodes
            .iter()
            .flat_map(|n| n.keywords().into_iter().map(|k| (n.path.clone(), k.to_string())))
            .collect();

        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            let path = node.path.clone();
            let mut queue: VecDeque<String> =
                node.keywords().into_iter().map(str::to_string).collect();
            out.push(node);

            let scope = self.tree.scope(&path);
            while let Some(keyword) = queue.pop_front() {
                let cliques = self.rules.iter().filter(|r| r.is_clique());
                let directed = self.rules.iter().filter(|r| !r.is_clique());
                for dependent in cliques.chain(directed).flat_map(|r| r.dependents_of(&keyword)) {
                    if is_container_keyword(dependent) || self.is_hidden(&path, dependent) {
                        continue;
                    }
                    let key = (path.clone(), dependent.clone());
                    if seen.contains(&key) {
                        continue;
                    }
                    let Some(value) = scope.value(dependent) else {
                        continue;
                    };
                    tracing::trace!(path = %path, keyword = %dependent, trigger = %keyword, "context added");
                    seen.insert(key);
                    out.push(DiffNode::context(path.clone(), dependent.as_str(), value.clone()));
                    queue.push_back(dependent.clone());
                }
            }
        }
        out
    }
}
