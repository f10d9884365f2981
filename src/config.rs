//! Engine configuration.
//!
//! An [`EngineConfig`] bundles every table the pipeline reads: comparison
//! rules, combination rules, context rules, rendering options and path
//! filters. It is built once through [`ConfigBuilder`], validated, and then
//! only ever borrowed.
//!
//! # Examples
//!
//! ```
//! use jsonschema_diff::{ConfigBuilder, ContextRule};
//!
//! let config = ConfigBuilder::new()
//!     .builtin_combinations(false)
//!     .context_rule(ContextRule::directed("title", &["description"]).unwrap())
//!     .indent(4)
//!     .build()
//!     .unwrap();
//! assert!(config.combinations().is_empty());
//! assert_eq!(config.format().indent, 4);
//! ```

use crate::combine::{self, CombinationRule};
use crate::compare::{ComparatorRegistry, ComparisonRule, StrategyKind};
use crate::context::{self, ContextRule};
use crate::error::ConfigError;
use crate::filter::FilterConfig;

/// Options that shape rendered lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces before nested element lines
    pub indent: usize,
    /// Render added/removed subschemas as one line per keyword instead of
    /// a single inline value
    pub expand_composites: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            expand_composites: false,
        }
    }
}

/// Validated, read-only configuration shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    registry: ComparatorRegistry,
    combinations: Vec<CombinationRule>,
    context_rules: Vec<ContextRule>,
    format: FormatOptions,
    filter: FilterConfig,
}

impl EngineConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn registry(&self) -> &ComparatorRegistry {
        &self.registry
    }

    pub fn combinations(&self) -> &[CombinationRule] {
        &self.combinations
    }

    pub fn context_rules(&self) -> &[ContextRule] {
        &self.context_rules
    }

    pub fn format(&self) -> &FormatOptions {
        &self.format
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }
}

impl Default for EngineConfig {
    /// Built-in rules only. These are known to be valid, so the builder's
    /// checks are skipped.
    fn default() -> Self {
        Self {
            registry: ComparatorRegistry::builtin(),
            combinations: combine::builtin_rules(),
            context_rules: context::builtin_rules(),
            format: FormatOptions::default(),
            filter: FilterConfig::default(),
        }
    }
}

/// Builder for [`EngineConfig`].
///
/// User rules are appended after the built-ins, so a user comparison rule
/// wins over a built-in of the same precedence tier.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    builtin_comparators: bool,
    builtin_combinations: bool,
    builtin_context: bool,
    default_comparator: bool,
    comparison_rules: Vec<ComparisonRule>,
    combinations: Vec<CombinationRule>,
    context_rules: Vec<ContextRule>,
    format: FormatOptions,
    filter: FilterConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            builtin_comparators: true,
            builtin_combinations: true,
            builtin_context: true,
            default_comparator: true,
            comparison_rules: Vec::new(),
            combinations: Vec::new(),
            context_rules: Vec::new(),
            format: FormatOptions::default(),
            filter: FilterConfig::default(),
        }
    }

    pub fn comparison_rule(mut self, rule: ComparisonRule) -> Self {
        self.comparison_rules.push(rule);
        self
    }

    pub fn combination_rule(mut self, rule: CombinationRule) -> Self {
        self.combinations.push(rule);
        self
    }

    pub fn context_rule(mut self, rule: ContextRule) -> Self {
        self.context_rules.push(rule);
        self
    }

    pub fn builtin_comparators(mut self, enabled: bool) -> Self {
        self.builtin_comparators = enabled;
        self
    }

    pub fn builtin_combinations(mut self, enabled: bool) -> Self {
        self.builtin_combinations = enabled;
        self
    }

    pub fn builtin_context(mut self, enabled: bool) -> Self {
        self.builtin_context = enabled;
        self
    }

    /// Whether keywords no rule covers fall back to whole-value comparison.
    /// Without it they come out as undefined, and every combination rule
    /// keyword needs a keyword rule of its own or the build fails.
    pub fn default_comparator(mut self, enabled: bool) -> Self {
        self.default_comparator = enabled;
        self
    }

    pub fn indent(mut self, width: usize) -> Self {
        self.format.indent = width;
        self
    }

    pub fn expand_composites(mut self, enabled: bool) -> Self {
        self.format.expand_composites = enabled;
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.filter = self.filter.ignore(pattern);
        self
    }

    pub fn only(mut self, pattern: &str) -> Self {
        self.filter = self.filter.only(pattern);
        self
    }

    /// Validates every rule and freezes the configuration.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        if self.format.indent == 0 {
            return Err(ConfigError::InvalidIndent);
        }

        let fallback = self.default_comparator.then_some(StrategyKind::Default);
        let mut registry = if self.builtin_comparators {
            let mut registry = ComparatorRegistry::builtin();
            registry.set_fallback(fallback);
            registry
        } else {
            ComparatorRegistry::new(fallback)
        };
        for rule in self.comparison_rules {
            registry.register(rule)?;
        }

        let mut combinations = if self.builtin_combinations {
            combine::builtin_rules()
        } else {
            Vec::new()
        };
        combinations.extend(self.combinations);
        for rule in &combinations {
            rule.validate(&registry)?;
        }

        let mut context_rules = if self.builtin_context {
            context::builtin_rules()
        } else {
            Vec::new()
        };
        for rule in &self.context_rules {
            rule.validate()?;
        }
        context_rules.extend(self.context_rules);

        tracing::debug!(
            comparison_rules = registry.rules().len(),
            combinations = combinations.len(),
            context_rules = context_rules.len(),
            "engine configuration built"
        );

        Ok(EngineConfig {
            registry,
            combinations,
            context_rules,
            format: self.format,
            filter: self.filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::CombinePolicy;
    use crate::tree::JsonType;

    #[test]
    fn test_default_matches_builder() {
        let built = ConfigBuilder::new().build().unwrap();
        let default = EngineConfig::default();
        assert_eq!(built.combinations(), default.combinations());
        assert_eq!(built.context_rules(), default.context_rules());
        assert_eq!(built.registry().rules(), default.registry().rules());
        assert_eq!(built.format(), default.format());
    }

    #[test]
    fn test_disable_builtins() {
        let config = ConfigBuilder::new()
            .builtin_comparators(false)
            .builtin_combinations(false)
            .builtin_context(false)
            .default_comparator(false)
            .build()
            .unwrap();
        assert!(config.registry().rules().is_empty());
        assert!(config.registry().fallback().is_none());
        assert!(config.combinations().is_empty());
        assert!(config.context_rules().is_empty());
    }

    #[test]
    fn test_user_rule_shadows_builtin() {
        let config = ConfigBuilder::new()
            .comparison_rule(ComparisonRule::keyword("maximum", StrategyKind::Default))
            .build()
            .unwrap();
        let resolved = config
            .registry()
            .resolve("maximum", Some(JsonType::Integer), Some(JsonType::Integer))
            .unwrap();
        assert_eq!(resolved.strategy, StrategyKind::Default);
    }

    #[test]
    fn test_invalid_indent() {
        assert_eq!(
            ConfigBuilder::new().indent(0).build().unwrap_err(),
            ConfigError::InvalidIndent
        );
    }

    #[test]
    fn test_conflicting_combination_fails_build() {
        let rule = CombinationRule::new(
            &["required", "title"],
            "req",
            "{main} {sub}",
            CombinePolicy::all(),
        )
        .unwrap();
        let err = ConfigBuilder::new()
            .comparison_rule(ComparisonRule::keyword("required", StrategyKind::List))
            .combination_rule(rule)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::CombinationRuleConflict { .. }));
    }

    #[test]
    fn test_combination_keyword_needs_a_comparator() {
        let err = ConfigBuilder::new()
            .default_comparator(false)
            .build()
            .unwrap_err();
        match err {
            ConfigError::CombinationRuleConflict { rule, keyword, .. } => {
                assert_eq!(rule, "type");
                assert_eq!(keyword, "type");
            }
            other => panic!("unexpected error: {other}"),
        }

        let config = ConfigBuilder::new()
            .default_comparator(false)
            .comparison_rule(ComparisonRule::keyword("type", StrategyKind::Default))
            .comparison_rule(ComparisonRule::keyword("format", StrategyKind::Default))
            .build()
            .unwrap();
        assert_eq!(config.combinations().len(), 5);
    }

    #[test]
    fn test_filters_carried() {
        let config = ConfigBuilder::new().ignore("**.description").build().unwrap();
        assert!(config.filter().has_filters());
    }
}
