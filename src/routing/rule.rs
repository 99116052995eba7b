//! Routing rules
//!
//! A rule maps a logger-name pattern and a level set to an ordered
//! target list plus a filter chain. Rules are immutable once built; a
//! reconfiguration replaces the whole list, never mutates it in place.

use super::filter::FilterChain;
use super::pattern::NamePattern;
use crate::core::error::Result;
use crate::core::log_level::{LevelSet, LogLevel};
use crate::core::target::Target;
use std::sync::Arc;

#[derive(Clone)]
pub struct Rule {
    pub name_pattern: NamePattern,
    pub levels: LevelSet,
    /// Shared references: multiple rules may point at the same target
    /// instance; a target is never deep-copied
    pub targets: Vec<Arc<dyn Target>>,
    pub filters: FilterChain,
    /// Stops further rule evaluation for exactly the levels this rule
    /// enables
    pub final_rule: bool,
    /// Finalizes all levels strictly below this threshold after the
    /// rule's own contribution, so later rules no longer see them
    pub final_min_level: Option<LogLevel>,
    /// Walked, in order, right after this rule matches and before the
    /// next sibling
    pub children: Vec<Rule>,
}

impl Rule {
    /// Start building a rule for a pattern string. Fails on malformed
    /// wildcard placement.
    pub fn builder(pattern: &str) -> Result<RuleBuilder> {
        Ok(RuleBuilder {
            name_pattern: NamePattern::parse(pattern)?,
            levels: LevelSet::ALL,
            targets: Vec::new(),
            filters: FilterChain::new(),
            final_rule: false,
            final_min_level: None,
            children: Vec::new(),
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name_pattern", &self.name_pattern)
            .field("levels", &self.levels)
            .field("targets", &self.targets.len())
            .field("final_rule", &self.final_rule)
            .field("final_min_level", &self.final_min_level)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Fluent builder for [`Rule`]
///
/// # Example
///
/// ```
/// use rust_log_dispatch::routing::Rule;
/// use rust_log_dispatch::targets::NullTarget;
/// use rust_log_dispatch::LogLevel;
/// use std::sync::Arc;
///
/// let rule = Rule::builder("Service.*")
///     .unwrap()
///     .min_level(LogLevel::Info)
///     .target(Arc::new(NullTarget::new()))
///     .final_rule(true)
///     .build();
/// assert!(rule.final_rule);
/// ```
pub struct RuleBuilder {
    name_pattern: NamePattern,
    levels: LevelSet,
    targets: Vec<Arc<dyn Target>>,
    filters: FilterChain,
    final_rule: bool,
    final_min_level: Option<LogLevel>,
    children: Vec<Rule>,
}

impl RuleBuilder {
    /// Replace the enabled level set (default: all levels)
    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: LevelSet) -> Self {
        self.levels = levels;
        self
    }

    /// Enable all levels at or above `min`
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, min: LogLevel) -> Self {
        self.levels = LevelSet::from_min(min);
        self
    }

    /// Add a single enabled level to the set built so far
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        if self.levels == LevelSet::ALL {
            self.levels = LevelSet::EMPTY;
        }
        self.levels = self.levels.with(level);
        self
    }

    /// Add a target (shared reference)
    #[must_use = "builder methods return a new value"]
    pub fn target(mut self, target: Arc<dyn Target>) -> Self {
        self.targets.push(target);
        self
    }

    /// Set the filter chain
    #[must_use = "builder methods return a new value"]
    pub fn filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Stop further rule evaluation for the levels this rule enables
    #[must_use = "builder methods return a new value"]
    pub fn final_rule(mut self, final_rule: bool) -> Self {
        self.final_rule = final_rule;
        self
    }

    /// Finalize levels strictly below `threshold` for later rules
    #[must_use = "builder methods return a new value"]
    pub fn final_min_level(mut self, threshold: LogLevel) -> Self {
        self.final_min_level = Some(threshold);
        self
    }

    /// Append a child rule
    #[must_use = "builder methods return a new value"]
    pub fn child(mut self, rule: Rule) -> Self {
        self.children.push(rule);
        self
    }

    pub fn build(self) -> Rule {
        Rule {
            name_pattern: self.name_pattern,
            levels: self.levels,
            targets: self.targets,
            filters: self.filters,
            final_rule: self.final_rule,
            final_min_level: self.final_min_level,
            children: self.children,
        }
    }
}
