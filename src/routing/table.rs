//! Routing table: per-logger-name resolution cache
//!
//! Resolution walks the ordered rule list once per distinct logger
//! name and caches the result. Distinct names may resolve differently
//! even under the same patterns, so the cache key is the exact name.
//! Reconfiguration builds a whole new table and swaps the reference;
//! this table never mutates its rules.

use super::filter::FilterChain;
use super::rule::Rule;
use crate::core::log_level::{LevelSet, LogLevel};
use crate::core::target::Target;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// One (target, filter chain) pair on an event's route
#[derive(Clone)]
pub struct RouteStep {
    pub target: Arc<dyn Target>,
    pub filters: FilterChain,
}

/// The resolved route for one exact logger name
pub struct ResolvedRouting {
    /// Ordered steps per level, indexed by level ordinal
    steps: [Vec<RouteStep>; 6],
    /// Cheap summary: lowest level with at least one step
    min_enabled: Option<LogLevel>,
}

impl ResolvedRouting {
    pub fn steps_for(&self, level: LogLevel) -> &[RouteStep] {
        match level.ordinal() {
            Some(i) => &self.steps[i],
            None => &[],
        }
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        !self.steps_for(level).is_empty()
    }

    /// Lowest enabled level, letting a logger skip resolution work for
    /// levels below it
    pub fn min_enabled_level(&self) -> Option<LogLevel> {
        self.min_enabled
    }
}

pub struct RoutingTable {
    rules: Vec<Rule>,
    cache: RwLock<HashMap<String, Arc<ResolvedRouting>>>,
}

impl RoutingTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The ordered (target, filter chain) route for a logger name,
    /// cached per exact name
    pub fn resolve(&self, logger_name: &str) -> Arc<ResolvedRouting> {
        if let Some(resolved) = self.cache.read().get(logger_name) {
            return Arc::clone(resolved);
        }

        let resolved = Arc::new(self.build(logger_name));
        // A concurrent resolver may have inserted meanwhile; both
        // builds are identical, keep the first
        let mut cache = self.cache.write();
        Arc::clone(
            cache
                .entry(logger_name.to_string())
                .or_insert(resolved),
        )
    }

    pub fn is_enabled(&self, logger_name: &str, level: LogLevel) -> bool {
        self.resolve(logger_name).is_enabled(level)
    }

    /// Number of cached logger names (observability/testing)
    pub fn cached_names(&self) -> usize {
        self.cache.read().len()
    }

    /// The rule list this table was built from
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn build(&self, logger_name: &str) -> ResolvedRouting {
        let mut steps: [Vec<RouteStep>; 6] = Default::default();
        let mut finalized = LevelSet::EMPTY;

        Self::walk(&self.rules, logger_name, &mut finalized, &mut steps);

        let min_enabled = crate::core::log_level::LEVELS
            .into_iter()
            .find(|level| !steps[level.ordinal().expect("real level")].is_empty());

        ResolvedRouting { steps, min_enabled }
    }

    /// One pass over a rule list in declaration order. `finalized`
    /// accumulates levels that later rules must no longer see; the
    /// accumulation is monotonic, so the last matching rule that sets
    /// `final_min_level` determines the effective threshold from that
    /// point on.
    fn walk(
        rules: &[Rule],
        logger_name: &str,
        finalized: &mut LevelSet,
        steps: &mut [Vec<RouteStep>; 6],
    ) {
        for rule in rules {
            if !rule.name_pattern.matches(logger_name) {
                continue;
            }

            let contributed = rule.levels.intersect(finalized.complement());
            for level in contributed.iter() {
                let slot = &mut steps[level.ordinal().expect("real level")];
                for target in &rule.targets {
                    slot.push(RouteStep {
                        target: Arc::clone(target),
                        filters: rule.filters.clone(),
                    });
                }
            }

            // Children are walked right after the parent, before the
            // next sibling, sharing the same finalization state
            Self::walk(&rule.children, logger_name, finalized, steps);

            if rule.final_rule {
                // Scoped per level: only the levels this rule enables
                // stop evaluating; others keep going
                *finalized = finalized.union(rule.levels);
            }
            if let Some(threshold) = rule.final_min_level {
                *finalized = finalized.union(LevelSet::below(threshold));
            }
        }
    }
}
