//! Loggers and the factory that owns dispatch state
//!
//! A `LogFactory` owns the renderer registry, the rule list, the
//! routing table, and the internal diagnostics channel; construction
//! and teardown of every cache is tied to its lifecycle, so two
//! factories never share state. Loggers are cheap handles bound to a
//! name.

use super::diagnostics::Diagnostics;
use super::error::Result;
use super::log_event::LogEvent;
use super::log_level::LogLevel;
use super::property::PropertyBag;
use super::target::Target;
use crate::layout::{CompileMode, Layout, RendererRegistry};
use crate::routing::{ResolvedRouting, RoutingTable, Rule};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

struct FactoryShared {
    registry: RendererRegistry,
    /// Swapped wholesale on reconfiguration; a concurrent lookup sees
    /// either the fully-old or fully-new table
    table: RwLock<Arc<RoutingTable>>,
    diagnostics: Arc<Diagnostics>,
    compile_mode: CompileMode,
}

/// Owns routing configuration and hands out named loggers
///
/// # Example
///
/// ```
/// use rust_log_dispatch::prelude::*;
/// use rust_log_dispatch::targets::MemoryTarget;
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemoryTarget::new());
/// let factory = LogFactory::builder()
///     .rule(
///         Rule::builder("*")
///             .unwrap()
///             .min_level(LogLevel::Info)
///             .target(Arc::clone(&sink) as Arc<dyn Target>)
///             .build(),
///     )
///     .build();
///
/// let logger = factory.logger("App.Main");
/// logger.info("service started");
/// assert_eq!(sink.messages().len(), 1);
/// ```
pub struct LogFactory {
    shared: Arc<FactoryShared>,
}

impl LogFactory {
    #[must_use]
    pub fn builder() -> LogFactoryBuilder {
        LogFactoryBuilder::new()
    }

    /// A logger bound to `name`. Handles are cheap; routing for the
    /// name is resolved lazily and cached.
    pub fn logger(&self, name: impl Into<String>) -> Logger {
        Logger {
            name: name.into(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Replace the whole rule list atomically. In-flight events keep
    /// the table they resolved against; the per-name cache is
    /// discarded wholesale with the old table.
    pub fn reconfigure(&self, rules: Vec<Rule>) {
        let table = Arc::new(RoutingTable::new(rules));
        *self.shared.table.write() = table;
    }

    /// Compile a layout against this factory's registry and mode
    pub fn compile_layout(&self, template: &str) -> Result<Layout> {
        Layout::compile(template, &self.shared.registry, self.shared.compile_mode)
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.shared.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.shared.diagnostics
    }

    /// Flush every distinct target reachable from the current rules
    ///
    /// Returns the first failure after attempting all targets.
    pub fn flush_all(&self, timeout: Duration) -> Result<()> {
        let table = Arc::clone(&self.shared.table.read());
        let mut first_error = None;
        for target in unique_targets(table.rules()) {
            if let Err(err) = target.flush_timeout(timeout) {
                self.shared
                    .diagnostics
                    .report_target_error(target.name(), &err.to_string());
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Flush all targets within the timeout; queue consumers stop when
    /// their last reference drops
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.flush_all(timeout).is_ok()
    }
}

/// Distinct targets across a rule tree, in first-seen order
fn unique_targets(rules: &[Rule]) -> Vec<Arc<dyn Target>> {
    fn collect(rules: &[Rule], seen: &mut Vec<Arc<dyn Target>>) {
        for rule in rules {
            for target in &rule.targets {
                if !seen.iter().any(|known| Arc::ptr_eq(known, target)) {
                    seen.push(Arc::clone(target));
                }
            }
            collect(&rule.children, seen);
        }
    }
    let mut seen = Vec::new();
    collect(rules, &mut seen);
    seen
}

/// Builder for [`LogFactory`]
pub struct LogFactoryBuilder {
    registry: RendererRegistry,
    rules: Vec<Rule>,
    compile_mode: CompileMode,
    strict_diagnostics: bool,
}

impl LogFactoryBuilder {
    pub fn new() -> Self {
        Self {
            registry: RendererRegistry::with_defaults(),
            rules: Vec::new(),
            compile_mode: CompileMode::Strict,
            strict_diagnostics: false,
        }
    }

    /// Replace the renderer registry (default: the builtin set)
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Append a routing rule
    #[must_use = "builder methods return a new value"]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Replace the whole rule list
    #[must_use = "builder methods return a new value"]
    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    /// Layout compile mode (default: strict)
    #[must_use = "builder methods return a new value"]
    pub fn compile_mode(mut self, mode: CompileMode) -> Self {
        self.compile_mode = mode;
        self
    }

    /// Panic on internal pipeline errors instead of swallowing them.
    /// For test/debug use.
    #[must_use = "builder methods return a new value"]
    pub fn strict_diagnostics(mut self, strict: bool) -> Self {
        self.strict_diagnostics = strict;
        self
    }

    pub fn build(self) -> LogFactory {
        let diagnostics = Arc::new(Diagnostics::new());
        diagnostics.set_strict(self.strict_diagnostics);
        LogFactory {
            shared: Arc::new(FactoryShared {
                registry: self.registry,
                table: RwLock::new(Arc::new(RoutingTable::new(self.rules))),
                diagnostics,
                compile_mode: self.compile_mode,
            }),
        }
    }
}

impl Default for LogFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A named logging handle
///
/// Logging calls never return errors to the application and never
/// panic; failures are observable only via the factory's diagnostics
/// and per-event completions.
#[derive(Clone)]
pub struct Logger {
    name: String,
    shared: Arc<FactoryShared>,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether any target would receive an event at `level`; cheap, so
    /// call sites can skip building expensive messages
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.resolved().is_enabled(level)
    }

    fn resolved(&self) -> Arc<ResolvedRouting> {
        let table = Arc::clone(&self.shared.table.read());
        table.resolve(&self.name)
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let resolved = self.resolved();
        if !resolved.is_enabled(level) {
            return;
        }
        let event = Arc::new(LogEvent::new(&self.name, level, message));
        self.dispatch(&resolved, &event);
    }

    /// Log with structured properties attached
    pub fn log_with(&self, level: LogLevel, message: impl Into<String>, properties: PropertyBag) {
        let resolved = self.resolved();
        if !resolved.is_enabled(level) {
            return;
        }
        let event =
            Arc::new(LogEvent::new(&self.name, level, message).with_properties(properties));
        self.dispatch(&resolved, &event);
    }

    /// Dispatch a fully built event. The event's own logger name is
    /// used for routing, which may differ from this handle's name.
    pub fn log_event(&self, event: LogEvent) {
        let table = Arc::clone(&self.shared.table.read());
        let resolved = table.resolve(&event.logger_name);
        if !resolved.is_enabled(event.level) {
            return;
        }
        self.dispatch(&resolved, &Arc::new(event));
    }

    /// Walk the resolved route: evaluate each step's filter chain,
    /// write allowed events, and honor chain-level stop signals. A
    /// failure at one target never aborts dispatch to the others.
    fn dispatch(&self, resolved: &ResolvedRouting, event: &Arc<LogEvent>) {
        for step in resolved.steps_for(event.level) {
            let verdict = step.filters.evaluate(event, &self.shared.diagnostics);
            if verdict.allows() {
                if let Err(err) = step.target.write(event) {
                    self.shared
                        .diagnostics
                        .report_target_error(step.target.name(), &err.to_string());
                }
            }
            if verdict.stops() {
                break;
            }
        }
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }
}
