//! Filter chain evaluation within one rule
//!
//! A chain is an ordered list of (predicate, action) pairs. The first
//! predicate that evaluates true decides the outcome; a predicate
//! error is treated as Neutral and reported to diagnostics, never
//! aborting dispatch.

use crate::core::diagnostics::Diagnostics;
use crate::core::error::Result;
use crate::core::log_event::LogEvent;
use crate::layout::Layout;
use std::fmt;
use std::sync::Arc;

/// Action taken when a filter's predicate matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterAction {
    /// Allow the event to this rule's targets
    #[default]
    Log,
    /// Deny the event for this rule
    Ignore,
    /// Allow, and stop evaluating further rules for this event
    LogFinal,
    /// Deny, and stop evaluating further rules for this event
    IgnoreFinal,
    /// No decision; continue with the next filter
    Neutral,
}

impl fmt::Display for FilterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FilterAction::Log => "Log",
            FilterAction::Ignore => "Ignore",
            FilterAction::LogFinal => "LogFinal",
            FilterAction::IgnoreFinal => "IgnoreFinal",
            FilterAction::Neutral => "Neutral",
        };
        write!(f, "{}", text)
    }
}

/// Outcome of evaluating a chain for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Allow,
    Deny,
    /// Allow, then stop walking the remaining route steps
    AllowAndStop,
    /// Deny, then stop walking the remaining route steps
    DenyAndStop,
}

impl FilterVerdict {
    pub fn allows(&self) -> bool {
        matches!(self, FilterVerdict::Allow | FilterVerdict::AllowAndStop)
    }

    pub fn stops(&self) -> bool {
        matches!(self, FilterVerdict::AllowAndStop | FilterVerdict::DenyAndStop)
    }

    fn from_action(action: FilterAction) -> FilterVerdict {
        match action {
            FilterAction::Log | FilterAction::Neutral => FilterVerdict::Allow,
            FilterAction::Ignore => FilterVerdict::Deny,
            FilterAction::LogFinal => FilterVerdict::AllowAndStop,
            FilterAction::IgnoreFinal => FilterVerdict::DenyAndStop,
        }
    }
}

pub trait FilterPredicate: Send + Sync {
    fn apply(&self, event: &LogEvent) -> Result<bool>;
    fn name(&self) -> &str;
}

/// Closure-backed predicate
pub struct WhenFilter {
    name: String,
    predicate: Box<dyn Fn(&LogEvent) -> Result<bool> + Send + Sync>,
}

impl WhenFilter {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(move |event| Ok(predicate(event))),
        }
    }

    /// Closure that may itself fail; failures count as Neutral
    pub fn fallible<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&LogEvent) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl FilterPredicate for WhenFilter {
    fn apply(&self, event: &LogEvent) -> Result<bool> {
        (self.predicate)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Renders a layout for the event and compares it to a literal value
pub struct LayoutMatchFilter {
    layout: Layout,
    expected: String,
}

impl LayoutMatchFilter {
    pub fn new(layout: Layout, expected: impl Into<String>) -> Self {
        Self {
            layout,
            expected: expected.into(),
        }
    }
}

impl FilterPredicate for LayoutMatchFilter {
    fn apply(&self, event: &LogEvent) -> Result<bool> {
        Ok(self.layout.render(event) == self.expected)
    }

    fn name(&self) -> &str {
        "layout-match"
    }
}

/// Ordered (predicate, action) pairs plus the two default actions
#[derive(Clone, Default)]
pub struct FilterChain {
    entries: Vec<(Arc<dyn FilterPredicate>, FilterAction)>,
    default_action: FilterAction,
    empty_default_action: FilterAction,
}

impl FilterChain {
    /// An empty chain; both defaults are `Log`
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter<P>(mut self, predicate: P, action: FilterAction) -> Self
    where
        P: FilterPredicate + 'static,
    {
        self.entries.push((Arc::new(predicate), action));
        self
    }

    #[must_use]
    pub fn with_shared_filter(
        mut self,
        predicate: Arc<dyn FilterPredicate>,
        action: FilterAction,
    ) -> Self {
        self.entries.push((predicate, action));
        self
    }

    /// Action applied when no predicate matches (default `Log`)
    #[must_use]
    pub fn with_default_action(mut self, action: FilterAction) -> Self {
        self.default_action = action;
        self
    }

    /// Action applied when the chain has no filters at all (default `Log`)
    #[must_use]
    pub fn with_empty_default_action(mut self, action: FilterAction) -> Self {
        self.empty_default_action = action;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn evaluate(&self, event: &LogEvent, diagnostics: &Diagnostics) -> FilterVerdict {
        if self.entries.is_empty() {
            return FilterVerdict::from_action(self.empty_default_action);
        }

        for (predicate, action) in &self.entries {
            match predicate.apply(event) {
                Ok(true) => match action {
                    FilterAction::Neutral => continue,
                    decided => return FilterVerdict::from_action(*decided),
                },
                Ok(false) => continue,
                Err(err) => {
                    diagnostics.report_filter_error(predicate.name(), &err.to_string());
                    continue;
                }
            }
        }

        FilterVerdict::from_action(self.default_action)
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.entries.len())
            .field("default_action", &self.default_action)
            .field("empty_default_action", &self.empty_default_action)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DispatchError;
    use crate::core::log_level::LogLevel;

    fn event(message: &str) -> LogEvent {
        LogEvent::new("App", LogLevel::Info, message)
    }

    fn diag() -> Diagnostics {
        Diagnostics::new()
    }

    #[test]
    fn test_empty_chain_uses_empty_default() {
        let chain = FilterChain::new();
        assert_eq!(chain.evaluate(&event("x"), &diag()), FilterVerdict::Allow);

        let deny_when_empty =
            FilterChain::new().with_empty_default_action(FilterAction::Ignore);
        assert_eq!(
            deny_when_empty.evaluate(&event("x"), &diag()),
            FilterVerdict::Deny
        );
    }

    #[test]
    fn test_first_matching_predicate_decides() {
        let chain = FilterChain::new()
            .with_filter(
                WhenFilter::new("is-x", |e| e.message_template == "x"),
                FilterAction::Ignore,
            )
            .with_default_action(FilterAction::Log);

        assert_eq!(chain.evaluate(&event("x"), &diag()), FilterVerdict::Deny);
        assert_eq!(chain.evaluate(&event("y"), &diag()), FilterVerdict::Allow);
    }

    #[test]
    fn test_final_actions_stop() {
        let allow_stop = FilterChain::new().with_filter(
            WhenFilter::new("any", |_| true),
            FilterAction::LogFinal,
        );
        let verdict = allow_stop.evaluate(&event("x"), &diag());
        assert!(verdict.allows());
        assert!(verdict.stops());

        let deny_stop = FilterChain::new().with_filter(
            WhenFilter::new("any", |_| true),
            FilterAction::IgnoreFinal,
        );
        let verdict = deny_stop.evaluate(&event("x"), &diag());
        assert!(!verdict.allows());
        assert!(verdict.stops());
    }

    #[test]
    fn test_neutral_continues_to_next_filter() {
        let chain = FilterChain::new()
            .with_filter(WhenFilter::new("noop", |_| true), FilterAction::Neutral)
            .with_filter(WhenFilter::new("deny", |_| true), FilterAction::Ignore);
        assert_eq!(chain.evaluate(&event("x"), &diag()), FilterVerdict::Deny);
    }

    #[test]
    fn test_predicate_error_treated_as_neutral() {
        let diagnostics = diag();
        let chain = FilterChain::new()
            .with_filter(
                WhenFilter::fallible("broken", |_| {
                    Err(DispatchError::other("predicate exploded"))
                }),
                FilterAction::Ignore,
            )
            .with_default_action(FilterAction::Log);

        assert_eq!(
            chain.evaluate(&event("x"), &diagnostics),
            FilterVerdict::Allow
        );
        assert_eq!(diagnostics.filter_error_count(), 1);
    }

    #[test]
    fn test_layout_match_filter() {
        use crate::layout::{CompileMode, RendererRegistry};

        let registry = RendererRegistry::with_defaults();
        let layout = Layout::compile("${message}", &registry, CompileMode::Strict).unwrap();
        let chain = FilterChain::new()
            .with_filter(LayoutMatchFilter::new(layout, "x"), FilterAction::Ignore);

        assert_eq!(chain.evaluate(&event("x"), &diag()), FilterVerdict::Deny);
        assert_eq!(chain.evaluate(&event("y"), &diag()), FilterVerdict::Allow);
    }
}
