//! Rule-based routing: pattern matching, filter chains, and the
//! per-logger-name resolution cache

pub mod filter;
pub mod pattern;
pub mod rule;
pub mod table;

pub use filter::{
    FilterAction, FilterChain, FilterPredicate, FilterVerdict, LayoutMatchFilter, WhenFilter,
};
pub use pattern::NamePattern;
pub use rule::{Rule, RuleBuilder};
pub use table::{ResolvedRouting, RouteStep, RoutingTable};
