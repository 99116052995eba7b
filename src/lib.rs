//! # Rust Log Dispatch
//!
//! A high-performance log dispatch core: rule-based routing, template
//! layouts, and asynchronous delivery with backpressure.
//!
//! ## Features
//!
//! - **Template Layouts**: compact `${...}` templates compiled once,
//!   rendered per event into reusable buffers
//! - **Rule Routing**: wildcard logger-name matching with per-level
//!   final semantics and cached resolution
//! - **Async Dispatch**: bounded queues with discard/grow/block
//!   overflow policies, flush barriers, and clean shutdown
//! - **Thread Safe**: many producers, one consumer per queue; FIFO
//!   delivery to every wrapped sink

pub mod core;
pub mod layout;
pub mod macros;
pub mod queue;
pub mod routing;
pub mod targets;

pub mod prelude {
    pub use crate::core::{
        Completion, DispatchError, Diagnostics, LevelSet, LogEvent, LogFactory,
        LogFactoryBuilder, LogLevel, Logger, PropertyBag, PropertyValue, QueueMetrics, Result,
        Target,
    };
    pub use crate::layout::{CompileMode, Layout, RendererRegistry};
    pub use crate::queue::{AsyncQueueTarget, OverflowPolicy, RetryTarget};
    pub use crate::routing::{
        FilterAction, FilterChain, FilterVerdict, NamePattern, Rule, RuleBuilder,
    };
}

pub use crate::core::{
    CallSite, Completion, DispatchError, Diagnostics, LevelSet, LogEvent, LogFactory,
    LogFactoryBuilder, LogLevel, Logger, PropertyBag, PropertyValue, QueueMetrics, Result, Target,
    LEVELS,
};
pub use crate::layout::{
    CompileMode, Layout, ParamValue, Renderer, RendererConfig, RendererRegistry, RendererSpec,
    TextTransform,
};
pub use crate::queue::{AsyncQueueTarget, OverflowPolicy, RetryTarget, DEFAULT_SHUTDOWN_TIMEOUT};
pub use crate::routing::{
    FilterAction, FilterChain, FilterPredicate, FilterVerdict, LayoutMatchFilter, NamePattern,
    Rule, RuleBuilder, RoutingTable, WhenFilter,
};
