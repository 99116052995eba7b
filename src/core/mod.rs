//! Core dispatch types and traits

pub mod diagnostics;
pub mod error;
pub mod log_event;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod property;
pub mod target;

pub use diagnostics::Diagnostics;
pub use error::{DispatchError, Result};
pub use log_event::{CallSite, LayoutCache, LogEvent};
pub use log_level::{LevelSet, LogLevel, LEVELS};
pub use logger::{LogFactory, LogFactoryBuilder, Logger};
pub use metrics::QueueMetrics;
pub use property::{PropertyBag, PropertyValue};
pub use target::{Completion, Target};
