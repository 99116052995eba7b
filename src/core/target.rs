//! Target trait for log output destinations
//!
//! Targets are shared (`Arc`) across rules, so writes take `&self`;
//! implementations own their interior locking. The async queue wrapper
//! and the retry layer implement this same contract, so they compose
//! transparently around any concrete target.

use super::{error::Result, log_event::LogEvent};
use std::sync::Arc;

/// Per-event completion callback. Fires exactly once, with the final
/// outcome of the delivery (success or failure). Queue wrappers invoke
/// it from the consumer thread after the inner target acknowledges.
pub type Completion = Box<dyn FnOnce(Result<()>) + Send + 'static>;

pub trait Target: Send + Sync {
    /// Deliver one event synchronously.
    fn write(&self, event: &Arc<LogEvent>) -> Result<()>;

    /// Deliver one event, reporting the outcome through `completion`.
    ///
    /// The default implementation delivers synchronously and completes
    /// immediately; queue wrappers override this to defer delivery.
    fn write_with_completion(&self, event: Arc<LogEvent>, completion: Completion) {
        let result = self.write(&event);
        completion(result);
    }

    /// Flush buffered output. Must not return before previously written
    /// events are durable at this target's layer.
    fn flush(&self) -> Result<()>;

    /// Flush with a deadline. Targets that cannot bound their flush
    /// (most synchronous sinks) ignore the timeout; queue wrappers
    /// honor it and surface expiry as a timeout error without aborting
    /// the in-flight delivery.
    fn flush_timeout(&self, _timeout: std::time::Duration) -> Result<()> {
        self.flush()
    }

    /// Pre-render any non-thread-agnostic layouts into the event's
    /// layout cache, on the calling thread. Queue wrappers call this
    /// before a cross-thread handoff. Default: nothing to pre-render.
    fn precalculate(&self, _event: &LogEvent) {}

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use parking_lot::Mutex;

    struct CountingTarget {
        writes: Mutex<usize>,
    }

    impl Target for CountingTarget {
        fn write(&self, _event: &Arc<LogEvent>) -> Result<()> {
            *self.writes.lock() += 1;
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_default_write_with_completion_fires_once() {
        let target = CountingTarget {
            writes: Mutex::new(0),
        };
        let event = Arc::new(LogEvent::new("App", LogLevel::Info, "m"));

        let fired = Arc::new(Mutex::new(0));
        let fired_clone = Arc::clone(&fired);
        target.write_with_completion(
            event,
            Box::new(move |result| {
                assert!(result.is_ok());
                *fired_clone.lock() += 1;
            }),
        );

        assert_eq!(*fired.lock(), 1);
        assert_eq!(*target.writes.lock(), 1);
    }
}
