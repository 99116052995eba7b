//! Retry layer for unreliable targets
//!
//! Composable wrapper implementing the same [`Target`] contract: on an
//! inner write failure it re-attempts up to a fixed count with an
//! inter-attempt delay. Attempts run inline on the calling thread, so
//! events destined for the same target are never reordered. Typically
//! layered beneath an async queue so the delays land on the consumer
//! thread, not on producers.

use crate::core::error::Result;
use crate::core::log_event::LogEvent;
use crate::core::target::Target;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct RetryTarget {
    inner: Arc<dyn Target>,
    name: String,
    /// Re-attempts after the first failure
    max_retries: usize,
    delay: Duration,
}

impl RetryTarget {
    pub fn new(inner: Arc<dyn Target>, max_retries: usize, delay: Duration) -> Self {
        let name = format!("retry({})", inner.name());
        Self {
            inner,
            name,
            max_retries,
            delay,
        }
    }
}

impl Target for RetryTarget {
    fn write(&self, event: &Arc<LogEvent>) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.inner.write(event) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= self.max_retries {
                        // Exhausted: surface the last failure
                        return Err(err);
                    }
                    attempt += 1;
                    thread::sleep(self.delay);
                }
            }
        }
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn precalculate(&self, event: &LogEvent) {
        self.inner.precalculate(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use crate::targets::MemoryTarget;

    fn event(message: &str) -> Arc<LogEvent> {
        Arc::new(LogEvent::new("App", LogLevel::Info, message))
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let sink = Arc::new(MemoryTarget::new());
        sink.fail_next_writes(2);
        let retry = RetryTarget::new(
            Arc::clone(&sink) as Arc<dyn Target>,
            3,
            Duration::from_millis(1),
        );

        retry.write(&event("eventually")).unwrap();
        assert_eq!(sink.messages().len(), 1);
    }

    #[test]
    fn test_exhausted_retries_surface_failure() {
        let sink = Arc::new(MemoryTarget::new());
        sink.fail_next_writes(10);
        let retry = RetryTarget::new(
            Arc::clone(&sink) as Arc<dyn Target>,
            2,
            Duration::from_millis(1),
        );

        assert!(retry.write(&event("doomed")).is_err());
        // 1 initial + 2 retries
        assert_eq!(sink.write_attempts(), 3);
    }

    #[test]
    fn test_order_preserved_across_retries() {
        let sink = Arc::new(MemoryTarget::new());
        let retry = RetryTarget::new(
            Arc::clone(&sink) as Arc<dyn Target>,
            3,
            Duration::from_millis(1),
        );

        sink.fail_next_writes(1);
        retry.write(&event("first")).unwrap();
        retry.write(&event("second")).unwrap();

        let messages = sink.messages();
        assert!(messages[0].contains("first"));
        assert!(messages[1].contains("second"));
    }
}
