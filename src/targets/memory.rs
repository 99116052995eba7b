//! In-memory collecting target
//!
//! Primarily a test double: collects rendered lines, counts attempts,
//! and can inject failures, delays, or a hard block to exercise
//! overflow and error paths deterministically.

use crate::core::error::{DispatchError, Result};
use crate::core::log_event::LogEvent;
use crate::core::target::Target;
use crate::layout::Layout;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct MemoryTarget {
    name: String,
    layout: Option<Layout>,
    messages: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    flushes: AtomicUsize,
    fail_remaining: AtomicUsize,
    write_delay: Mutex<Option<Duration>>,
    blocked: Mutex<bool>,
    unblock: Condvar,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: None,
            messages: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
            fail_remaining: AtomicUsize::new(0),
            write_delay: Mutex::new(None),
            blocked: Mutex::new(false),
            unblock: Condvar::new(),
        }
    }

    /// Render lines through a layout instead of the default format
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Collected lines, in delivery order
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn write_attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Make the next `count` writes fail with a target error
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_remaining.store(count, Ordering::Relaxed);
    }

    /// Delay every write (simulates a slow sink)
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock() = Some(delay);
    }

    /// Park all writers until [`MemoryTarget::unblock_writes`]
    pub fn block_writes(&self) {
        *self.blocked.lock() = true;
    }

    pub fn unblock_writes(&self) {
        *self.blocked.lock() = false;
        self.unblock.notify_all();
    }

    fn format_line(&self, event: &LogEvent) -> String {
        match &self.layout {
            Some(layout) => layout.render(event),
            None => format!(
                "{} {} - {}",
                event.level.to_str(),
                event.logger_name,
                event.formatted_message()
            ),
        }
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for MemoryTarget {
    fn write(&self, event: &Arc<LogEvent>) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        {
            let mut blocked = self.blocked.lock();
            while *blocked {
                self.unblock.wait(&mut blocked);
            }
        }

        if let Some(delay) = *self.write_delay.lock() {
            std::thread::sleep(delay);
        }

        let remaining = self.fail_remaining.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::Relaxed);
            return Err(DispatchError::target_write(&self.name, "injected failure"));
        }

        let line = self.format_line(event);
        self.messages.lock().push(line);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn precalculate(&self, event: &LogEvent) {
        if let Some(layout) = &self.layout {
            layout.precalculate(event);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use crate::layout::{CompileMode, RendererRegistry};

    fn event() -> Arc<LogEvent> {
        Arc::new(LogEvent::new("App.Web", LogLevel::Info, "started"))
    }

    #[test]
    fn test_default_format() {
        let target = MemoryTarget::new();
        target.write(&event()).unwrap();
        assert_eq!(target.messages(), vec!["INFO App.Web - started"]);
    }

    #[test]
    fn test_layout_format() {
        let registry = RendererRegistry::with_defaults();
        let layout =
            Layout::compile("${level}|${message}", &registry, CompileMode::Strict).unwrap();
        let target = MemoryTarget::new().with_layout(layout);
        target.write(&event()).unwrap();
        assert_eq!(target.messages(), vec!["INFO|started"]);
    }

    #[test]
    fn test_injected_failures_then_recover() {
        let target = MemoryTarget::new();
        target.fail_next_writes(1);
        assert!(target.write(&event()).is_err());
        assert!(target.write(&event()).is_ok());
        assert_eq!(target.write_attempts(), 2);
        assert_eq!(target.messages().len(), 1);
    }
}
