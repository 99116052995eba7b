//! Internal diagnostic channel
//!
//! Failures inside the dispatch pipeline never reach the application's
//! call stack. They are counted here and reported to stderr, rate
//! limited so a hot failure path cannot flood the terminal. Each
//! factory owns its own instance; there is no global state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Report every Nth occurrence after the first
const REPORT_INTERVAL: u64 = 1000;

#[derive(Debug, Default)]
pub struct Diagnostics {
    render_errors: AtomicU64,
    filter_errors: AtomicU64,
    target_errors: AtomicU64,
    queue_errors: AtomicU64,
    /// Strict mode: panic on internal errors instead of swallowing them.
    /// For test/debug use only.
    strict: AtomicBool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable strict (panic-on-error) mode
    pub fn set_strict(&self, strict: bool) {
        self.strict.store(strict, Ordering::Relaxed);
    }

    pub fn is_strict(&self) -> bool {
        self.strict.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn render_error_count(&self) -> u64 {
        self.render_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filter_error_count(&self) -> u64 {
        self.filter_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn target_error_count(&self) -> u64 {
        self.target_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_error_count(&self) -> u64 {
        self.queue_errors.load(Ordering::Relaxed)
    }

    /// A renderer faulted mid-append; its output was replaced with
    /// empty text and sibling rendering continued.
    pub fn report_render_error(&self, renderer: &str, message: &str) {
        let seen = self.render_errors.fetch_add(1, Ordering::Relaxed);
        self.report(seen, "DISPATCH ERROR", &format!(
            "renderer '{}' failed: {}",
            renderer, message
        ));
    }

    /// A filter predicate faulted; it was treated as Neutral.
    pub fn report_filter_error(&self, filter: &str, message: &str) {
        let seen = self.filter_errors.fetch_add(1, Ordering::Relaxed);
        self.report(seen, "DISPATCH ERROR", &format!(
            "filter '{}' failed, treated as neutral: {}",
            filter, message
        ));
    }

    /// A target rejected a write; dispatch to other targets continued.
    pub fn report_target_error(&self, target: &str, message: &str) {
        let seen = self.target_errors.fetch_add(1, Ordering::Relaxed);
        self.report(seen, "DISPATCH ERROR", &format!(
            "target '{}' write failed: {}",
            target, message
        ));
    }

    /// A queued event failed with a discard/timeout/shutdown error.
    pub fn report_queue_error(&self, queue: &str, message: &str) {
        let seen = self.queue_errors.fetch_add(1, Ordering::Relaxed);
        self.report(seen, "DISPATCH WARNING", &format!(
            "queue '{}': {}",
            queue, message
        ));
    }

    fn report(&self, seen_before: u64, tag: &str, message: &str) {
        if self.is_strict() {
            panic!("[{}] {}", tag, message);
        }
        // Alert on first occurrence and periodically thereafter
        if seen_before == 0 || (seen_before + 1).is_multiple_of(REPORT_INTERVAL) {
            eprintln!("[{}] {} ({} occurrences)", tag, message, seen_before + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let diag = Diagnostics::new();
        diag.report_render_error("date", "bad format");
        diag.report_render_error("date", "bad format");
        diag.report_filter_error("when", "oops");
        diag.report_target_error("console", "closed");
        diag.report_queue_error("async", "discarded");

        assert_eq!(diag.render_error_count(), 2);
        assert_eq!(diag.filter_error_count(), 1);
        assert_eq!(diag.target_error_count(), 1);
        assert_eq!(diag.queue_error_count(), 1);
    }

    #[test]
    #[should_panic(expected = "DISPATCH ERROR")]
    fn test_strict_mode_panics() {
        let diag = Diagnostics::new();
        diag.set_strict(true);
        diag.report_render_error("level", "boom");
    }
}
