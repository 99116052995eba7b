//! Queue metrics for observability
//!
//! Counters for monitoring async dispatch health: enqueue/forward
//! throughput, overflow outcomes, and flush activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one async dispatch queue instance
///
/// # Example
///
/// ```
/// use rust_log_dispatch::QueueMetrics;
///
/// let metrics = QueueMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_forwarded();
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.forwarded(), 1);
/// ```
#[derive(Debug)]
pub struct QueueMetrics {
    /// Events accepted into the queue
    enqueued: AtomicU64,

    /// Events forwarded to the inner target
    forwarded: AtomicU64,

    /// Events evicted under the Discard policy
    discarded: AtomicU64,

    /// Enqueue attempts that failed on a Block timeout
    timed_out: AtomicU64,

    /// Capacity growth events under the Grow policy
    grow_events: AtomicU64,

    /// Producer blocking events under the Block policy
    block_events: AtomicU64,

    /// Flush barriers processed
    flushes: AtomicU64,
}

impl QueueMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            timed_out: AtomicU64::new(0),
            grow_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn grow_events(&self) -> u64 {
        self.grow_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_forwarded(&self) -> u64 {
        self.forwarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_timed_out(&self) -> u64 {
        self.timed_out.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_grow(&self) -> u64 {
        self.grow_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush(&self) -> u64 {
        self.flushes.fetch_add(1, Ordering::Relaxed)
    }

    /// Discard rate as a percentage (0.0 - 100.0) of accepted+discarded
    ///
    /// Returns 0.0 if nothing has been offered to the queue.
    pub fn discard_rate(&self) -> f64 {
        let discarded = self.discarded() as f64;
        let total = self.enqueued() as f64 + discarded;
        if total == 0.0 {
            0.0
        } else {
            (discarded / total) * 100.0
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.forwarded.store(0, Ordering::Relaxed);
        self.discarded.store(0, Ordering::Relaxed);
        self.timed_out.store(0, Ordering::Relaxed);
        self.grow_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QueueMetrics {
    /// Create a snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            forwarded: AtomicU64::new(self.forwarded()),
            discarded: AtomicU64::new(self.discarded()),
            timed_out: AtomicU64::new(self.timed_out()),
            grow_events: AtomicU64::new(self.grow_events()),
            block_events: AtomicU64::new(self.block_events()),
            flushes: AtomicU64::new(self.flushes()),
        }
    }
}
