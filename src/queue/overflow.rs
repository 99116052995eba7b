//! Overflow policies for the async dispatch queue
//!
//! When the queue is full, the policy fixed at construction determines
//! what happens to the colliding enqueue. The policy is configuration,
//! not per-event data.

use std::fmt;
use std::time::Duration;

/// Policy applied when the queue is at capacity
///
/// # Example
///
/// ```
/// use rust_log_dispatch::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: evict the oldest entry
/// let policy = OverflowPolicy::default();
///
/// // Block the producer, giving up after 100ms
/// let policy = OverflowPolicy::Block {
///     timeout: Some(Duration::from_millis(100)),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum OverflowPolicy {
    /// Drop the oldest queued event and complete it with a discard
    /// error; the caller never blocks
    ///
    /// Use this for high-throughput scenarios where losing the oldest
    /// backlog is acceptable.
    Discard,

    /// Grow capacity by `factor` instead of rejecting; the caller never
    /// blocks but memory is unbounded
    Grow { factor: f64 },

    /// Block the caller until space frees, optionally bounded by a
    /// timeout; on expiry the event fails without being enqueued
    ///
    /// Warning: this backpressures the application. Only use when
    /// event preservation is worth producer latency.
    Block { timeout: Option<Duration> },
}

impl OverflowPolicy {
    /// Grow with a doubling factor
    pub fn grow() -> Self {
        OverflowPolicy::Grow { factor: 2.0 }
    }

    /// Block without a timeout
    pub fn block() -> Self {
        OverflowPolicy::Block { timeout: None }
    }
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::Discard
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Discard => write!(f, "Discard"),
            OverflowPolicy::Grow { factor } => write!(f, "Grow(x{})", factor),
            OverflowPolicy::Block { timeout: None } => write!(f, "Block"),
            OverflowPolicy::Block {
                timeout: Some(timeout),
            } => write!(f, "Block({:?})", timeout),
        }
    }
}
