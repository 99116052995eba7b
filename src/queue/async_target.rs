//! Asynchronous dispatch queue wrapping a target
//!
//! Producers enqueue from arbitrary threads; exactly one dedicated
//! consumer thread drains in batches and forwards to the inner target,
//! which guarantees FIFO, non-concurrent delivery to the wrapped sink.
//! Flush is implemented with a barrier marker inserted into the queue
//! and awaited specifically - never by waiting for "queue empty",
//! which races with concurrent producers.

use super::overflow::OverflowPolicy;
use crate::core::diagnostics::Diagnostics;
use crate::core::error::{DispatchError, Result};
use crate::core::log_event::LogEvent;
use crate::core::metrics::QueueMetrics;
use crate::core::target::{Completion, Target};
use crossbeam_channel::RecvTimeoutError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Timeout used when the queue is dropped without an explicit shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout used by the plain `Target::flush` entry point
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Consumer drains up to this many entries per lock acquisition
const BATCH_SIZE: usize = 50;

enum QueueItem {
    Event(Arc<LogEvent>, Option<Completion>),
    /// Acknowledged once every earlier event has been forwarded and
    /// the inner target's own flush completed
    FlushBarrier(crossbeam_channel::Sender<Result<()>>),
}

struct QueueState {
    items: VecDeque<QueueItem>,
    /// Events only; barriers do not count toward capacity
    event_count: usize,
    capacity: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    /// Consumer waits here for work
    not_empty: Condvar,
    /// Blocked producers wait here for space
    not_full: Condvar,
    inner: Arc<dyn Target>,
    metrics: QueueMetrics,
    diagnostics: Arc<Diagnostics>,
}

impl Shared {
    /// Deliver one event on the consumer thread, with panic isolation
    /// so a faulting sink cannot kill the consumer
    fn forward(&self, event: Arc<LogEvent>, completion: Option<Completion>) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.inner.write(&event)));
        let result = match outcome {
            Ok(result) => result,
            Err(panic_info) => Err(DispatchError::target_write(
                self.inner.name(),
                format!("panicked: {}", panic_message(&panic_info)),
            )),
        };
        match &result {
            Ok(()) => {
                self.metrics.record_forwarded();
            }
            Err(err) => {
                self.diagnostics
                    .report_target_error(self.inner.name(), &err.to_string());
            }
        }
        if let Some(completion) = completion {
            completion(result);
        }
    }

    fn acknowledge_flush(&self, ack: crossbeam_channel::Sender<Result<()>>) {
        self.metrics.record_flush();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.inner.flush()));
        let result = match outcome {
            Ok(result) => result,
            Err(panic_info) => Err(DispatchError::target_write(
                self.inner.name(),
                format!("panicked during flush: {}", panic_message(&panic_info)),
            )),
        };
        // Receiver may have timed out and gone away
        let _ = ack.send(result);
    }
}

fn panic_message(panic_info: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn consumer_loop(shared: &Shared) {
    let mut batch: Vec<QueueItem> = Vec::with_capacity(BATCH_SIZE);
    loop {
        {
            let mut state = shared.state.lock();
            while state.items.is_empty() && !state.shutdown {
                shared.not_empty.wait(&mut state);
            }
            if state.items.is_empty() {
                // Shut down and fully drained
                return;
            }
            while batch.len() < BATCH_SIZE {
                match state.items.pop_front() {
                    Some(item) => {
                        if matches!(item, QueueItem::Event(..)) {
                            state.event_count -= 1;
                        }
                        batch.push(item);
                    }
                    None => break,
                }
            }
            shared.not_full.notify_all();
        }

        for item in batch.drain(..) {
            match item {
                QueueItem::Event(event, completion) => shared.forward(event, completion),
                QueueItem::FlushBarrier(ack) => shared.acknowledge_flush(ack),
            }
        }
    }
}

/// What to do once the state lock is released
enum EnqueueOutcome {
    Accepted,
    /// Oldest event evicted under Discard; complete it with the error
    Evicted {
        completion: Option<Completion>,
        capacity: usize,
    },
    /// This event was rejected synchronously (shutdown or Block timeout)
    Rejected(DispatchError),
}

/// Wraps an inner target with a bounded queue and one consumer thread,
/// exposing the identical [`Target`] write contract.
///
/// # Example
///
/// ```
/// use rust_log_dispatch::queue::{AsyncQueueTarget, OverflowPolicy};
/// use rust_log_dispatch::targets::MemoryTarget;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use rust_log_dispatch::Target;
///
/// let sink = Arc::new(MemoryTarget::new());
/// let queue = AsyncQueueTarget::new(
///     Arc::clone(&sink) as Arc<dyn Target>,
///     1000,
///     OverflowPolicy::default(),
/// );
/// // ... write events through the queue ...
/// queue.shutdown(Duration::from_secs(1));
/// ```
pub struct AsyncQueueTarget {
    name: String,
    policy: OverflowPolicy,
    shared: Arc<Shared>,
    consumer: Mutex<Option<thread::JoinHandle<()>>>,
}

impl AsyncQueueTarget {
    pub fn new(inner: Arc<dyn Target>, capacity: usize, policy: OverflowPolicy) -> Self {
        Self::with_diagnostics(inner, capacity, policy, Arc::new(Diagnostics::new()))
    }

    /// Create a queue reporting to an existing diagnostics instance
    pub fn with_diagnostics(
        inner: Arc<dyn Target>,
        capacity: usize,
        policy: OverflowPolicy,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let name = format!("async({})", inner.name());
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.max(1)),
                event_count: 0,
                capacity: capacity.max(1),
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            inner,
            metrics: QueueMetrics::new(),
            diagnostics,
        });

        let consumer_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || consumer_loop(&consumer_shared))
            .expect("failed to spawn queue consumer thread");

        Self {
            name,
            policy,
            shared,
            consumer: Mutex::new(Some(handle)),
        }
    }

    pub fn metrics(&self) -> &QueueMetrics {
        &self.shared.metrics
    }

    /// Events currently pending (excludes flush barriers)
    pub fn pending(&self) -> usize {
        self.shared.state.lock().event_count
    }

    /// Current capacity; changes only under the Grow policy
    pub fn capacity(&self) -> usize {
        self.shared.state.lock().capacity
    }

    fn enqueue(&self, event: Arc<LogEvent>, completion: Option<Completion>) -> Result<()> {
        // Snapshot non-thread-agnostic layouts on the producer thread,
        // before the handoff and outside the queue lock
        self.shared.inner.precalculate(&event);

        let mut completion = completion;
        let outcome = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                EnqueueOutcome::Rejected(DispatchError::QueueShutdown)
            } else if state.event_count < state.capacity {
                self.push(&mut state, event, completion.take());
                EnqueueOutcome::Accepted
            } else {
                match &self.policy {
                    OverflowPolicy::Discard => {
                        let evicted = Self::evict_oldest(&mut state);
                        let capacity = state.capacity;
                        self.shared.metrics.record_discarded();
                        self.push(&mut state, event, completion.take());
                        EnqueueOutcome::Evicted {
                            completion: evicted,
                            capacity,
                        }
                    }
                    OverflowPolicy::Grow { factor } => {
                        let grown = ((state.capacity as f64) * factor).ceil() as usize;
                        state.capacity = grown.max(state.capacity + 1);
                        self.shared.metrics.record_grow();
                        self.push(&mut state, event, completion.take());
                        EnqueueOutcome::Accepted
                    }
                    OverflowPolicy::Block { timeout } => {
                        self.shared.metrics.record_block();
                        match self.wait_for_space(&mut state, *timeout) {
                            Ok(()) => {
                                self.push(&mut state, event, completion.take());
                                EnqueueOutcome::Accepted
                            }
                            Err(err) => EnqueueOutcome::Rejected(err),
                        }
                    }
                }
            }
        };

        match outcome {
            EnqueueOutcome::Accepted => Ok(()),
            EnqueueOutcome::Evicted {
                completion: evicted,
                capacity,
            } => {
                self.shared
                    .diagnostics
                    .report_queue_error(&self.name, "oldest event discarded: queue full");
                if let Some(evicted) = evicted {
                    evicted(Err(DispatchError::discarded(capacity)));
                }
                Ok(())
            }
            EnqueueOutcome::Rejected(err) => {
                self.shared
                    .diagnostics
                    .report_queue_error(&self.name, &err.to_string());
                if let Some(completion) = completion {
                    let failure = match &err {
                        DispatchError::QueueShutdown => DispatchError::QueueShutdown,
                        DispatchError::QueueTimeout { elapsed_ms } => {
                            DispatchError::QueueTimeout {
                                elapsed_ms: *elapsed_ms,
                            }
                        }
                        other => DispatchError::other(other.to_string()),
                    };
                    completion(Err(failure));
                }
                Err(err)
            }
        }
    }

    fn push(
        &self,
        state: &mut QueueState,
        event: Arc<LogEvent>,
        completion: Option<Completion>,
    ) {
        state.items.push_back(QueueItem::Event(event, completion));
        state.event_count += 1;
        self.shared.metrics.record_enqueued();
        self.shared.not_empty.notify_one();
    }

    /// Remove the oldest queued event, skipping over flush barriers
    fn evict_oldest(state: &mut QueueState) -> Option<Completion> {
        let index = state
            .items
            .iter()
            .position(|item| matches!(item, QueueItem::Event(..)))?;
        match state.items.remove(index) {
            Some(QueueItem::Event(_, completion)) => {
                state.event_count -= 1;
                completion
            }
            _ => None,
        }
    }

    /// Block until the queue has room, the timeout expires, or the
    /// queue shuts down
    fn wait_for_space(
        &self,
        state: &mut parking_lot::MutexGuard<'_, QueueState>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        match timeout {
            None => {
                while state.event_count >= state.capacity && !state.shutdown {
                    self.shared.not_full.wait(state);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while state.event_count >= state.capacity && !state.shutdown {
                    if self
                        .shared
                        .not_full
                        .wait_until(state, deadline)
                        .timed_out()
                        && state.event_count >= state.capacity
                    {
                        self.shared.metrics.record_timed_out();
                        return Err(DispatchError::timeout(timeout));
                    }
                }
            }
        }
        if state.shutdown {
            return Err(DispatchError::QueueShutdown);
        }
        Ok(())
    }

    /// Insert a flush barrier and wait for it to be acknowledged
    ///
    /// Returns once every event enqueued strictly before this call has
    /// been forwarded to the inner target and the inner target's own
    /// flush has completed, or the timeout elapses. Expiry does not
    /// abort the in-flight delivery.
    pub fn flush_timeout(&self, timeout: Duration) -> Result<()> {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return Err(DispatchError::QueueShutdown);
            }
            state.items.push_back(QueueItem::FlushBarrier(ack_tx));
            self.shared.not_empty.notify_one();
        }
        match ack_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(DispatchError::timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(DispatchError::QueueShutdown),
        }
    }

    /// Stop accepting events, attempt a bounded final drain, then fail
    /// any remaining completions with a shutdown error
    ///
    /// Returns `true` if the consumer drained everything within the
    /// timeout.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.not_empty.notify_all();
            self.shared.not_full.notify_all();
        }

        let handle = self.consumer.lock().take();
        let Some(handle) = handle else {
            // Already shut down
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if handle.join().is_err() {
                    eprintln!("[DISPATCH ERROR] queue consumer thread panicked during shutdown");
                    return false;
                }
                return true;
            }
            if start.elapsed() >= timeout {
                self.fail_remaining();
                eprintln!(
                    "[DISPATCH WARNING] queue '{}' did not drain within {:?}; remaining events failed",
                    self.name, timeout
                );
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Complete every still-queued entry with a shutdown error
    fn fail_remaining(&self) {
        let remaining: Vec<QueueItem> = {
            let mut state = self.shared.state.lock();
            state.event_count = 0;
            state.items.drain(..).collect()
        };
        for item in remaining {
            match item {
                QueueItem::Event(_, Some(completion)) => {
                    completion(Err(DispatchError::QueueShutdown));
                }
                QueueItem::Event(_, None) => {}
                QueueItem::FlushBarrier(ack) => {
                    let _ = ack.send(Err(DispatchError::QueueShutdown));
                }
            }
        }
    }
}

impl Target for AsyncQueueTarget {
    /// Enqueue for background delivery. Synchronous failures (shutdown,
    /// Block timeout) surface in the returned result; asynchronous
    /// outcomes only via completions and diagnostics.
    fn write(&self, event: &Arc<LogEvent>) -> Result<()> {
        self.enqueue(Arc::clone(event), None)
    }

    fn write_with_completion(&self, event: Arc<LogEvent>, completion: Completion) {
        // The completion carries the outcome; nothing more to report
        let _ = self.enqueue(event, Some(completion));
    }

    fn flush(&self) -> Result<()> {
        AsyncQueueTarget::flush_timeout(self, DEFAULT_FLUSH_TIMEOUT)
    }

    fn flush_timeout(&self, timeout: Duration) -> Result<()> {
        AsyncQueueTarget::flush_timeout(self, timeout)
    }

    fn precalculate(&self, event: &LogEvent) {
        self.shared.inner.precalculate(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for AsyncQueueTarget {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
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
    fn test_events_forwarded_in_order() {
        let sink = Arc::new(MemoryTarget::new());
        let queue = AsyncQueueTarget::new(
            Arc::clone(&sink) as Arc<dyn Target>,
            100,
            OverflowPolicy::default(),
        );

        for i in 0..20 {
            queue.write(&event(&format!("m{}", i))).unwrap();
        }
        queue.flush_timeout(Duration::from_secs(5)).unwrap();

        let messages = sink.messages();
        assert_eq!(messages.len(), 20);
        for (i, message) in messages.iter().enumerate() {
            assert!(message.contains(&format!("m{}", i)));
        }
    }

    #[test]
    fn test_completion_fires_after_forwarding() {
        let sink = Arc::new(MemoryTarget::new());
        let queue = AsyncQueueTarget::new(
            Arc::clone(&sink) as Arc<dyn Target>,
            10,
            OverflowPolicy::default(),
        );

        let (tx, rx) = crossbeam_channel::bounded(1);
        queue.write_with_completion(
            event("tracked"),
            Box::new(move |result| {
                tx.send(result.is_ok()).unwrap();
            }),
        );

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_shutdown_fails_fast() {
        let sink = Arc::new(MemoryTarget::new());
        let queue = AsyncQueueTarget::new(
            Arc::clone(&sink) as Arc<dyn Target>,
            10,
            OverflowPolicy::default(),
        );
        assert!(queue.shutdown(Duration::from_secs(1)));

        let err = queue.write(&event("late")).unwrap_err();
        assert!(matches!(err, DispatchError::QueueShutdown));

        let (tx, rx) = crossbeam_channel::bounded(1);
        queue.write_with_completion(
            event("late2"),
            Box::new(move |result| {
                tx.send(matches!(result, Err(DispatchError::QueueShutdown)))
                    .unwrap();
            }),
        );
        assert!(rx.recv_timeout(Duration::from_secs(1)).unwrap());
    }

    #[test]
    fn test_grow_policy_expands_capacity() {
        let sink = Arc::new(MemoryTarget::new());
        // Slow sink keeps the queue from draining during the burst
        sink.set_write_delay(Duration::from_millis(5));
        let queue = AsyncQueueTarget::new(
            Arc::clone(&sink) as Arc<dyn Target>,
            2,
            OverflowPolicy::grow(),
        );

        for i in 0..16 {
            queue.write(&event(&format!("m{}", i))).unwrap();
        }
        assert!(queue.capacity() >= 4);
        assert_eq!(queue.metrics().discarded(), 0);

        queue.flush_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(sink.messages().len(), 16);
    }
}
