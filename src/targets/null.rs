//! Null target: accepts and discards every event

use crate::core::error::Result;
use crate::core::log_event::LogEvent;
use crate::core::target::Target;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct NullTarget {
    writes: AtomicUsize,
}

impl NullTarget {
    pub fn new() -> Self {
        Self {
            writes: AtomicUsize::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for NullTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for NullTarget {
    fn write(&self, _event: &Arc<LogEvent>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
