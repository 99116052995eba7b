//! Asynchronous dispatch: bounded queue, overflow policies, flush
//! barriers, and the composable retry layer

pub mod async_target;
pub mod overflow;
pub mod retry;

pub use async_target::{AsyncQueueTarget, DEFAULT_FLUSH_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT};
pub use overflow::OverflowPolicy;
pub use retry::RetryTarget;
