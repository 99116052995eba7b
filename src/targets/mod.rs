//! Target implementations
//!
//! The concrete sink catalog lives with embedding applications; these
//! minimal targets exist to make the dispatch core usable and testable.

#[cfg(feature = "console")]
pub mod console;
pub mod memory;
pub mod null;

#[cfg(feature = "console")]
pub use console::ConsoleTarget;
pub use memory::MemoryTarget;
pub use null::NullTarget;

// Re-export the trait alongside its implementations
pub use crate::core::Target;
