//! Error types for the dispatch core

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Layout template failed to compile
    #[error("Layout compile error at offset {position}: {message}")]
    LayoutCompile { position: usize, message: String },

    /// A renderer faulted while appending output
    #[error("Render error in '{renderer}': {message}")]
    Render { renderer: String, message: String },

    /// Malformed routing configuration (bad pattern, bad rule)
    #[error("Route configuration error for '{pattern}': {message}")]
    RouteConfig { pattern: String, message: String },

    /// Event was evicted from a full queue under the Discard policy
    #[error("Log event discarded: queue full ({capacity} entries)")]
    QueueDiscarded { capacity: usize },

    /// Enqueue or flush did not complete within the allowed time
    #[error("Queue operation timed out after {elapsed_ms}ms")]
    QueueTimeout { elapsed_ms: u64 },

    /// Queue is shut down and no longer accepts events
    #[error("Queue already shut down")]
    QueueShutdown,

    /// Inner sink failed to accept an event
    #[error("Target '{target}' write failed: {message}")]
    TargetWrite { target: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DispatchError {
    /// Create a layout compile error at a byte offset in the template
    pub fn compile(position: usize, message: impl Into<String>) -> Self {
        DispatchError::LayoutCompile {
            position,
            message: message.into(),
        }
    }

    /// Create a render error for a named renderer
    pub fn render(renderer: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::Render {
            renderer: renderer.into(),
            message: message.into(),
        }
    }

    /// Create a route configuration error
    pub fn route(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::RouteConfig {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a queue discard error
    pub fn discarded(capacity: usize) -> Self {
        DispatchError::QueueDiscarded { capacity }
    }

    /// Create a queue timeout error
    pub fn timeout(elapsed: std::time::Duration) -> Self {
        DispatchError::QueueTimeout {
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Create a target write error
    pub fn target_write(target: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::TargetWrite {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DispatchError::Other(msg.into())
    }

    /// Whether this error is a per-event queue completion failure
    /// (discard, timeout, shutdown) rather than a configuration fault.
    pub fn is_queue_failure(&self) -> bool {
        matches!(
            self,
            DispatchError::QueueDiscarded { .. }
                | DispatchError::QueueTimeout { .. }
                | DispatchError::QueueShutdown
        )
    }
}
