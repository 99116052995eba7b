//! Logging macros for ergonomic message formatting.
//!
//! These macros provide a convenient interface for logging with
//! automatic string formatting, similar to `println!` and `format!`.
//!
//! # Examples
//!
//! ```
//! use rust_log_dispatch::prelude::*;
//! use rust_log_dispatch::info;
//!
//! let factory = LogFactory::builder().build();
//! let logger = factory.logger("App.Server");
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_log_dispatch::prelude::*;
/// # let factory = LogFactory::builder().build();
/// # let logger = factory.logger("App");
/// use rust_log_dispatch::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warn-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

/// Log with call-site capture (file, line, module path).
///
/// # Examples
///
/// ```
/// # use rust_log_dispatch::prelude::*;
/// # let factory = LogFactory::builder().build();
/// # let logger = factory.logger("App");
/// use rust_log_dispatch::log_here;
/// log_here!(logger, LogLevel::Warn, "low disk space: {}%", 7);
/// ```
#[macro_export]
macro_rules! log_here {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let event = $crate::LogEvent::new($logger.name(), $level, format!($($arg)+))
            .with_callsite(file!(), line!(), module_path!());
        $logger.log_event(event)
    }};
}
