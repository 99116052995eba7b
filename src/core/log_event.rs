//! Log event structure
//!
//! A `LogEvent` is created once per logging call, on the calling thread.
//! Anything a deferred render needs from the calling thread's ambient
//! state (thread id/name) is snapshotted here at creation, never read
//! lazily from another thread.

use super::log_level::LogLevel;
use super::property::{PropertyBag, PropertyValue};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.is_none() {
            *cache = Some(format!("{:?}", std::thread::current().id()));
        }
        cache
            .as_ref()
            .expect("thread_id cache initialized in previous line")
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.is_none() {
            *cache = Some(std::thread::current().name().map(String::from));
        }
        cache
            .as_ref()
            .expect("thread_name cache initialized in previous line")
            .clone()
    })
}

/// Call-site information captured lazily via the logging macros
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
    pub module_path: String,
}

/// Per-event store for layout results pre-rendered on the producer
/// thread before a cross-thread handoff. Keyed by layout id.
#[derive(Debug, Default)]
pub struct LayoutCache {
    rendered: Mutex<HashMap<u64, String>>,
}

impl LayoutCache {
    pub fn store(&self, layout_id: u64, text: String) {
        self.rendered.lock().insert(layout_id, text);
    }

    pub fn lookup(&self, layout_id: u64) -> Option<String> {
        self.rendered.lock().get(&layout_id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.lock().is_empty()
    }
}

impl Clone for LayoutCache {
    fn clone(&self) -> Self {
        Self {
            rendered: Mutex::new(self.rendered.lock().clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub logger_name: String,
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Raw message template; positional `{0}`..`{n}` placeholders refer
    /// to `parameters`
    pub message_template: String,
    pub parameters: Vec<PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    pub properties: PropertyBag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsite: Option<CallSite>,
    /// Ambient snapshot: taken on the calling thread at creation
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    #[serde(skip)]
    pub layout_cache: LayoutCache,
}

impl LogEvent {
    /// Sanitize message text to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log lines.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(logger_name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            timestamp: Utc::now(),
            message_template: Self::sanitize_message(&message.into()),
            parameters: Vec::new(),
            exception: None,
            properties: PropertyBag::new(),
            callsite: None,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            layout_cache: LayoutCache::default(),
        }
    }

    /// Attach positional parameters for `{0}`..`{n}` placeholders
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<PropertyValue>) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    #[must_use]
    pub fn with_property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        self.properties.set(key, value);
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: PropertyBag) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn with_callsite(mut self, file: &str, line: u32, module_path: &str) -> Self {
        self.callsite = Some(CallSite {
            file: file.to_string(),
            line,
            module_path: module_path.to_string(),
        });
        self
    }

    /// The message with positional `{0}`..`{n}` placeholders substituted
    /// from `parameters`. Templates without placeholders (or events
    /// without parameters) return the template verbatim.
    pub fn formatted_message(&self) -> String {
        if self.parameters.is_empty() || !self.message_template.contains('{') {
            return self.message_template.clone();
        }

        let mut out = String::with_capacity(self.message_template.len() + 16);
        let mut chars = self.message_template.char_indices().peekable();
        while let Some((start, ch)) = chars.next() {
            if ch != '{' {
                out.push(ch);
                continue;
            }
            // Scan for a `{digits}` placeholder; anything else is literal
            let rest = &self.message_template[start + 1..];
            if let Some(close) = rest.find('}') {
                let index_str = &rest[..close];
                if !index_str.is_empty() && index_str.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(index) = index_str.parse::<usize>() {
                        match self.parameters.get(index) {
                            Some(value) => {
                                let _ = write!(out, "{}", value);
                            }
                            None => {
                                // Out-of-range placeholder stays verbatim
                                out.push('{');
                                out.push_str(index_str);
                                out.push('}');
                            }
                        }
                        for _ in 0..=close {
                            chars.next();
                        }
                        continue;
                    }
                }
            }
            out.push(ch);
        }
        out
    }
}
