//! Builtin renderer set
//!
//! The minimum catalog needed to make layouts useful: level, logger,
//! message, date, event properties, thread, newline. Anything beyond
//! this is registered by the embedding application.

use super::node::Renderer;
use super::registry::{RendererConfig, RendererRegistry, RendererSpec};
use crate::core::error::{DispatchError, Result};
use crate::core::log_event::LogEvent;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::fmt::Write as _;

pub(crate) fn register_builtin(registry: &mut RendererRegistry) {
    registry.register(
        RendererSpec {
            name: "level",
            default_property: None,
            options: &[],
        },
        |_config| Ok(Box::new(LevelRenderer) as Box<dyn Renderer>),
    );

    registry.register(
        RendererSpec {
            name: "logger",
            default_property: None,
            options: &["shortname"],
        },
        |config| {
            Ok(Box::new(LoggerRenderer {
                short_name: config.flag("shortname")?,
            }) as Box<dyn Renderer>)
        },
    );

    registry.register(
        RendererSpec {
            name: "message",
            default_property: None,
            options: &["raw", "withexception"],
        },
        |config| {
            Ok(Box::new(MessageRenderer {
                raw: config.flag("raw")?,
                with_exception: config.flag("withexception")?,
            }) as Box<dyn Renderer>)
        },
    );

    registry.register(
        RendererSpec {
            name: "date",
            default_property: Some("format"),
            options: &["format"],
        },
        |config| {
            let format = config
                .literal("format")?
                .unwrap_or("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string();
            let renderer = DateRenderer::new(format)?;
            Ok(Box::new(renderer) as Box<dyn Renderer>)
        },
    );

    registry.register(
        RendererSpec {
            name: "event-properties",
            default_property: Some("item"),
            options: &["item"],
        },
        |config| {
            let item = config
                .literal("item")?
                .ok_or_else(|| {
                    DispatchError::render("event-properties", "option 'item' is required")
                })?
                .to_string();
            Ok(Box::new(EventPropertiesRenderer { item }) as Box<dyn Renderer>)
        },
    );

    registry.register(
        RendererSpec {
            name: "thread",
            default_property: None,
            options: &["id"],
        },
        |config| {
            Ok(Box::new(ThreadRenderer {
                force_id: config.flag("id")?,
            }) as Box<dyn Renderer>)
        },
    );

    registry.register(
        RendererSpec {
            name: "newline",
            default_property: None,
            options: &[],
        },
        |_config| Ok(Box::new(NewlineRenderer) as Box<dyn Renderer>),
    );
}

/// `${level}` — the event level name
pub struct LevelRenderer;

impl Renderer for LevelRenderer {
    fn append(&self, buf: &mut String, event: &LogEvent) -> Result<()> {
        buf.push_str(event.level.to_str());
        Ok(())
    }

    fn raw_value(&self, event: &LogEvent) -> Option<serde_json::Value> {
        Some(serde_json::Value::String(event.level.to_str().to_string()))
    }

    fn name(&self) -> &str {
        "level"
    }
}

/// `${logger}` / `${logger:shortname=true}` — the logger name, or its
/// last dot-separated segment
pub struct LoggerRenderer {
    pub short_name: bool,
}

impl Renderer for LoggerRenderer {
    fn append(&self, buf: &mut String, event: &LogEvent) -> Result<()> {
        let name = if self.short_name {
            event
                .logger_name
                .rsplit('.')
                .next()
                .unwrap_or(&event.logger_name)
        } else {
            &event.logger_name
        };
        buf.push_str(name);
        Ok(())
    }

    fn name(&self) -> &str {
        "logger"
    }
}

/// `${message}` — the formatted message; `raw=true` skips parameter
/// substitution, `withexception=true` appends the exception text
pub struct MessageRenderer {
    pub raw: bool,
    pub with_exception: bool,
}

impl Renderer for MessageRenderer {
    fn append(&self, buf: &mut String, event: &LogEvent) -> Result<()> {
        if self.raw {
            buf.push_str(&event.message_template);
        } else {
            buf.push_str(&event.formatted_message());
        }
        if self.with_exception {
            if let Some(exception) = &event.exception {
                buf.push_str("|");
                buf.push_str(exception);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "message"
    }
}

fn has_subsecond_specifier(format: &str) -> bool {
    for token in ["%f", "%.f", "%.3f", "%.6f", "%.9f", "%3f", "%6f", "%9f", "%+"] {
        if format.contains(token) {
            return true;
        }
    }
    false
}

/// `${date:format=...}` — the event timestamp, strftime-formatted
///
/// When the format has no sub-second specifier the rendered text is
/// memoized keyed by the timestamp truncated to whole seconds, so a
/// burst of events inside one second formats once. A cache hit must
/// equal a full evaluation; the key carries the full resolution the
/// format can observe.
pub struct DateRenderer {
    format: String,
    cacheable: bool,
    cache: Mutex<Option<(i64, String)>>,
}

impl DateRenderer {
    pub fn new(format: String) -> Result<Self> {
        // Validate the format eagerly so bad templates fail at compile
        // time, not per event
        let probe = Utc
            .timestamp_opt(0, 0)
            .single()
            .expect("epoch is a valid timestamp");
        let mut scratch = String::new();
        Self::format_into(&mut scratch, &probe, &format)?;

        let cacheable = !has_subsecond_specifier(&format);
        Ok(Self {
            format,
            cacheable,
            cache: Mutex::new(None),
        })
    }

    fn format_into(buf: &mut String, timestamp: &DateTime<Utc>, format: &str) -> Result<()> {
        write!(buf, "{}", timestamp.format(format))
            .map_err(|_| DispatchError::render("date", format!("invalid format '{}'", format)))
    }
}

impl Renderer for DateRenderer {
    fn append(&self, buf: &mut String, event: &LogEvent) -> Result<()> {
        if !self.cacheable {
            return Self::format_into(buf, &event.timestamp, &self.format);
        }

        let key = event.timestamp.timestamp();
        {
            let cache = self.cache.lock();
            if let Some((cached_key, text)) = cache.as_ref() {
                if *cached_key == key {
                    buf.push_str(text);
                    return Ok(());
                }
            }
        }

        let mut text = String::with_capacity(self.format.len() + 8);
        Self::format_into(&mut text, &event.timestamp, &self.format)?;
        buf.push_str(&text);
        *self.cache.lock() = Some((key, text));
        Ok(())
    }

    fn name(&self) -> &str {
        "date"
    }
}

/// `${event-properties:item=key}` — one named structured property
pub struct EventPropertiesRenderer {
    pub item: String,
}

impl Renderer for EventPropertiesRenderer {
    fn append(&self, buf: &mut String, event: &LogEvent) -> Result<()> {
        if let Some(value) = event.properties.get(&self.item) {
            let _ = write!(buf, "{}", value);
        }
        Ok(())
    }

    fn raw_value(&self, event: &LogEvent) -> Option<serde_json::Value> {
        event
            .properties
            .get(&self.item)
            .map(|value| value.to_json_value())
    }

    fn name(&self) -> &str {
        "event-properties"
    }
}

/// `${thread}` — the snapshotted thread name (or id with `id=true`)
///
/// Reads the ambient snapshot taken at event creation, never the
/// executing thread, so it stays thread-agnostic.
pub struct ThreadRenderer {
    pub force_id: bool,
}

impl Renderer for ThreadRenderer {
    fn append(&self, buf: &mut String, event: &LogEvent) -> Result<()> {
        if !self.force_id {
            if let Some(name) = &event.thread_name {
                buf.push_str(name);
                return Ok(());
            }
        }
        buf.push_str(&event.thread_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "thread"
    }
}

/// `${newline}`
pub struct NewlineRenderer;

impl Renderer for NewlineRenderer {
    fn append(&self, buf: &mut String, _event: &LogEvent) -> Result<()> {
        buf.push('\n');
        Ok(())
    }

    fn name(&self) -> &str {
        "newline"
    }
}
