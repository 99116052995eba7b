//! Renderer registry: explicit name-to-factory mapping
//!
//! Renderers are resolved by name at compile time from this registry.
//! Registration is an explicit call made at startup (no runtime type
//! scanning); each factory owns validation of its bound parameters.

use super::node::{ParamValue, Renderer, TextTransform};
use crate::core::error::{DispatchError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Static description of a renderer consulted by the compiler:
/// the settable option names and which of them, if any, is the
/// default property bound by a bare `${name:value}` segment.
#[derive(Debug, Clone, Copy)]
pub struct RendererSpec {
    pub name: &'static str,
    pub default_property: Option<&'static str>,
    pub options: &'static [&'static str],
}

impl RendererSpec {
    pub fn knows_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o.eq_ignore_ascii_case(option))
    }
}

/// Resolved parameters for one renderer segment. Keys are lowercase;
/// values are literal text or nested layouts (re-evaluated per event).
pub struct RendererConfig {
    name: String,
    options: Vec<(String, ParamValue)>,
}

impl RendererConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind an option, replacing any earlier binding of the same key.
    /// The compiler applies the bare default-property value first, so
    /// an explicit `prop=value` assignment wins.
    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into().to_ascii_lowercase();
        if let Some(entry) = self.options.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.options.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Remove and return an option (used by the compiler to peel the
    /// wrapper `inner` parameter off before invoking the factory)
    pub fn take(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.options.iter().position(|(k, _)| k == key)?;
        Some(self.options.remove(index).1)
    }

    /// Literal text of an option; `None` if absent, an error if the
    /// option is layout-valued where only literal text makes sense
    pub fn literal(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_literal().map(Some).ok_or_else(|| {
                DispatchError::render(
                    self.name.clone(),
                    format!("option '{}' must be literal text", key),
                )
            }),
        }
    }

    /// Boolean option: `true`/`1` count as set
    pub fn flag(&self, key: &str) -> Result<bool> {
        Ok(matches!(
            self.literal(key)?,
            Some("true") | Some("1") | Some("True") | Some("TRUE")
        ))
    }

    /// Numeric option
    pub fn number(&self, key: &str) -> Result<Option<usize>> {
        match self.literal(key)? {
            None => Ok(None),
            Some(text) => text.trim().parse::<usize>().map(Some).map_err(|_| {
                DispatchError::render(
                    self.name.clone(),
                    format!("option '{}' expects a number, got '{}'", key, text),
                )
            }),
        }
    }
}

pub type RendererFactory =
    Arc<dyn Fn(RendererConfig) -> Result<Box<dyn Renderer>> + Send + Sync>;
pub type WrapperFactory =
    Arc<dyn Fn(&RendererConfig) -> Result<Box<dyn TextTransform>> + Send + Sync>;

pub(crate) enum Registration {
    /// A simple renderer producing output from the event
    Simple {
        spec: RendererSpec,
        factory: RendererFactory,
    },
    /// A wrapper transforming the span its inner layout produced
    Wrapper {
        spec: RendererSpec,
        factory: WrapperFactory,
    },
}

impl Registration {
    pub(crate) fn spec(&self) -> &RendererSpec {
        match self {
            Registration::Simple { spec, .. } => spec,
            Registration::Wrapper { spec, .. } => spec,
        }
    }
}

/// Explicit renderer name lookup, owned by the factory that compiles
/// layouts. Lookup is case-insensitive.
pub struct RendererRegistry {
    entries: HashMap<String, Registration>,
}

impl RendererRegistry {
    /// An empty registry with no renderers
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// A registry pre-populated with the builtin renderer set and
    /// wrapper transforms
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        super::renderers::register_builtin(&mut registry);
        super::wrappers::register_builtin(&mut registry);
        registry
    }

    /// Register a simple renderer. Re-registering a name replaces the
    /// previous entry.
    pub fn register<F>(&mut self, spec: RendererSpec, factory: F)
    where
        F: Fn(RendererConfig) -> Result<Box<dyn Renderer>> + Send + Sync + 'static,
    {
        self.entries.insert(
            spec.name.to_ascii_lowercase(),
            Registration::Simple {
                spec,
                factory: Arc::new(factory),
            },
        );
    }

    /// Register a wrapper transform
    pub fn register_wrapper<F>(&mut self, spec: RendererSpec, factory: F)
    where
        F: Fn(&RendererConfig) -> Result<Box<dyn TextTransform>> + Send + Sync + 'static,
    {
        self.entries.insert(
            spec.name.to_ascii_lowercase(),
            Registration::Wrapper {
                spec,
                factory: Arc::new(factory),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Registration> {
        self.entries.get(&name.to_ascii_lowercase())
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
