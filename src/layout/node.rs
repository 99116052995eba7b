//! Compiled layout representation and per-event evaluation
//!
//! A `Layout` owns a tree of nodes compiled once from a template.
//! Evaluation appends into a caller-owned buffer; wrapper transforms
//! operate on only the span their inner nodes just produced, tracked
//! by a start offset.

use crate::core::diagnostics::Diagnostics;
use crate::core::error::Result;
use crate::core::log_event::LogEvent;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

/// A renderer resolved by name from the registry
///
/// Renderers are stateless except for private cached state they declare
/// (see the date renderer); such renderers are individually responsible
/// for thread safety, since multiple producers may render concurrently
/// through the same compiled tree.
pub trait Renderer: Send + Sync {
    /// Append this renderer's output for `event` to `buf`
    fn append(&self, buf: &mut String, event: &LogEvent) -> Result<()>;

    /// True if the output does not depend on which thread evaluates it.
    /// Non-agnostic renderers force producer-side pre-rendering before
    /// a cross-thread handoff.
    fn is_thread_agnostic(&self) -> bool {
        true
    }

    /// The original typed value, for structured sinks that want the
    /// value rather than text
    fn raw_value(&self, _event: &LogEvent) -> Option<serde_json::Value> {
        None
    }

    fn name(&self) -> &str;
}

/// A transform applied by a wrapper node over its inner span
pub trait TextTransform: Send + Sync {
    fn apply(&self, span: &mut String);
    fn name(&self) -> &str;
}

/// A bound renderer parameter: literal text, or a nested layout
/// re-evaluated per event
pub enum ParamValue {
    Literal(String),
    Layout(Layout),
}

impl ParamValue {
    /// Evaluate against an event (literals ignore the event)
    pub fn evaluate(&self, event: &LogEvent) -> String {
        match self {
            ParamValue::Literal(text) => text.clone(),
            ParamValue::Layout(layout) => layout.render(event),
        }
    }

    /// Literal text, if this parameter is not layout-valued
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            ParamValue::Literal(text) => Some(text),
            ParamValue::Layout(_) => None,
        }
    }

    pub fn is_thread_agnostic(&self) -> bool {
        match self {
            ParamValue::Literal(_) => true,
            ParamValue::Layout(layout) => layout.is_thread_agnostic(),
        }
    }
}

pub enum Node {
    Literal(String),
    Renderer(Box<dyn Renderer>),
    Wrapper {
        transform: Box<dyn TextTransform>,
        inner: Vec<Node>,
    },
}

impl Node {
    fn is_thread_agnostic(&self) -> bool {
        match self {
            Node::Literal(_) => true,
            Node::Renderer(renderer) => renderer.is_thread_agnostic(),
            Node::Wrapper { inner, .. } => inner.iter().all(Node::is_thread_agnostic),
        }
    }

    fn append_to(&self, buf: &mut String, event: &LogEvent, diagnostics: Option<&Diagnostics>) {
        match self {
            Node::Literal(text) => buf.push_str(text),
            Node::Renderer(renderer) => {
                let start = buf.len();
                if let Err(err) = renderer.append(buf, event) {
                    // Replace any partial output with empty text and
                    // continue with siblings
                    buf.truncate(start);
                    if let Some(diag) = diagnostics {
                        diag.report_render_error(renderer.name(), &err.to_string());
                    }
                }
            }
            Node::Wrapper { transform, inner } => {
                let start = buf.len();
                for node in inner {
                    node.append_to(buf, event, diagnostics);
                }
                // Transform only the span the inner nodes produced
                let mut span = buf.split_off(start);
                transform.apply(&mut span);
                buf.push_str(&span);
            }
        }
    }
}

/// A compiled template producing text from a log event
pub struct Layout {
    id: u64,
    template: String,
    nodes: Vec<Node>,
    thread_agnostic: bool,
}

impl Layout {
    pub(crate) fn from_nodes(template: String, nodes: Vec<Node>) -> Self {
        let thread_agnostic = nodes.iter().all(Node::is_thread_agnostic);
        Self {
            id: NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed),
            template,
            nodes,
            thread_agnostic,
        }
    }

    /// The source template this layout was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Consume the layout, yielding its node tree (used when a compiled
    /// value becomes a wrapper's inner span)
    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Identity used as the key into an event's layout cache
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True if rendering does not depend on the executing thread; such
    /// layouts may be rendered lazily after a cross-thread handoff
    pub fn is_thread_agnostic(&self) -> bool {
        self.thread_agnostic
    }

    /// Append the rendered text for `event` to `buf`
    ///
    /// Render faults are swallowed per node (empty output); use
    /// [`Layout::render_to_reporting`] to surface them to diagnostics.
    pub fn render_to(&self, buf: &mut String, event: &LogEvent) {
        self.render_inner(buf, event, None);
    }

    /// Append the rendered text, reporting per-node faults to `diagnostics`
    pub fn render_to_reporting(
        &self,
        buf: &mut String,
        event: &LogEvent,
        diagnostics: &Diagnostics,
    ) {
        self.render_inner(buf, event, Some(diagnostics));
    }

    fn render_inner(&self, buf: &mut String, event: &LogEvent, diagnostics: Option<&Diagnostics>) {
        if !self.thread_agnostic {
            if let Some(cached) = event.layout_cache.lookup(self.id) {
                buf.push_str(&cached);
                return;
            }
        }
        for node in &self.nodes {
            node.append_to(buf, event, diagnostics);
        }
    }

    /// Allocating convenience form of [`Layout::render_to`]
    pub fn render(&self, event: &LogEvent) -> String {
        let mut buf = String::with_capacity(self.template.len() + 32);
        self.render_to(&mut buf, event);
        buf
    }

    /// Render on the calling thread and snapshot the result into the
    /// event's layout cache, so a later render on another thread sees
    /// this thread's output. No-op for thread-agnostic layouts.
    pub fn precalculate(&self, event: &LogEvent) {
        if self.thread_agnostic {
            return;
        }
        if event.layout_cache.lookup(self.id).is_some() {
            return;
        }
        let mut buf = String::with_capacity(self.template.len() + 32);
        for node in &self.nodes {
            node.append_to(&mut buf, event, None);
        }
        event.layout_cache.store(self.id, buf);
    }
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("template", &self.template)
            .field("thread_agnostic", &self.thread_agnostic)
            .finish()
    }
}
