//! Layout template compiler
//!
//! Grammar: text outside `${...}` is literal, `$$` escapes a literal
//! `$`, and a `${name:opt=val:...}` segment selects a renderer from
//! the registry. Option values may themselves contain `${...}`, which
//! makes the parameter layout-valued (re-evaluated per event). Inside
//! a segment, `\:` and `\}` escape the separator characters. A bare
//! value with no `=` binds the renderer's default property; bare parts
//! are rejoined with `:` so formats like `${date:%H:%M:%S}` survive
//! splitting.

use super::node::{Layout, Node, ParamValue};
use super::registry::{Registration, RendererConfig, RendererRegistry};
use crate::core::error::{DispatchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileMode {
    /// Unknown renderers/options and unmatched braces are compile errors
    #[default]
    Strict,
    /// Offending segments degrade to literal text
    Lenient,
}

impl Layout {
    /// Compile a template against a renderer registry
    pub fn compile(
        template: &str,
        registry: &RendererRegistry,
        mode: CompileMode,
    ) -> Result<Layout> {
        let nodes = compile_nodes(template, registry, mode)?;
        Ok(Layout::from_nodes(template.to_string(), nodes))
    }
}

fn compile_nodes(
    template: &str,
    registry: &RendererRegistry,
    mode: CompileMode,
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'$') {
            literal.push('$');
            i += 2;
        } else if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            match find_segment_end(bytes, i + 2) {
                Some(end) => {
                    let body = &template[i + 2..end];
                    match build_segment(body, i, registry, mode)? {
                        Some(node) => {
                            flush_literal(&mut literal, &mut nodes);
                            nodes.push(node);
                        }
                        // Lenient degradation: keep the raw segment text
                        None => literal.push_str(&template[i..=end]),
                    }
                    i = end + 1;
                }
                None => {
                    if mode == CompileMode::Strict {
                        return Err(DispatchError::compile(i, "unmatched '${'"));
                    }
                    literal.push_str(&template[i..]);
                    i = bytes.len();
                }
            }
        } else {
            let ch = template[i..].chars().next().expect("index on char boundary");
            literal.push(ch);
            i += ch.len_utf8();
        }
    }

    flush_literal(&mut literal, &mut nodes);
    Ok(nodes)
}

fn flush_literal(literal: &mut String, nodes: &mut Vec<Node>) {
    if !literal.is_empty() {
        nodes.push(Node::Literal(std::mem::take(literal)));
    }
}

/// Find the byte index of the `}` closing a segment whose body starts
/// at `start`, honoring nested `${...}`, `$$`, and `\`-escapes
fn find_segment_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'$') => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
            }
            b'}' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Split a segment body on top-level `:` separators
fn split_top_level(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut part_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'$') => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                i += 1;
            }
            b':' if depth == 0 => {
                parts.push(&body[part_start..i]);
                part_start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parts.push(&body[part_start..]);
    parts
}

/// First top-level `=` in an option part, if any
fn find_top_level_eq(part: &str) -> Option<usize> {
    let bytes = part.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'$') => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                i += 1;
            }
            b'=' if depth == 0 => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Remove `\`-escapes outside nested `${...}` segments; nested segment
/// text is preserved verbatim for its own compile pass
fn unescape_top_level(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && depth == 0 && i + 1 < bytes.len() {
            let ch = text[i + 1..].chars().next().expect("escape has a target");
            out.push(ch);
            i += 1 + ch.len_utf8();
            continue;
        }
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            depth += 1;
            out.push_str("${");
            i += 2;
            continue;
        }
        if bytes[i] == b'}' && depth > 0 {
            depth -= 1;
            out.push('}');
            i += 1;
            continue;
        }
        let ch = text[i..].chars().next().expect("index on char boundary");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Build the node for one `${...}` segment.
///
/// `Ok(None)` signals lenient degradation to literal text; strict-mode
/// failures return the compile error directly.
fn build_segment(
    body: &str,
    offset: usize,
    registry: &RendererRegistry,
    mode: CompileMode,
) -> Result<Option<Node>> {
    let fail = |message: String| -> Result<Option<Node>> {
        if mode == CompileMode::Strict {
            Err(DispatchError::compile(offset, message))
        } else {
            Ok(None)
        }
    };

    let parts = split_top_level(body);
    let name = parts[0].trim();
    if name.is_empty() {
        return fail("empty renderer name".to_string());
    }

    let registration = match registry.lookup(name) {
        Some(registration) => registration,
        None => return fail(format!("unknown renderer '{}'", name)),
    };
    let spec = *registration.spec();

    // Bare values bind the default property; explicit `prop=value`
    // assignments are applied afterwards so they win
    let mut bare_parts: Vec<String> = Vec::new();
    let mut explicit: Vec<(String, &str)> = Vec::new();
    for part in &parts[1..] {
        match find_top_level_eq(part) {
            Some(eq) => {
                let key = part[..eq].trim().to_ascii_lowercase();
                if key.is_empty() {
                    return fail(format!("option with empty name in '{}'", name));
                }
                if !spec.knows_option(&key) {
                    return fail(format!("unknown option '{}' for renderer '{}'", key, name));
                }
                explicit.push((key, &part[eq + 1..]));
            }
            None => bare_parts.push(part.to_string()),
        }
    }

    let mut config = RendererConfig::new(spec.name);
    if !bare_parts.is_empty() {
        let Some(default_property) = spec.default_property else {
            return fail(format!("renderer '{}' has no default property", name));
        };
        // Rejoin so colon-bearing values like date formats survive
        let value = bare_parts.join(":");
        match compile_value(&value, registry, mode)? {
            Some(param) => config.set(default_property, param),
            None => return Ok(None),
        }
    }
    for (key, raw_value) in explicit {
        match compile_value(raw_value, registry, mode)? {
            Some(param) => config.set(key, param),
            None => return Ok(None),
        }
    }

    match registration {
        Registration::Simple { factory, .. } => match factory(config) {
            Ok(renderer) => Ok(Some(Node::Renderer(renderer))),
            Err(err) => fail(err.to_string()),
        },
        Registration::Wrapper { factory, .. } => {
            let inner = match config.take("inner") {
                Some(ParamValue::Layout(layout)) => layout.into_nodes(),
                Some(ParamValue::Literal(text)) => vec![Node::Literal(text)],
                None => {
                    return fail(format!("wrapper '{}' requires an inner layout", name));
                }
            };
            match factory(&config) {
                Ok(transform) => Ok(Some(Node::Wrapper { transform, inner })),
                Err(err) => fail(err.to_string()),
            }
        }
    }
}

/// Compile one option value: nested `${...}` makes it layout-valued,
/// anything else is literal text (whitespace preserved verbatim)
fn compile_value(
    raw: &str,
    registry: &RendererRegistry,
    mode: CompileMode,
) -> Result<Option<ParamValue>> {
    let value = unescape_top_level(raw);
    if value.contains("${") {
        let nodes = match compile_nodes(&value, registry, mode) {
            Ok(nodes) => nodes,
            Err(err) => {
                return if mode == CompileMode::Strict {
                    Err(err)
                } else {
                    Ok(None)
                }
            }
        };
        Ok(Some(ParamValue::Layout(Layout::from_nodes(value, nodes))))
    } else {
        Ok(Some(ParamValue::Literal(value)))
    }
}
