//! Builtin wrapper transforms
//!
//! A wrapper renders its inner layout into the shared buffer, then
//! rewrites only that span. The inner layout is the wrapper's default
//! property: `${uppercase:${level}}` or `${pad:inner=${level}:width=5}`.

use super::node::TextTransform;
use super::registry::{RendererConfig, RendererRegistry, RendererSpec};
use crate::core::error::Result;

pub(crate) fn register_builtin(registry: &mut RendererRegistry) {
    registry.register_wrapper(
        RendererSpec {
            name: "uppercase",
            default_property: Some("inner"),
            options: &["inner"],
        },
        |_config| Ok(Box::new(UppercaseTransform) as Box<dyn TextTransform>),
    );

    registry.register_wrapper(
        RendererSpec {
            name: "lowercase",
            default_property: Some("inner"),
            options: &["inner"],
        },
        |_config| Ok(Box::new(LowercaseTransform) as Box<dyn TextTransform>),
    );

    registry.register_wrapper(
        RendererSpec {
            name: "trim",
            default_property: Some("inner"),
            options: &["inner"],
        },
        |_config| Ok(Box::new(TrimTransform) as Box<dyn TextTransform>),
    );

    registry.register_wrapper(
        RendererSpec {
            name: "pad",
            default_property: Some("inner"),
            options: &["inner", "width", "padcharacter", "alignment"],
        },
        |config| {
            let transform = PadTransform::from_config(config)?;
            Ok(Box::new(transform) as Box<dyn TextTransform>)
        },
    );
}

pub struct UppercaseTransform;

impl TextTransform for UppercaseTransform {
    fn apply(&self, span: &mut String) {
        *span = span.to_uppercase();
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}

pub struct LowercaseTransform;

impl TextTransform for LowercaseTransform {
    fn apply(&self, span: &mut String) {
        *span = span.to_lowercase();
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}

pub struct TrimTransform;

impl TextTransform for TrimTransform {
    fn apply(&self, span: &mut String) {
        let trimmed = span.trim();
        if trimmed.len() != span.len() {
            *span = trimmed.to_string();
        }
    }

    fn name(&self) -> &str {
        "trim"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadAlignment {
    /// Pad on the right: span keeps its leading position
    Left,
    /// Pad on the left: span is pushed to the right edge
    Right,
}

/// `${pad:inner=...:width=N:padcharacter=c:alignment=left|right}`
///
/// Pads the inner span to at least `width` characters. Spans already
/// wider than `width` are left untouched.
pub struct PadTransform {
    pub width: usize,
    pub pad_char: char,
    pub alignment: PadAlignment,
}

impl PadTransform {
    fn from_config(config: &RendererConfig) -> Result<Self> {
        let width = config.number("width")?.unwrap_or(0);
        let pad_char = config
            .literal("padcharacter")?
            .and_then(|text| text.chars().next())
            .unwrap_or(' ');
        let alignment = match config.literal("alignment")? {
            Some(text) if text.eq_ignore_ascii_case("right") => PadAlignment::Right,
            _ => PadAlignment::Left,
        };
        Ok(Self {
            width,
            pad_char,
            alignment,
        })
    }
}

impl TextTransform for PadTransform {
    fn apply(&self, span: &mut String) {
        let len = span.chars().count();
        if len >= self.width {
            return;
        }
        let padding: String = std::iter::repeat(self.pad_char)
            .take(self.width - len)
            .collect();
        match self.alignment {
            PadAlignment::Left => span.push_str(&padding),
            PadAlignment::Right => span.insert_str(0, &padding),
        }
    }

    fn name(&self) -> &str {
        "pad"
    }
}
