//! Layout template compiler and renderer tree

pub mod node;
pub mod parser;
pub mod registry;
pub mod renderers;
pub mod wrappers;

pub use node::{Layout, Node, ParamValue, Renderer, TextTransform};
pub use parser::CompileMode;
pub use registry::{RendererConfig, RendererRegistry, RendererSpec};
