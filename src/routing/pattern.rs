//! Logger-name pattern matching
//!
//! Four wildcard shapes plus exact match; arbitrary glob syntax is
//! intentionally unsupported. Interior wildcards are rejected at
//! configuration-build time.

use crate::core::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamePattern {
    /// `*` — matches every logger name
    All,
    /// No wildcard — matches the exact name
    Exact(String),
    /// `text*` — matches names starting with `text`
    Prefix(String),
    /// `*text` — matches names ending with `text`
    Suffix(String),
    /// `*text*` — matches names containing `text`
    Contains(String),
}

impl NamePattern {
    /// Parse a pattern string, rejecting wildcard placements outside
    /// the four supported shapes
    pub fn parse(pattern: &str) -> Result<Self> {
        let stars = pattern.matches('*').count();
        match stars {
            0 => Ok(NamePattern::Exact(pattern.to_string())),
            1 if pattern == "*" => Ok(NamePattern::All),
            1 if pattern.ends_with('*') => Ok(NamePattern::Prefix(
                pattern[..pattern.len() - 1].to_string(),
            )),
            1 if pattern.starts_with('*') => {
                Ok(NamePattern::Suffix(pattern[1..].to_string()))
            }
            2 if pattern.starts_with('*') && pattern.ends_with('*') && pattern.len() >= 3 => Ok(
                NamePattern::Contains(pattern[1..pattern.len() - 1].to_string()),
            ),
            _ => Err(DispatchError::route(
                pattern,
                "wildcards are only supported as 'text*', '*text', '*text*', or '*'",
            )),
        }
    }

    pub fn matches(&self, logger_name: &str) -> bool {
        match self {
            NamePattern::All => true,
            NamePattern::Exact(text) => logger_name == text,
            NamePattern::Prefix(text) => logger_name.starts_with(text.as_str()),
            NamePattern::Suffix(text) => logger_name.ends_with(text.as_str()),
            NamePattern::Contains(text) => logger_name.contains(text.as_str()),
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::All => write!(f, "*"),
            NamePattern::Exact(text) => write!(f, "{}", text),
            NamePattern::Prefix(text) => write!(f, "{}*", text),
            NamePattern::Suffix(text) => write!(f, "*{}", text),
            NamePattern::Contains(text) => write!(f, "*{}*", text),
        }
    }
}

impl FromStr for NamePattern {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        NamePattern::parse(s)
    }
}
