//! Log level definitions and level sets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Default)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    /// Sentinel: never matches any rule and disables logging entirely
    Off = 6,
}

/// The real (loggable) levels, in ascending order. Excludes `Off`.
pub const LEVELS: [LogLevel; 6] = [
    LogLevel::Trace,
    LogLevel::Debug,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Error,
    LogLevel::Fatal,
];

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Off => "OFF",
        }
    }

    /// Index into per-level routing slots. `None` for `Off`.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            LogLevel::Off => None,
            level => Some(*level as usize),
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Trace => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal | LogLevel::Off => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "OFF" | "NONE" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// A set of enabled levels, stored as a bitmask over the six real levels.
///
/// `Off` contributes nothing: `LevelSet::from_min(LogLevel::Off)` is empty
/// and `contains(LogLevel::Off)` is always false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelSet(u8);

impl LevelSet {
    /// The empty set
    pub const EMPTY: LevelSet = LevelSet(0);

    /// All six real levels
    pub const ALL: LevelSet = LevelSet(0b0011_1111);

    /// Set containing a single level (empty for `Off`)
    pub fn single(level: LogLevel) -> Self {
        match level.ordinal() {
            Some(i) => LevelSet(1 << i),
            None => LevelSet::EMPTY,
        }
    }

    /// All levels at or above `min` (empty for `Off`)
    pub fn from_min(min: LogLevel) -> Self {
        match min.ordinal() {
            Some(i) => LevelSet(Self::ALL.0 & !((1u8 << i) - 1)),
            None => LevelSet::EMPTY,
        }
    }

    /// All levels strictly below `threshold` (`Off` yields all six)
    pub fn below(threshold: LogLevel) -> Self {
        match threshold.ordinal() {
            Some(i) => LevelSet(Self::ALL.0 & ((1u8 << i) - 1)),
            None => LevelSet::ALL,
        }
    }

    /// All levels in `min..=max` inclusive
    pub fn from_range(min: LogLevel, max: LogLevel) -> Self {
        let mut set = LevelSet::EMPTY;
        for level in LEVELS {
            if level >= min && level <= max {
                set = set.with(level);
            }
        }
        set
    }

    /// Set built from an explicit list of levels
    pub fn from_levels(levels: &[LogLevel]) -> Self {
        levels
            .iter()
            .fold(LevelSet::EMPTY, |set, level| set.with(*level))
    }

    #[must_use]
    pub fn with(self, level: LogLevel) -> Self {
        LevelSet(self.0 | LevelSet::single(level).0)
    }

    #[must_use]
    pub fn without(self, level: LogLevel) -> Self {
        LevelSet(self.0 & !LevelSet::single(level).0)
    }

    #[must_use]
    pub fn union(self, other: LevelSet) -> Self {
        LevelSet(self.0 | other.0)
    }

    #[must_use]
    pub fn intersect(self, other: LevelSet) -> Self {
        LevelSet(self.0 & other.0)
    }

    /// The real levels not in this set
    #[must_use]
    pub fn complement(self) -> Self {
        LevelSet(Self::ALL.0 & !self.0)
    }

    pub fn contains(&self, level: LogLevel) -> bool {
        match level.ordinal() {
            Some(i) => self.0 & (1 << i) != 0,
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Lowest level in the set, if any
    pub fn min_level(&self) -> Option<LogLevel> {
        LEVELS.iter().copied().find(|l| self.contains(*l))
    }

    /// Iterate the contained levels in ascending order
    pub fn iter(&self) -> impl Iterator<Item = LogLevel> + '_ {
        LEVELS.into_iter().filter(|l| self.contains(*l))
    }
}

impl fmt::Display for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for level in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", level)?;
            first = false;
        }
        Ok(())
    }
}
