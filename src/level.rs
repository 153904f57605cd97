//! Integer-valued log severities.
//!
//! Levels are ordered by their numeric value. The named constants follow the
//! log4net numbering so packets produced here line up with collectors that
//! already understand those values. Only the low byte travels on the wire; see
//! [`Level::wire_byte`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(i32);

impl Level {
    pub const TRACE: Level = Level(20_000);
    pub const DEBUG: Level = Level(30_000);
    pub const INFO: Level = Level(40_000);
    pub const WARN: Level = Level(60_000);
    pub const ERROR: Level = Level(70_000);
    pub const FATAL: Level = Level(110_000);

    /// Wrap an arbitrary severity value.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// The full severity value.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Low eight bits of the value, as written into the packet header.
    ///
    /// Values above 255 silently lose their high bits: `300` becomes `44`.
    pub const fn wire_byte(self) -> u8 {
        self.0 as u8
    }

    fn name(self) -> Option<&'static str> {
        match self {
            Level::TRACE => Some("TRACE"),
            Level::DEBUG => Some("DEBUG"),
            Level::INFO => Some("INFO"),
            Level::WARN => Some("WARN"),
            Level::ERROR => Some("ERROR"),
            Level::FATAL => Some("FATAL"),
            _ => None,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::INFO
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "LEVEL({})", self.0),
        }
    }
}

/// Returned when a level name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level {0:?}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::TRACE),
            "DEBUG" => Ok(Self::DEBUG),
            "INFO" => Ok(Self::INFO),
            "WARN" | "WARNING" => Ok(Self::WARN),
            "ERROR" => Ok(Self::ERROR),
            "FATAL" | "CRITICAL" => Ok(Self::FATAL),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::TRACE,
            log::Level::Debug => Level::DEBUG,
            log::Level::Info => Level::INFO,
            log::Level::Warn => Level::WARN,
            log::Level::Error => Level::ERROR,
        }
    }
}

#[cfg(feature = "tracing-compat")]
impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::TRACE,
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::ERROR => Level::ERROR,
        }
    }
}
