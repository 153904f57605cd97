//! Log event representation consumed by the packet encoder.
//!
//! A `LogEvent` carries the timestamp, severity, rendered message and origin
//! name of a single log call, plus a bag of structured properties. The
//! property stored under [`EVENT_ID_PROPERTY`] becomes the packet's event id.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::PacketError;
use crate::level::Level;

/// Property key holding the numeric event identifier.
pub const EVENT_ID_PROPERTY: &str = "EventID";

/// Value stored in an event's property bag.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    /// Best-effort conversion to a signed 32-bit event id.
    ///
    /// Integers must be in range, floats are rounded half-to-even, booleans
    /// map to `1`/`0` and text must parse as a decimal integer once trimmed.
    pub fn to_event_id(&self) -> Result<i32, PacketError> {
        let converted = match self {
            PropertyValue::Integer(value) => i32::try_from(*value).ok(),
            PropertyValue::Float(value) => float_to_i32(*value),
            PropertyValue::Bool(value) => Some(i32::from(*value)),
            PropertyValue::Text(text) => text.trim().parse::<i32>().ok(),
        };
        converted.ok_or_else(|| PacketError::InvalidEventId {
            value: self.to_string(),
        })
    }
}

fn float_to_i32(value: f64) -> Option<i32> {
    let rounded = value.round_ties_even();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Some(rounded as i32)
    } else {
        None
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(value) => write!(f, "{value}"),
            PropertyValue::Float(value) => write!(f, "{value}"),
            PropertyValue::Bool(value) => write!(f, "{value}"),
            PropertyValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    /// Time the event was created.
    pub timestamp: DateTime<Utc>,
    /// Severity of the event.
    pub level: Level,
    /// Fully rendered message text.
    pub message: String,
    /// Assembly or module the event originated from. May be empty.
    pub origin: String,
    /// Structured properties attached to the event.
    pub properties: BTreeMap<String, PropertyValue>,
}

impl LogEvent {
    /// Construct an event stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            origin: String::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Attach a structured property, replacing any previous value for `key`.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_event_id(self, event_id: i32) -> Self {
        self.with_property(EVENT_ID_PROPERTY, event_id)
    }

    /// Event id taken from the `EventID` property, or `0` when absent.
    pub fn event_id(&self) -> Result<i32, PacketError> {
        self.properties
            .get(EVENT_ID_PROPERTY)
            .map_or(Ok(0), PropertyValue::to_event_id)
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
