//! Compatibility bridge for the Rust `log` crate.
//!
//! `UdpLogAdapter` implements `log::Log` and turns each record into a
//! [`LogEvent`] for a [`LogHandler`], normally a
//! [`UdpSender`](crate::udp_sender::UdpSender). Structured key/values become
//! event properties, so `log::info!(EventID = 17; "started")` sets the
//! packet's event id.
//!
//! Records on the crate's own targets (see
//! [`is_internal_target`](crate::error_reporter::is_internal_target)) are
//! never sent. Those at `Warn` or above, which include the sender's failure
//! reports, go to a separate [`ErrorReporter`] that prints to stderr unless
//! replaced with [`UdpLogAdapter::with_internal_reporter`].

use std::collections::BTreeMap;
use std::sync::Arc;

use log::kv::{self, Key, Value, VisitSource};
use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::error_reporter::{ErrorReporter, StderrErrorReporter, is_internal_target};
use crate::handler::LogHandler;
use crate::level::Level;
use crate::log_event::{LogEvent, PropertyValue};

/// Adapter implementing the Rust `log::Log` trait.
pub struct UdpLogAdapter {
    handler: Box<dyn LogHandler>,
    internal: Arc<dyn ErrorReporter>,
    max_level: LevelFilter,
}

impl UdpLogAdapter {
    pub fn new(handler: impl LogHandler + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            internal: Arc::new(StderrErrorReporter),
            max_level: LevelFilter::Trace,
        }
    }

    /// Send the crate's own warnings and failure reports to `reporter`.
    pub fn with_internal_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.internal = reporter;
        self
    }

    /// Drop records more verbose than `max_level`.
    pub fn with_max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }

    /// Install the adapter as the global logger.
    ///
    /// Fails when another logger has already been installed.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

struct PropertyCollector(BTreeMap<String, PropertyValue>);

impl<'kvs> VisitSource<'kvs> for PropertyCollector {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        self.0.insert(key.as_str().to_owned(), property_from_value(&value));
        Ok(())
    }
}

fn property_from_value(value: &Value<'_>) -> PropertyValue {
    if let Some(int) = value.to_i64() {
        PropertyValue::Integer(int)
    } else if let Some(boolean) = value.to_bool() {
        PropertyValue::Bool(boolean)
    } else if let Some(float) = value.to_f64() {
        PropertyValue::Float(float)
    } else {
        PropertyValue::Text(value.to_string())
    }
}

/// Convert a `log` record into an event.
pub fn event_from_record(record: &Record<'_>) -> LogEvent {
    let mut collector = PropertyCollector(BTreeMap::new());
    if let Err(err) = record.key_values().visit(&mut collector) {
        log::debug!(target: "udplog::log_compat", "failed to read record key/values: {err}");
    }
    let origin = record.module_path().unwrap_or_else(|| record.target());
    let mut event = LogEvent::new(Level::from(record.level()), record.args().to_string())
        .with_origin(origin);
    event.properties = collector.0;
    event
}

impl log::Log for UdpLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if is_internal_target(record.target()) {
            if record.level() <= log::Level::Warn {
                self.internal.report(&record.args().to_string());
            }
            return;
        }
        self.handler.handle(&event_from_record(record));
    }

    fn flush(&self) {}
}
