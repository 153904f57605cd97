//! `tracing` integration.
//!
//! [`UdpLayer`] is a `tracing_subscriber` layer that converts each `tracing`
//! event into a [`LogEvent`] for a [`LogHandler`]. The `message` field becomes
//! the rendered message; every other field is stored as a property, so
//! `tracing::info!(EventID = 17, "started")` sets the packet's event id.
//!
//! Events on the crate's own targets are never sent; those at `WARN` or above
//! go to the layer's internal [`ErrorReporter`] instead.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::error_reporter::{ErrorReporter, StderrErrorReporter, is_internal_target};
use crate::handler::LogHandler;
use crate::level::Level;
use crate::log_event::{LogEvent, PropertyValue};

/// Layer forwarding `tracing` events to a handler.
pub struct UdpLayer {
    handler: Box<dyn LogHandler>,
    internal: Arc<dyn ErrorReporter>,
}

impl UdpLayer {
    pub fn new(handler: impl LogHandler + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            internal: Arc::new(StderrErrorReporter),
        }
    }

    /// Send the crate's own warnings and failure reports to `reporter`.
    pub fn with_internal_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.internal = reporter;
        self
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    properties: BTreeMap<String, PropertyValue>,
}

impl EventVisitor {
    fn insert(&mut self, field: &Field, value: PropertyValue) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.properties.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for EventVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, PropertyValue::Integer(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let value = i64::try_from(value)
            .map(PropertyValue::Integer)
            .unwrap_or_else(|_| PropertyValue::Text(value.to_string()));
        self.insert(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, PropertyValue::Float(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, PropertyValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, PropertyValue::Text(value.to_owned()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, PropertyValue::Text(format!("{value:?}")));
    }
}

/// Convert a `tracing` event into a log event.
pub fn event_from_tracing(event: &Event<'_>) -> LogEvent {
    let metadata = event.metadata();
    let mut visitor = EventVisitor::default();
    event.record(&mut visitor);
    let origin = metadata.module_path().unwrap_or_else(|| metadata.target());
    let mut log_event = LogEvent::new(
        Level::from(*metadata.level()),
        visitor.message.unwrap_or_default(),
    )
    .with_origin(origin);
    log_event.properties = visitor.properties;
    log_event
}

impl<S: Subscriber> Layer<S> for UdpLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal_target(metadata.target()) {
            if *metadata.level() <= tracing::Level::WARN {
                self.internal.report(&event_from_tracing(event).message);
            }
            return;
        }
        self.handler.handle(&event_from_tracing(event));
    }
}
