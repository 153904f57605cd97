//! A simple handler that accumulates events in memory for test assertions.
//!
//! This module is shared across multiple test files so that each test module
//! does not need its own copy of the same boilerplate.

use crate::handler::LogHandler;
use crate::log_event::LogEvent;
use parking_lot::Mutex;
use std::sync::Arc;

/// Handler that stores every event it receives for later inspection.
#[derive(Clone, Default)]
pub struct CollectingHandler {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl CollectingHandler {
    /// Create a new empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of all events received so far.
    pub fn collected(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }
}

impl LogHandler for CollectingHandler {
    fn handle(&self, event: &LogEvent) {
        self.events.lock().push(event.clone());
    }
}
