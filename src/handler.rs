use crate::log_event::LogEvent;

/// Trait implemented by every sink that accepts log events.
///
/// Handlers are `Send + Sync` so one instance can serve logging calls from
/// any thread. `handle` never fails from the caller's point of view: problems
/// are reported through the handler's own error channel.
pub trait LogHandler: Send + Sync {
    /// Dispatch an event for handling.
    fn handle(&self, event: &LogEvent);
}
