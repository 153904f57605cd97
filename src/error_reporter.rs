//! Side channel receiving send failures.
//!
//! Failures never travel back to the code that logged the event. They are
//! handed to an [`ErrorReporter`] instead, which by default writes them to the
//! `log` facade under the [`ERROR_TARGET`] target.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::rate_limited_warner::RateLimitedWarner;

/// Log target used for the crate's own failure reports.
pub const ERROR_TARGET: &str = "udplog::error";

/// Root of every log target the crate writes to.
pub const INTERNAL_TARGET: &str = "udplog";

/// Whether `target` is one of the crate's own log targets.
///
/// Facade bridges must never turn these records into packets: a failing send
/// would report itself, and that report would fail again.
pub fn is_internal_target(target: &str) -> bool {
    target
        .strip_prefix(INTERNAL_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Receives human-readable descriptions of failed sends.
pub trait ErrorReporter: Send + Sync {
    /// Record a single failure. Must not block or panic.
    fn report(&self, message: &str);
}

impl<F> ErrorReporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Reporter writing to `log::error!`, collapsing bursts into one line per
/// interval with a count of the failures it held back.
#[derive(Default)]
pub struct LogErrorReporter {
    warner: RateLimitedWarner,
}

impl LogErrorReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            warner: RateLimitedWarner::new(interval),
        }
    }
}

impl ErrorReporter for LogErrorReporter {
    fn report(&self, message: &str) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| match count {
            1 => log::error!(target: ERROR_TARGET, "{message}"),
            _ => log::error!(
                target: ERROR_TARGET,
                "{message} ({} earlier failures suppressed)",
                count - 1
            ),
        });
    }
}

impl Drop for LogErrorReporter {
    fn drop(&mut self) {
        self.warner.flush(|count| {
            log::warn!(target: ERROR_TARGET, "{count} UDP log failures were never reported");
        });
    }
}

/// Reporter printing every failure to standard error.
///
/// Used by the facade bridges for the crate's own diagnostics, which cannot
/// travel through the sender they describe.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrErrorReporter;

impl ErrorReporter for StderrErrorReporter {
    fn report(&self, message: &str) {
        eprintln!("udplog: {message}");
    }
}

/// Reporter forwarding every failure into a bounded channel.
///
/// Reports are dropped once the channel is full or the receiver is gone; the
/// sender never waits on a slow consumer.
#[derive(Clone, Debug)]
pub struct ChannelErrorReporter {
    tx: Sender<String>,
}

impl ChannelErrorReporter {
    /// Create a reporter and the receiving end of its channel.
    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl ErrorReporter for ChannelErrorReporter {
    fn report(&self, message: &str) {
        match self.tx.try_send(message.to_owned()) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                log::debug!(target: ERROR_TARGET, "error channel full; dropped report: {message}");
            }
        }
    }
}
