//! Public sender type exported by the crate.

use std::{
    io,
    net::Ipv4Addr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    error::{PacketError, SendError},
    error_reporter::{ErrorReporter, LogErrorReporter},
    handler::LogHandler,
    log_event::LogEvent,
    packet,
};

use super::{
    address::LocalAddressResolver,
    config::UdpSenderConfig,
    transport::{DatagramTransport, UdpTransport},
};

/// What happened to one event passed to [`UdpSender::send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The packet was accepted by the transport.
    Delivered,
    /// The event could not be encoded; the failure was reported and the event
    /// dropped.
    EncodeErrorReported,
    /// The transport rejected the packet; the failure was reported and the
    /// event dropped.
    TransportErrorReported,
}

/// Snapshot of the sender's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SenderStats {
    pub delivered: u64,
    pub encode_failures: u64,
    pub transport_failures: u64,
}

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    encode_failures: AtomicU64,
    transport_failures: AtomicU64,
}

/// Sender encoding log events into packets and dispatching them over a
/// datagram transport.
pub struct UdpSender {
    transport: Box<dyn DatagramTransport>,
    resolver: LocalAddressResolver,
    reporter: Arc<dyn ErrorReporter>,
    counters: Counters,
}

impl UdpSender {
    /// Construct a sender on top of an existing transport, auto-detecting the
    /// local address and reporting failures to the log.
    pub fn new(transport: impl DatagramTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            resolver: LocalAddressResolver::new(None),
            reporter: Arc::new(LogErrorReporter::default()),
            counters: Counters::default(),
        }
    }

    /// Open a UDP socket described by `config` and wrap it in a sender.
    pub fn with_config(config: UdpSenderConfig) -> io::Result<Self> {
        let transport = UdpTransport::open(&config.transport)?;
        log::debug!(
            "UdpSender sending to {} from {:?}",
            transport.remote_addr(),
            transport.local_addr()
        );
        Ok(Self::new(transport)
            .with_local_ip(config.local_ip)
            .with_reporter(Arc::new(LogErrorReporter::new(config.warn_interval))))
    }

    /// Route failure reports to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the local address resolver.
    ///
    /// An override already set on this sender carries over unless `resolver`
    /// has one of its own.
    pub fn with_resolver(mut self, resolver: LocalAddressResolver) -> Self {
        if resolver.local_ip_override().is_none() {
            resolver.set_local_ip(self.resolver.local_ip_override());
        }
        self.resolver = resolver;
        self
    }

    /// Set the local IPv4 override used in packets.
    pub fn with_local_ip(self, local_ip: Option<String>) -> Self {
        self.resolver.set_local_ip(local_ip);
        self
    }

    /// Change the local IPv4 override at runtime. Safe to call while other
    /// threads are sending.
    pub fn set_local_ip(&self, local_ip: Option<String>) {
        self.resolver.set_local_ip(local_ip);
    }

    /// Address currently written into packets.
    pub fn local_ip(&self) -> Ipv4Addr {
        self.resolver.resolve()
    }

    /// Encode `event` exactly as [`send`](Self::send) would.
    pub fn encode_event(&self, event: &LogEvent) -> Result<Vec<u8>, PacketError> {
        packet::encode(event, self.resolver.resolve())
    }

    /// Encode and dispatch `event`, returning the failure instead of
    /// reporting it.
    pub fn try_send(&self, event: &LogEvent) -> Result<(), SendError> {
        let payload = self.encode_event(event)?;
        self.transport.send_datagram(&payload)?;
        Ok(())
    }

    /// Encode and dispatch `event`. Failures go to the error reporter and
    /// never reach the caller.
    pub fn send(&self, event: &LogEvent) -> SendOutcome {
        match self.try_send(event) {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                SendOutcome::Delivered
            }
            Err(err) => {
                self.reporter.report(&err.to_string());
                match err {
                    SendError::Encoding(_) => {
                        self.counters.encode_failures.fetch_add(1, Ordering::Relaxed);
                        SendOutcome::EncodeErrorReported
                    }
                    SendError::Transport(_) => {
                        self.counters
                            .transport_failures
                            .fetch_add(1, Ordering::Relaxed);
                        SendOutcome::TransportErrorReported
                    }
                }
            }
        }
    }

    pub fn stats(&self) -> SenderStats {
        SenderStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            encode_failures: self.counters.encode_failures.load(Ordering::Relaxed),
            transport_failures: self.counters.transport_failures.load(Ordering::Relaxed),
        }
    }
}

impl LogHandler for UdpSender {
    fn handle(&self, event: &LogEvent) {
        self.send(event);
    }
}

impl std::fmt::Debug for UdpSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpSender")
            .field("resolver", &self.resolver)
            .field("stats", &self.stats())
            .finish()
    }
}
