//! UDP sender for encoded log packets.
//!
//! This module defines [`UdpSender`], which resolves the local IPv4 address,
//! encodes each [`LogEvent`](crate::log_event::LogEvent) with
//! [`packet::encode`](crate::packet::encode) and hands the bytes to a
//! [`DatagramTransport`]. Every failure is routed to an
//! [`ErrorReporter`](crate::error_reporter::ErrorReporter); `send` itself never
//! fails. There is no queue and no retry: each call is one attempt.

mod address;
mod config;
mod sender;
mod transport;

#[cfg(test)]
mod tests;

pub use address::{AddressSource, HostAddressSource, LocalAddressResolver, select_first_ipv4};
pub use config::{
    DEFAULT_LOCAL_PORT, DEFAULT_REMOTE_HOST, DEFAULT_REMOTE_PORT, DEFAULT_WRITE_TIMEOUT,
    UdpSenderConfig,
};
pub use sender::{SendOutcome, SenderStats, UdpSender};
pub use transport::{DatagramTransport, UdpTransport, UdpTransportConfig};
