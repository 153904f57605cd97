//! Configuration structures consumed by the UDP sender.
//!
//! `UdpSenderBuilder` constructs these values before passing them to
//! [`UdpSender`](super::UdpSender) for runtime use.

use std::time::Duration;

use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

use super::transport::UdpTransportConfig;

/// Default collector host.
pub const DEFAULT_REMOTE_HOST: &str = "localhost";
/// Default collector port.
pub const DEFAULT_REMOTE_PORT: u16 = 9020;
/// Default local port; zero lets the OS pick one.
pub const DEFAULT_LOCAL_PORT: u16 = 0;
/// Default write timeout applied to the socket.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration object describing how to construct a [`UdpSender`](super::UdpSender).
#[derive(Clone, Debug)]
pub struct UdpSenderConfig {
    pub transport: UdpTransportConfig,
    /// Local IPv4 address written into packets. `None` or an empty string
    /// means auto-detect.
    pub local_ip: Option<String>,
    /// Minimum spacing between repeated failure reports in the log.
    pub warn_interval: Duration,
}

/// Defaults favour local development; production callers override the
/// collector through the builder.
impl Default for UdpSenderConfig {
    fn default() -> Self {
        Self {
            transport: UdpTransportConfig {
                remote_host: DEFAULT_REMOTE_HOST.into(),
                remote_port: DEFAULT_REMOTE_PORT,
                local_port: DEFAULT_LOCAL_PORT,
                write_timeout: DEFAULT_WRITE_TIMEOUT,
            },
            local_ip: None,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

impl UdpSenderConfig {
    /// Override the transport configuration.
    pub fn with_transport(mut self, transport: UdpTransportConfig) -> Self {
        self.transport = transport;
        self
    }
}
