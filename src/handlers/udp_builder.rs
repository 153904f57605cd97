//! Builder for [`UdpSender`](crate::udp_sender::UdpSender).
//!
//! Exposes the collector endpoint, the local port and IPv4 override, the
//! socket write timeout and the failure-report interval. Every option is
//! validated before a socket is opened.

use std::time::Duration;

use crate::udp_sender::{UdpSender, UdpSenderConfig, UdpTransportConfig};

use super::{HandlerBuildError, HandlerBuilderTrait};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(HandlerBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

#[derive(Clone, Debug)]
struct RemoteConfig {
    host: String,
    port: u16,
}

/// Builder for constructing [`UdpSender`] instances.
#[derive(Clone, Debug, Default)]
pub struct UdpSenderBuilder {
    remote: Option<RemoteConfig>,
    local_port: Option<u16>,
    local_ip: Option<String>,
    write_timeout_ms: Option<u64>,
    warn_interval_ms: Option<u64>,
}

impl UdpSenderBuilder {
    /// Create a new builder with no collector configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send packets to `host:port`.
    pub fn with_remote(mut self, host: impl Into<String>, port: u16) -> Self {
        self.remote = Some(RemoteConfig {
            host: host.into(),
            port,
        });
        self
    }

    /// Local IPv4 address written into packets. An empty string restores
    /// auto-detection.
    pub fn with_local_ip(mut self, local_ip: impl Into<String>) -> Self {
        self.local_ip = Some(local_ip.into());
        self
    }

    option_setter!(
        #[doc = "Bind the local socket to a fixed port instead of an ephemeral one."]
        with_local_port,
        local_port,
        u16
    );
    option_setter!(with_write_timeout_ms, write_timeout_ms, u64);
    option_setter!(with_warn_interval_ms, warn_interval_ms, u64);

    fn validate(&self) -> Result<(), HandlerBuildError> {
        self.validate_remote()?;
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        Ok(())
    }

    fn validate_remote(&self) -> Result<(), HandlerBuildError> {
        let Some(remote) = &self.remote else {
            return Err(HandlerBuildError::InvalidConfig(
                "udp sender requires a remote host and port".into(),
            ));
        };
        if remote.host.trim().is_empty() {
            return Err(HandlerBuildError::InvalidConfig(
                "remote host must not be empty".into(),
            ));
        }
        ensure_positive!(remote.port, "remote_port")?;
        Ok(())
    }

    /// Validate the options and produce the sender configuration.
    pub fn build_config(&self) -> Result<UdpSenderConfig, HandlerBuildError> {
        self.validate()?;
        let mut config = UdpSenderConfig::default();
        if let Some(remote) = &self.remote {
            config.transport = UdpTransportConfig {
                remote_host: remote.host.trim().to_owned(),
                remote_port: remote.port,
                ..config.transport
            };
        }
        if let Some(port) = self.local_port {
            config.transport.local_port = port;
        }
        if let Some(timeout) = self.write_timeout_ms {
            config.transport.write_timeout = Duration::from_millis(timeout);
        }
        if let Some(interval) = self.warn_interval_ms {
            config.warn_interval = Duration::from_millis(interval);
        }
        config.local_ip = self
            .local_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_owned);
        Ok(config)
    }
}

impl HandlerBuilderTrait for UdpSenderBuilder {
    type Handler = UdpSender;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        let config = self.build_config()?;
        Ok(UdpSender::with_config(config)?)
    }
}
