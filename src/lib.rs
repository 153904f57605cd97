//! Ship log events to a remote collector as compact binary UDP packets.
//!
//! Each [`LogEvent`] is encoded into one self-describing datagram (see
//! [`packet`]) stamped with the sender's IPv4 address and handed to a
//! [`DatagramTransport`]. Delivery is fire-and-forget: failures are reported
//! through an [`ErrorReporter`] and never reach the logging call site.
//!
//! ```no_run
//! use udplog::{HandlerBuilderTrait, Level, LogEvent, UdpSenderBuilder};
//!
//! let sender = UdpSenderBuilder::new()
//!     .with_remote("logs.internal", 5140)
//!     .build_inner()?;
//! sender.send(&LogEvent::new(Level::INFO, "service started").with_event_id(1000));
//! # Ok::<(), udplog::HandlerBuildError>(())
//! ```

pub mod error;
pub mod error_reporter;
pub mod file_config;
pub mod handler;
pub mod handlers;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_event;
pub mod packet;
mod rate_limited_warner;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;
pub mod udp_sender;

#[cfg(test)]
mod test_utils;

pub use error::{DecodeError, PacketError, ResolutionError, SendError};
pub use error_reporter::{
    ChannelErrorReporter, ErrorReporter, LogErrorReporter, StderrErrorReporter,
};
pub use handler::LogHandler;
pub use handlers::{HandlerBuildError, HandlerBuilderTrait, UdpSenderBuilder};
pub use level::Level;
#[cfg(feature = "log-compat")]
pub use log_compat::UdpLogAdapter;
pub use log_event::{EVENT_ID_PROPERTY, LogEvent, PropertyValue};
pub use packet::{DecodedPacket, PROTOCOL_VERSION, encode};
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::UdpLayer;
pub use udp_sender::{
    DatagramTransport, LocalAddressResolver, SendOutcome, SenderStats, UdpSender,
    UdpSenderConfig, UdpTransport,
};
