//! Transport primitives for the UDP sender.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    time::Duration,
};

/// Capability to hand one datagram to a pre-configured endpoint.
///
/// Implementations must be bounded: a call either completes or fails, it never
/// retries or waits indefinitely.
pub trait DatagramTransport: Send + Sync {
    /// Send `payload` as a single datagram.
    fn send_datagram(&self, payload: &[u8]) -> io::Result<()>;
}

/// UDP endpoint configuration.
#[derive(Clone, Debug)]
pub struct UdpTransportConfig {
    /// Hostname or IP address of the collector.
    pub remote_host: String,
    /// Collector UDP port.
    pub remote_port: u16,
    /// Local port to bind; zero selects an ephemeral port.
    pub local_port: u16,
    /// Upper bound on a single socket write.
    pub write_timeout: Duration,
}

impl UdpTransportConfig {
    fn remote_addr(&self) -> io::Result<SocketAddr> {
        (self.remote_host.as_str(), self.remote_port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "could not resolve {}:{}",
                        self.remote_host, self.remote_port
                    ),
                )
            })
    }
}

/// Connected UDP socket owned for the sender's lifetime.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpTransport {
    /// Resolve the collector, bind a socket of the same address family and
    /// connect it so every send targets the collector.
    pub fn open(config: &UdpTransportConfig) -> io::Result<Self> {
        let remote = config.remote_addr()?;
        let local = match remote {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.local_port)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, config.local_port)),
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_write_timeout(Some(config.write_timeout))?;
        socket.connect(remote)?;
        Ok(Self { socket, remote })
    }

    /// Address of the collector this transport sends to.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramTransport for UdpTransport {
    fn send_datagram(&self, payload: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(payload)?;
        if sent != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", payload.len()),
            ));
        }
        Ok(())
    }
}
