//! Local IPv4 address resolution.
//!
//! Packets carry the sender's IPv4 address. A configured override wins when
//! it parses; otherwise the host's addresses are enumerated and the first IPv4
//! entry is used, in whatever order the platform reports them. Every failure
//! path ends at loopback so resolution can never stop a send.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, ToSocketAddrs},
    str::FromStr,
};

use parking_lot::RwLock;

use crate::error::ResolutionError;

/// Source of the host's network addresses.
pub trait AddressSource: Send + Sync {
    /// Enumerate addresses in platform order.
    fn host_addresses(&self) -> io::Result<Vec<IpAddr>>;
}

/// Looks up the machine's own host name.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostAddressSource;

impl AddressSource for HostAddressSource {
    fn host_addresses(&self) -> io::Result<Vec<IpAddr>> {
        let name = hostname::get()?;
        let name = name.to_str().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "host name is not valid UTF-8")
        })?;
        Ok((name, 0).to_socket_addrs()?.map(|addr| addr.ip()).collect())
    }
}

/// First IPv4 address in enumeration order. IPv6 entries are skipped.
pub fn select_first_ipv4(addrs: &[IpAddr]) -> Option<Ipv4Addr> {
    addrs.iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(_) => None,
    })
}

struct ResolverState {
    local_ip: Option<String>,
    cached: Option<Ipv4Addr>,
    /// Bumped whenever the override changes or the cache is dropped.
    generation: u64,
}

/// Resolves and caches the IPv4 address stamped into packets.
///
/// Host lookups run without holding the lock. A result is only published if
/// no [`set_local_ip`](Self::set_local_ip) or [`invalidate`](Self::invalidate)
/// happened while it was computed; otherwise resolution starts over.
pub struct LocalAddressResolver {
    state: RwLock<ResolverState>,
    source: Box<dyn AddressSource>,
}

impl LocalAddressResolver {
    /// Resolver backed by the host's own address list.
    pub fn new(local_ip: Option<String>) -> Self {
        Self::with_source(local_ip, HostAddressSource)
    }

    pub fn with_source(local_ip: Option<String>, source: impl AddressSource + 'static) -> Self {
        Self {
            state: RwLock::new(ResolverState {
                local_ip,
                cached: None,
                generation: 0,
            }),
            source: Box::new(source),
        }
    }

    /// Currently configured override, if any.
    pub fn local_ip_override(&self) -> Option<String> {
        self.state.read().local_ip.clone()
    }

    /// Replace the override and drop the cached address.
    pub fn set_local_ip(&self, local_ip: Option<String>) {
        let mut state = self.state.write();
        state.local_ip = local_ip;
        state.cached = None;
        state.generation += 1;
    }

    /// Forget the cached address so the next call resolves again.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        state.cached = None;
        state.generation += 1;
    }

    /// Address to write into the next packet.
    pub fn resolve(&self) -> Ipv4Addr {
        loop {
            let (local_ip, generation) = {
                let state = self.state.read();
                if let Some(ip) = state.cached {
                    return ip;
                }
                (state.local_ip.clone(), state.generation)
            };
            let ip = self.compute(local_ip.as_deref());
            let mut state = self.state.write();
            if state.generation == generation {
                return *state.cached.get_or_insert(ip);
            }
        }
    }

    fn compute(&self, local_ip: Option<&str>) -> Ipv4Addr {
        if let Some(ip) = parse_override(local_ip) {
            return ip;
        }
        match self.detect() {
            Ok(ip) => ip,
            Err(err) => {
                log::debug!("local address resolution fell back to loopback: {err}");
                Ipv4Addr::LOCALHOST
            }
        }
    }

    fn detect(&self) -> Result<Ipv4Addr, ResolutionError> {
        let addrs = self.source.host_addresses()?;
        select_first_ipv4(&addrs).ok_or(ResolutionError::NoIpv4Address)
    }
}

fn parse_override(local_ip: Option<&str>) -> Option<Ipv4Addr> {
    let text = local_ip.map(str::trim).filter(|text| !text.is_empty())?;
    match Ipv4Addr::from_str(text) {
        Ok(ip) => Some(ip),
        Err(_) => {
            log::warn!("ignoring local_ip {text:?}: not an IPv4 address; auto-detecting instead");
            None
        }
    }
}

impl std::fmt::Debug for LocalAddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("LocalAddressResolver")
            .field("local_ip", &state.local_ip)
            .field("cached", &state.cached)
            .finish()
    }
}
