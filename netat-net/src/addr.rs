//! Address parsing and in-namespace resolution
//!
//! Parsing happens before any namespace switch so malformed input never
//! costs a `setns(2)`. Resolution happens inside the confined closure,
//! through the blocking system resolver on the confined thread, so queries
//! leave through the namespace's own interfaces.

use netat_core::{Error, Result};
use std::collections::HashSet;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::os::linux::net::SocketAddrExt;
use std::os::unix::net::SocketAddr as UnixSocketAddr;
use std::path::PathBuf;

use crate::network::{Family, Network};

/// A parsed, unresolved endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Host name or literal plus port; an empty host means "default"
    Host {
        /// Host part, without brackets
        host: String,
        /// Port
        port: u16,
    },
    /// Filesystem Unix socket
    UnixPath(PathBuf),
    /// Linux abstract Unix socket, written `@name`
    UnixAbstract(Vec<u8>),
}

impl Endpoint {
    /// Parse `address` for `network`
    ///
    /// IP networks take `host:port`, `[ipv6]:port` or `:port`. The Unix
    /// network takes a path, or `@name` for an abstract socket.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if the address does not fit the network
    pub fn parse(network: Network, address: &str) -> Result<Self> {
        if network.is_ip() {
            let (host, port) = split_host_port(address)?;
            return Ok(Self::Host {
                host: host.to_string(),
                port,
            });
        }

        if address.is_empty() {
            return Err(invalid(address, "empty socket path"));
        }
        match address.strip_prefix('@') {
            Some(name) => Ok(Self::UnixAbstract(name.as_bytes().to_vec())),
            None => Ok(Self::UnixPath(PathBuf::from(address))),
        }
    }

    /// Unix socket address of a Unix endpoint
    pub(crate) fn unix_addr(&self) -> io::Result<UnixSocketAddr> {
        match self {
            Self::UnixPath(path) => UnixSocketAddr::from_pathname(path),
            Self::UnixAbstract(name) => UnixSocketAddr::from_abstract_name(name),
            Self::Host { .. } => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a unix endpoint",
            )),
        }
    }
}

/// Split `host:port` / `[host]:port`
///
/// # Errors
/// Returns [`Error::InvalidAddress`] on missing or malformed ports and
/// unbracketed IPv6 literals
pub fn split_host_port(address: &str) -> Result<(&str, u16)> {
    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| invalid(address, "missing ']'"))?;
        let port = after
            .strip_prefix(':')
            .ok_or_else(|| invalid(address, "missing port"))?;
        (host, port)
    } else {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| invalid(address, "missing port"))?;
        if host.contains(':') {
            return Err(invalid(address, "too many colons"));
        }
        (host, port)
    };

    let port = port
        .parse::<u16>()
        .map_err(|_| invalid(address, "invalid port"))?;

    Ok((host, port))
}

fn invalid(address: &str, message: &str) -> Error {
    Error::InvalidAddress {
        address: address.to_string(),
        message: message.to_string(),
    }
}

/// What the resolved addresses will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Purpose {
    Listen,
    Dial,
}

/// Resolve `host` for `network`, in the calling thread's namespace
///
/// Empty hosts mean the wildcard address for listening and loopback for
/// dialing. Results are filtered by family and deduplicated; for listening,
/// IPv4 results come first.
pub(crate) fn resolve(
    network: Network,
    host: &str,
    port: u16,
    purpose: Purpose,
) -> io::Result<Vec<SocketAddr>> {
    let mut addrs: Vec<SocketAddr> = if host.is_empty() {
        default_hosts(network.family(), purpose)
            .into_iter()
            .map(|ip| SocketAddr::new(ip, port))
            .collect()
    } else if let Ok(ip) = host.parse::<IpAddr>() {
        vec![SocketAddr::new(ip, port)]
    } else {
        let mut resolved: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
        if purpose == Purpose::Listen {
            resolved.sort_by_key(SocketAddr::is_ipv6);
        }
        resolved
    };

    let mut seen = HashSet::new();
    addrs.retain(|addr| network.accepts(addr) && seen.insert(*addr));

    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no {network} address found for {host:?}"),
        ));
    }

    tracing::trace!(%network, host, ?addrs, "Resolved");

    Ok(addrs)
}

fn default_hosts(family: Family, purpose: Purpose) -> Vec<IpAddr> {
    let (v4, v6) = match purpose {
        Purpose::Listen => (Ipv4Addr::UNSPECIFIED, Ipv6Addr::UNSPECIFIED),
        Purpose::Dial => (Ipv4Addr::LOCALHOST, Ipv6Addr::LOCALHOST),
    };

    match (family, purpose) {
        (Family::V4, _) => vec![v4.into()],
        (Family::V6, _) => vec![v6.into()],
        // A dual-stack wildcard first, plain IPv4 if IPv6 is unavailable
        (Family::Any, Purpose::Listen) => vec![v6.into(), v4.into()],
        (Family::Any, Purpose::Dial) => vec![v4.into(), v6.into()],
    }
}
