//! Listeners bound inside a namespace

use netat_core::{Error, Result};
use netat_namespace::NamespaceExecutor;
use std::io;
use std::net::{TcpListener, UdpSocket};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixListener;
use tracing::debug;

use crate::addr::{resolve, Endpoint, Purpose};
use crate::conn::{Addr, Connection};
use crate::network::Network;

/// A listening socket
///
/// Connections accepted from it belong to the namespace the listener was
/// bound in, regardless of which thread calls [`accept`](Self::accept).
#[derive(Debug)]
pub enum Listener {
    /// TCP listener
    Tcp(TcpListener),
    /// Unix stream listener
    Unix(UnixListener),
}

impl Listener {
    /// Accept one connection
    ///
    /// # Errors
    /// Returns the `accept(2)` error
    pub fn accept(&self) -> io::Result<Connection> {
        match self {
            Self::Tcp(l) => l.accept().map(|(s, _)| Connection::Tcp(s)),
            Self::Unix(l) => l.accept().map(|(s, _)| Connection::Unix(s)),
        }
    }

    /// Bound address
    ///
    /// # Errors
    /// Returns error if the socket cannot be queried
    pub fn local_addr(&self) -> io::Result<Addr> {
        match self {
            Self::Tcp(l) => l.local_addr().map(Addr::Ip),
            Self::Unix(l) => l.local_addr().map(Addr::Unix),
        }
    }

    /// Switch non-blocking mode, e.g. before handing the socket to tokio
    ///
    /// # Errors
    /// Returns error if the flag cannot be changed
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        match self {
            Self::Tcp(l) => l.set_nonblocking(nonblocking),
            Self::Unix(l) => l.set_nonblocking(nonblocking),
        }
    }

    /// The TCP listener, if this is one
    #[must_use]
    pub fn into_tcp(self) -> Option<TcpListener> {
        match self {
            Self::Tcp(l) => Some(l),
            Self::Unix(_) => None,
        }
    }

    /// The Unix listener, if this is one
    #[must_use]
    pub fn into_unix(self) -> Option<UnixListener> {
        match self {
            Self::Unix(l) => Some(l),
            Self::Tcp(_) => None,
        }
    }
}

impl AsFd for Listener {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::Tcp(l) => l.as_fd(),
            Self::Unix(l) => l.as_fd(),
        }
    }
}

/// Bind and listen on `address` inside namespace `ns`
///
/// `network` must be a stream network (`tcp`, `tcp4`, `tcp6`, `unix`).
///
/// # Errors
/// [`Error::UnsupportedNetwork`] / [`Error::InvalidAddress`] before any
/// switch, namespace switch errors, or [`Error::Operation`] for resolve and
/// bind failures
pub fn listen_in(network: Network, address: &str, ns: impl AsFd) -> Result<Listener> {
    let endpoint = parse_stream(network, address)?;
    let listener = NamespaceExecutor::new().run(ns, || bind_stream(network, &endpoint))?;
    log_bound(network, &listener);
    Ok(listener)
}

/// [`listen_in`] on a dedicated OS thread, awaited from async code
///
/// # Errors
/// See [`listen_in`]; also [`Error::OperationPanicked`]
pub async fn listen_in_async<N>(network: Network, address: &str, ns: N) -> Result<Listener>
where
    N: AsFd + Send + 'static,
{
    let endpoint = parse_stream(network, address)?;
    let listener = NamespaceExecutor::new()
        .run_async(ns, move || bind_stream(network, &endpoint))
        .await?;
    log_bound(network, &listener);
    Ok(listener)
}

/// Bind a UDP socket on `address` inside namespace `ns`
///
/// # Errors
/// [`Error::UnsupportedNetwork`] unless `network` is `udp`, `udp4` or
/// `udp6`; otherwise as [`listen_in`]
pub fn listen_packet_in(network: Network, address: &str, ns: impl AsFd) -> Result<UdpSocket> {
    if !network.is_udp() {
        return Err(Error::UnsupportedNetwork {
            network: network.to_string(),
        });
    }
    let (host, port) = host_port(network, address)?;

    let socket = NamespaceExecutor::new().run(ns, || {
        let addrs = resolve(network, &host, port, Purpose::Listen)?;
        UdpSocket::bind(&addrs[..])
    })?;

    debug!(%network, addr = ?socket.local_addr().ok(), "Bound packet socket in namespace");

    Ok(socket)
}

fn parse_stream(network: Network, address: &str) -> Result<Endpoint> {
    if !network.is_stream() {
        return Err(Error::UnsupportedNetwork {
            network: network.to_string(),
        });
    }
    Endpoint::parse(network, address)
}

fn host_port(network: Network, address: &str) -> Result<(String, u16)> {
    match Endpoint::parse(network, address)? {
        Endpoint::Host { host, port } => Ok((host, port)),
        Endpoint::UnixPath(_) | Endpoint::UnixAbstract(_) => Err(Error::UnsupportedNetwork {
            network: network.to_string(),
        }),
    }
}

fn bind_stream(network: Network, endpoint: &Endpoint) -> io::Result<Listener> {
    match endpoint {
        Endpoint::Host { host, port } => {
            let addrs = resolve(network, host, *port, Purpose::Listen)?;
            TcpListener::bind(&addrs[..]).map(Listener::Tcp)
        }
        Endpoint::UnixPath(_) | Endpoint::UnixAbstract(_) => {
            UnixListener::bind_addr(&endpoint.unix_addr()?).map(Listener::Unix)
        }
    }
}

fn log_bound(network: Network, listener: &Listener) {
    match listener.local_addr() {
        Ok(addr) => debug!(%network, %addr, "Listening in namespace"),
        Err(e) => debug!(%network, error = %e, "Listening in namespace"),
    }
}
