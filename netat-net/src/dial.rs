//! Outbound connections made from inside a namespace
//!
//! Everything happens on the confined thread: names go through the blocking
//! system resolver, and candidate addresses are tried one after another.
//! There is no dual-stack race, because a second concurrent attempt would run
//! on another thread outside the target namespace.

use netat_core::Result;
use netat_namespace::NamespaceExecutor;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, UdpSocket};
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use tracing::{debug, trace};

use crate::addr::{resolve, Endpoint, Purpose};
use crate::config::DialConfig;
use crate::conn::Connection;
use crate::network::Network;

/// Connect to `address` from inside namespace `ns`
///
/// # Errors
/// [`Error::InvalidAddress`](netat_core::Error::InvalidAddress) before any
/// switch, namespace switch errors, or
/// [`Error::Operation`](netat_core::Error::Operation) carrying the last
/// resolve or connect failure
pub fn dial_in(network: Network, address: &str, ns: impl AsFd) -> Result<Connection> {
    dial_in_with(network, address, ns, &DialConfig::default())
}

/// [`dial_in`] with explicit options
///
/// # Errors
/// See [`dial_in`]
pub fn dial_in_with(
    network: Network,
    address: &str,
    ns: impl AsFd,
    config: &DialConfig,
) -> Result<Connection> {
    let endpoint = Endpoint::parse(network, address)?;
    let conn = NamespaceExecutor::new().run(ns, || connect(network, &endpoint, config))?;
    log_connected(network, &conn);
    Ok(conn)
}

/// [`dial_in_with`] on a dedicated OS thread, awaited from async code
///
/// # Errors
/// See [`dial_in`]; also
/// [`Error::OperationPanicked`](netat_core::Error::OperationPanicked)
pub async fn dial_in_async<N>(
    network: Network,
    address: &str,
    ns: N,
    config: DialConfig,
) -> Result<Connection>
where
    N: AsFd + Send + 'static,
{
    let endpoint = Endpoint::parse(network, address)?;
    let conn = NamespaceExecutor::new()
        .run_async(ns, move || connect(network, &endpoint, &config))
        .await?;
    log_connected(network, &conn);
    Ok(conn)
}

fn connect(network: Network, endpoint: &Endpoint, config: &DialConfig) -> io::Result<Connection> {
    match endpoint {
        Endpoint::Host { host, port } => {
            let addrs = resolve(network, host, *port, Purpose::Dial)?;
            if network.is_udp() {
                connect_udp(&addrs).map(Connection::Udp)
            } else {
                connect_tcp(&addrs, config).map(Connection::Tcp)
            }
        }
        Endpoint::UnixPath(_) | Endpoint::UnixAbstract(_) => {
            UnixStream::connect_addr(&endpoint.unix_addr()?).map(Connection::Unix)
        }
    }
}

fn connect_tcp(addrs: &[SocketAddr], config: &DialConfig) -> io::Result<TcpStream> {
    first_success(addrs, |addr| {
        let stream = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        if config.nodelay {
            stream.set_nodelay(true)?;
        }
        Ok(stream)
    })
}

fn connect_udp(addrs: &[SocketAddr]) -> io::Result<UdpSocket> {
    first_success(addrs, |addr| {
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(addr)?;
        Ok(socket)
    })
}

/// Try `attempt` on each address in order, returning the first success or the last error
fn first_success<T>(
    addrs: &[SocketAddr],
    mut attempt: impl FnMut(&SocketAddr) -> io::Result<T>,
) -> io::Result<T> {
    let mut last_err = None;

    for addr in addrs {
        match attempt(addr) {
            Ok(value) => return Ok(value),
            Err(e) => {
                trace!(%addr, error = %e, "Connect attempt failed");
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses to dial")
    }))
}

fn log_connected(network: Network, conn: &Connection) {
    match conn.peer_addr() {
        Ok(peer) => debug!(%network, %peer, "Connected in namespace"),
        Err(e) => debug!(%network, error = %e, "Connected in namespace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netat_core::Error;
    use std::fs::File;
    use std::net::TcpListener;
    use std::time::Duration;

    #[test]
    fn test_first_success_tries_in_order() {
        let addrs: Vec<SocketAddr> = vec![
            "[::1]:1".parse().unwrap(),
            "127.0.0.1:2".parse().unwrap(),
            "127.0.0.1:3".parse().unwrap(),
        ];
        let mut tried = Vec::new();

        let port = first_success(&addrs, |addr| {
            tried.push(addr.port());
            if addr.port() == 2 {
                Ok(addr.port())
            } else {
                Err(io::Error::from(io::ErrorKind::ConnectionRefused))
            }
        })
        .unwrap();

        assert_eq!(port, 2);
        assert_eq!(tried, vec![1, 2]);
    }

    #[test]
    fn test_first_success_returns_last_error() {
        let addrs: Vec<SocketAddr> = vec!["127.0.0.1:1".parse().unwrap()];
        let err = first_success(&addrs, |_| -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::TimedOut))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        let err = first_success(&[], |_| -> io::Result<()> { Ok(()) }).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrNotAvailable);
    }

    #[test]
    fn test_connect_tcp_sets_nodelay() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addrs = [listener.local_addr().unwrap()];

        let stream = connect_tcp(&addrs, &DialConfig::default()).unwrap();
        assert!(stream.nodelay().unwrap());

        let config = DialConfig::new()
            .with_nodelay(false)
            .with_timeout(Duration::from_secs(1));
        let stream = connect_tcp(&addrs, &config).unwrap();
        assert!(!stream.nodelay().unwrap());
    }

    #[test]
    fn test_connect_tcp_zero_timeout_waits() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addrs = [listener.local_addr().unwrap()];

        let config = DialConfig {
            timeout: Some(Duration::ZERO),
            ..DialConfig::default()
        };
        assert!(connect_tcp(&addrs, &config).is_ok());

        let config: DialConfig = serde_json::from_str(r#"{"timeout":0}"#).unwrap();
        assert!(connect_tcp(&addrs, &config).is_ok());
    }

    #[test]
    fn test_dial_invalid_namespace() {
        let bogus = File::open("/dev/null").unwrap();
        let err = dial_in(Network::Tcp, "localhost:8080", &bogus).unwrap_err();
        assert!(matches!(err, Error::EnterNamespace { .. }));
    }
}
