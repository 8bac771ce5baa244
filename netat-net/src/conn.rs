//! Connections produced by dialing or accepting inside a namespace

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{TcpStream, UdpSocket};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::linux::net::SocketAddrExt;
use std::os::unix::net::{SocketAddr as UnixSocketAddr, UnixStream};

/// Local or peer address of a [`Connection`] or [`Listener`](crate::Listener)
#[derive(Debug, Clone)]
pub enum Addr {
    /// TCP or UDP address
    Ip(std::net::SocketAddr),
    /// Unix socket address
    Unix(UnixSocketAddr),
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(addr) => write!(f, "{addr}"),
            Self::Unix(addr) => {
                if let Some(path) = addr.as_pathname() {
                    write!(f, "{}", path.display())
                } else if let Some(name) = addr.as_abstract_name() {
                    write!(f, "@{}", String::from_utf8_lossy(name))
                } else {
                    f.write_str("(unnamed)")
                }
            }
        }
    }
}

/// A connected socket
///
/// The socket belongs to the namespace it was created in; it can be used
/// from any thread afterwards.
#[derive(Debug)]
pub enum Connection {
    /// TCP stream
    Tcp(TcpStream),
    /// Connected UDP socket
    Udp(UdpSocket),
    /// Unix stream
    Unix(UnixStream),
}

impl Connection {
    /// Local address
    ///
    /// # Errors
    /// Returns error if the socket cannot be queried
    pub fn local_addr(&self) -> io::Result<Addr> {
        match self {
            Self::Tcp(s) => s.local_addr().map(Addr::Ip),
            Self::Udp(s) => s.local_addr().map(Addr::Ip),
            Self::Unix(s) => s.local_addr().map(Addr::Unix),
        }
    }

    /// Remote address
    ///
    /// # Errors
    /// Returns error if the socket cannot be queried
    pub fn peer_addr(&self) -> io::Result<Addr> {
        match self {
            Self::Tcp(s) => s.peer_addr().map(Addr::Ip),
            Self::Udp(s) => s.peer_addr().map(Addr::Ip),
            Self::Unix(s) => s.peer_addr().map(Addr::Unix),
        }
    }

    /// Switch non-blocking mode, e.g. before handing the socket to tokio
    ///
    /// # Errors
    /// Returns error if the flag cannot be changed
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        match self {
            Self::Tcp(s) => s.set_nonblocking(nonblocking),
            Self::Udp(s) => s.set_nonblocking(nonblocking),
            Self::Unix(s) => s.set_nonblocking(nonblocking),
        }
    }

    /// The TCP stream, if this is one
    #[must_use]
    pub fn into_tcp(self) -> Option<TcpStream> {
        match self {
            Self::Tcp(s) => Some(s),
            _ => None,
        }
    }

    /// The UDP socket, if this is one
    #[must_use]
    pub fn into_udp(self) -> Option<UdpSocket> {
        match self {
            Self::Udp(s) => Some(s),
            _ => None,
        }
    }

    /// The Unix stream, if this is one
    #[must_use]
    pub fn into_unix(self) -> Option<UnixStream> {
        match self {
            Self::Unix(s) => Some(s),
            _ => None,
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(s) => s.read(buf),
            Self::Udp(s) => s.recv(buf),
            Self::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(s) => s.write(buf),
            Self::Udp(s) => s.send(buf),
            Self::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(s) => s.flush(),
            Self::Udp(_) => Ok(()),
            Self::Unix(s) => s.flush(),
        }
    }
}

impl AsFd for Connection {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::Tcp(s) => s.as_fd(),
            Self::Udp(s) => s.as_fd(),
            Self::Unix(s) => s.as_fd(),
        }
    }
}
