//! Sockets, listeners and connections that live in another network namespace
//!
//! Each operation runs its body through
//! [`NamespaceExecutor`](netat_namespace::NamespaceExecutor), so only the
//! calling OS thread visits the target namespace, and only for the duration
//! of the call. The sockets produced stay in that namespace afterwards.
//!
//! # Example
//! ```no_run
//! use std::io::{Read, Write};
//! use netat_net::{dial_in, listen_in, Network};
//! use netat_namespace::NetNs;
//!
//! # fn main() -> netat_core::Result<()> {
//! let ns = NetNs::open("/var/run/netns/blue")?;
//! let listener = listen_in(Network::Tcp, "localhost:8080", &ns)?;
//!
//! let mut client = dial_in(Network::Tcp, "localhost:8080", &ns)?;
//! let mut server = listener.accept()?;
//!
//! client.write_all(b"hello")?;
//! let mut buf = [0u8; 5];
//! server.read_exact(&mut buf)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod addr;
pub mod config;
pub mod conn;
pub mod dial;
pub mod listen;
pub mod network;
pub mod socket;

pub use addr::{split_host_port, Endpoint};
pub use config::DialConfig;
pub use conn::{Addr, Connection};
pub use dial::{dial_in, dial_in_async, dial_in_with};
pub use listen::{listen_in, listen_in_async, listen_packet_in, Listener};
pub use network::{Family, Network};
pub use socket::socket_in;

// Re-export commonly used types
pub use netat_core::{Error, ErrorKind, Result};
