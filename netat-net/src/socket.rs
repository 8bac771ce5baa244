//! Raw socket creation inside a namespace

use netat_core::Result;
use netat_namespace::NamespaceExecutor;
use std::io;
use std::os::fd::{AsFd, FromRawFd, OwnedFd};

/// Create a socket in namespace `ns`
///
/// Arguments are passed to `socket(2)` unchanged, except that
/// `SOCK_CLOEXEC` is always added. The socket stays bound to `ns` for its
/// whole life, whichever thread uses it later.
///
/// # Errors
/// Namespace switch errors, or [`Error::Operation`](netat_core::Error::Operation)
/// carrying the `socket(2)` errno
pub fn socket_in(domain: i32, ty: i32, protocol: i32, ns: impl AsFd) -> Result<OwnedFd> {
    NamespaceExecutor::new().run(ns, || raw_socket(domain, ty, protocol))
}

fn raw_socket(domain: i32, ty: i32, protocol: i32) -> io::Result<OwnedFd> {
    // SAFETY: socket(2) takes plain integers and touches no caller memory
    let fd = unsafe { libc::socket(domain, ty | libc::SOCK_CLOEXEC, protocol) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    tracing::debug!(domain, ty, protocol, fd, "Created socket");

    // SAFETY: fd was just returned by socket(2) and is owned by nobody else
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}
