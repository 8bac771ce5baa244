//! Shared helpers for tests that need real network namespaces

#![allow(dead_code)]

use netat_namespace::NetNs;
use nix::sched::{unshare, CloneFlags};
use std::io;

/// Check if running as root
pub fn is_root() -> bool {
    unsafe { libc::getuid() == 0 }
}

/// Install a test subscriber once; `RUST_LOG` controls the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Create a fresh network namespace with `lo` up
///
/// The namespace is unshared on a throwaway thread so the test thread never
/// leaves its own namespace. The returned handle keeps it alive.
pub fn create_namespace() -> io::Result<NetNs> {
    std::thread::spawn(|| -> io::Result<NetNs> {
        unshare(CloneFlags::CLONE_NEWNET)?;
        let ns = NetNs::current_thread().map_err(io::Error::other)?;
        set_loopback_up()?;
        Ok(ns)
    })
    .join()
    .map_err(|_| io::Error::other("namespace thread panicked"))?
}

fn set_loopback_up() -> io::Result<()> {
    let sock = std::net::UdpSocket::bind("0.0.0.0:0")?;
    let fd = std::os::fd::AsRawFd::as_raw_fd(&sock);

    unsafe {
        let mut req: libc::ifreq = std::mem::zeroed();
        for (dst, src) in req.ifr_name.iter_mut().zip(b"lo\0") {
            *dst = *src as libc::c_char;
        }

        if libc::ioctl(fd, libc::SIOCGIFFLAGS, &mut req) < 0 {
            return Err(io::Error::last_os_error());
        }
        req.ifr_ifru.ifru_flags |= libc::IFF_UP as libc::c_short;
        if libc::ioctl(fd, libc::SIOCSIFFLAGS, &req) < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(())
}
