//! Owned network namespace handles

use netat_core::{Error, NamespaceId, Result, ThreadId};
use std::fs::File;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::Path;

/// An open handle to a network namespace
///
/// Any `AsFd` works as an executor target; `NetNs` just bundles the common
/// ways of getting one. The descriptor is closed on drop.
#[derive(Debug)]
pub struct NetNs {
    file: File,
}

impl NetNs {
    /// Open a namespace file such as `/var/run/netns/<name>` or `/proc/<pid>/ns/net`
    ///
    /// # Errors
    /// Returns error if the file cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::OpenNamespace {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), fd = file.as_raw_fd(), "Opened namespace");

        Ok(Self { file })
    }

    /// Open the calling OS thread's current namespace
    ///
    /// # Errors
    /// Returns error if the thread's namespace file cannot be opened
    pub fn current_thread() -> Result<Self> {
        Self::open(ThreadId::current().net_ns_path())
    }

    /// Identity of the namespace this handle refers to
    ///
    /// # Errors
    /// Returns error if the handle cannot be inspected
    pub fn id(&self) -> Result<NamespaceId> {
        Ok(NamespaceId::from_metadata(&self.file.metadata()?))
    }
}

impl From<OwnedFd> for NetNs {
    fn from(fd: OwnedFd) -> Self {
        Self {
            file: File::from(fd),
        }
    }
}

impl From<NetNs> for OwnedFd {
    fn from(ns: NetNs) -> Self {
        ns.file.into()
    }
}

impl AsFd for NetNs {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for NetNs {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}
