//! Thread and namespace identity types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Result};

/// OS thread identifier (the kernel TID, not `std::thread::ThreadId`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ThreadId(i32);

impl ThreadId {
    /// Create from raw TID
    #[must_use]
    pub const fn from_raw(tid: i32) -> Self {
        Self(tid)
    }

    /// Get the calling OS thread's ID
    #[must_use]
    pub fn current() -> Self {
        Self(nix::unistd::gettid().as_raw())
    }

    /// Get raw TID value
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Path to this thread's network namespace file
    ///
    /// `/proc/self/ns/net` reflects the thread group leader, which can sit in
    /// a different namespace than this thread.
    #[must_use]
    pub fn net_ns_path(self) -> PathBuf {
        PathBuf::from(format!(
            "/proc/{}/task/{}/ns/net",
            std::process::id(),
            self.0
        ))
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a network namespace inode
///
/// Two handles refer to the same namespace exactly when device and inode match.
/// Ids parsed from `net:[<ino>]` text carry no device (`dev == 0`); compare
/// those with [`matches`](Self::matches) rather than `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceId {
    /// Device of the nsfs mount
    pub dev: u64,
    /// Inode number, as shown in `net:[<ino>]`
    pub ino: u64,
}

impl NamespaceId {
    /// Build from the metadata of an opened namespace file
    #[must_use]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }

    /// Namespace of the given OS thread
    ///
    /// # Errors
    /// Returns error if the thread's namespace file cannot be read
    pub fn of_thread(tid: ThreadId) -> Result<Self> {
        let path = tid.net_ns_path();
        std::fs::metadata(&path)
            .map(|m| Self::from_metadata(&m))
            .map_err(|source| Error::OpenNamespace { path, source })
    }

    /// Whether the device is known (ids parsed from link text have none)
    #[must_use]
    pub const fn has_dev(&self) -> bool {
        self.dev != 0
    }

    /// Same namespace, comparing devices only when both ids know theirs
    #[must_use]
    pub const fn matches(&self, other: &Self) -> bool {
        self.ino == other.ino && (!self.has_dev() || !other.has_dev() || self.dev == other.dev)
    }

    /// Namespace the calling OS thread is in right now
    ///
    /// # Errors
    /// Returns error if the thread's namespace file cannot be read
    pub fn current_thread() -> Result<Self> {
        Self::of_thread(ThreadId::current())
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net:[{}]", self.ino)
    }
}

/// Parses the `net:[<ino>]` link text from `/proc`; the device is left as 0
impl FromStr for NamespaceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let ino = s
            .strip_prefix("net:[")
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|ino| ino.parse().ok())
            .ok_or_else(|| Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("not a network namespace link: {s:?}"),
            )))?;

        Ok(Self { dev: 0, ino })
    }
}
