//! Namespace switch backends
//!
//! The executor drives a [`NamespaceBackend`] instead of calling `setns(2)`
//! directly, so the pin/switch/restore protocol can be exercised without
//! privileges:
//! - [`LinuxBackend`] - procfs lookup and `setns(2)`
//! - [`MockBackend`] - records calls and injects failures

use netat_core::ThreadId;
use nix::errno::Errno;
use nix::sched::{setns, CloneFlags};
use std::fs::File;
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Switches the calling OS thread between network namespaces
///
/// Both methods act on the *calling thread*. Implementations must not hop
/// threads or spawn work.
pub trait NamespaceBackend: Send + Sync {
    /// Open a handle to the calling thread's current network namespace
    ///
    /// # Errors
    /// Returns error if the namespace file cannot be opened
    fn capture_origin(&self) -> std::io::Result<OwnedFd>;

    /// Move the calling thread into `namespace`
    ///
    /// # Errors
    /// Returns the errno from the switch
    fn enter(&self, namespace: BorrowedFd<'_>) -> nix::Result<()>;
}

/// Production backend: `/proc/<pid>/task/<tid>/ns/net` and `setns(2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxBackend;

impl NamespaceBackend for LinuxBackend {
    fn capture_origin(&self) -> std::io::Result<OwnedFd> {
        File::open(ThreadId::current().net_ns_path()).map(OwnedFd::from)
    }

    fn enter(&self, namespace: BorrowedFd<'_>) -> nix::Result<()> {
        setns(namespace, CloneFlags::CLONE_NEWNET)
    }
}

/// A backend call observed by [`MockBackend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCall {
    /// `capture_origin` was called
    CaptureOrigin,
    /// `enter` was called with a non-origin descriptor
    Enter(RawFd),
    /// `enter` was called with the captured origin
    Restore,
}

/// Mock backend for testing (never switches namespaces)
///
/// Namespaces are tracked by descriptor number: after `enter(fd)` the mock
/// reports `current() == Some(fd)`, after a restore it reports `None`.
///
/// # Example
/// ```
/// use std::fs::File;
/// use std::os::fd::AsRawFd;
/// use netat_namespace::{MockBackend, MockCall, NamespaceExecutor};
///
/// let backend = MockBackend::new();
/// let executor = NamespaceExecutor::with_backend(backend.clone());
/// let target = File::open("/dev/null").unwrap();
///
/// let seen = executor.run(&target, || Ok(backend.current())).unwrap();
/// assert_eq!(seen, Some(target.as_raw_fd()));
/// assert_eq!(backend.current(), None);
/// assert_eq!(
///     backend.calls(),
///     vec![MockCall::CaptureOrigin, MockCall::Enter(target.as_raw_fd()), MockCall::Restore]
/// );
/// ```
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    origin: Option<RawFd>,
    current: Option<RawFd>,
    fail_capture: bool,
    fail_enter: Option<Errno>,
    fail_restore: Option<Errno>,
}

impl MockBackend {
    /// Create a new mock backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make origin capture fail
    #[must_use]
    pub fn fail_capture(self) -> Self {
        self.lock().fail_capture = true;
        self
    }

    /// Make entering a target namespace fail with `errno`
    #[must_use]
    pub fn fail_enter(self, errno: Errno) -> Self {
        self.lock().fail_enter = Some(errno);
        self
    }

    /// Make returning to the origin fail with `errno`, as if the origin handle went stale
    #[must_use]
    pub fn fail_restore(self, errno: Errno) -> Self {
        self.lock().fail_restore = Some(errno);
        self
    }

    /// Calls observed so far
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Descriptor of the namespace the mock thread is "in", `None` for the origin
    #[must_use]
    pub fn current(&self) -> Option<RawFd> {
        self.lock().current
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend").finish_non_exhaustive()
    }
}

impl NamespaceBackend for MockBackend {
    fn capture_origin(&self) -> std::io::Result<OwnedFd> {
        let mut state = self.lock();
        state.calls.push(MockCall::CaptureOrigin);

        if state.fail_capture {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "mock: origin namespace unavailable",
            ));
        }

        let origin = OwnedFd::from(File::open("/dev/null")?);
        state.origin = Some(origin.as_raw_fd());

        tracing::debug!(fd = origin.as_raw_fd(), "Mock: Captured origin");

        Ok(origin)
    }

    fn enter(&self, namespace: BorrowedFd<'_>) -> nix::Result<()> {
        let mut state = self.lock();
        let fd = namespace.as_raw_fd();

        if state.origin == Some(fd) {
            state.calls.push(MockCall::Restore);
            if let Some(errno) = state.fail_restore {
                return Err(errno);
            }
            state.origin = None;
            state.current = None;
        } else {
            state.calls.push(MockCall::Enter(fd));
            if let Some(errno) = state.fail_enter {
                return Err(errno);
            }
            state.current = Some(fd);
        }

        tracing::debug!(fd, current = ?state.current, "Mock: Entered namespace");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsFd;

    #[test]
    fn test_mock_tracks_current_namespace() {
        let backend = MockBackend::new();
        let target = File::open("/dev/null").unwrap();

        let origin = backend.capture_origin().unwrap();
        backend.enter(target.as_fd()).unwrap();
        assert_eq!(backend.current(), Some(target.as_raw_fd()));

        backend.enter(origin.as_fd()).unwrap();
        assert_eq!(backend.current(), None);
        assert_eq!(
            backend.calls(),
            vec![
                MockCall::CaptureOrigin,
                MockCall::Enter(target.as_raw_fd()),
                MockCall::Restore,
            ]
        );
    }

    #[test]
    fn test_mock_failures() {
        let backend = MockBackend::new().fail_capture();
        assert!(backend.capture_origin().is_err());

        let backend = MockBackend::new().fail_enter(Errno::EPERM);
        let target = File::open("/dev/null").unwrap();
        assert_eq!(backend.enter(target.as_fd()), Err(Errno::EPERM));
        assert_eq!(backend.current(), None);
    }

    #[test]
    fn test_linux_backend_captures_origin() {
        let origin = LinuxBackend.capture_origin().unwrap();
        assert!(origin.as_raw_fd() >= 0);
    }

    #[test]
    fn test_linux_backend_rejects_non_namespace_fd() {
        // setns(2) reports EINVAL for a descriptor that is not a namespace,
        // independent of privileges.
        let file = File::open("/dev/null").unwrap();
        assert_eq!(LinuxBackend.enter(file.as_fd()), Err(Errno::EINVAL));
    }
}
