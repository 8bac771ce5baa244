//! Run closures with the calling OS thread inside another network namespace
//!
//! [`NamespaceExecutor::run`] follows a fixed sequence:
//! 1. Pin the calling OS thread
//! 2. Open the thread's current namespace (the origin)
//! 3. `setns(2)` into the target
//! 4. Run the closure
//! 5. `setns(2)` back to the origin, even if the closure failed or panicked
//! 6. Release the pin
//!
//! # Confinement precondition
//!
//! The closure must not spawn concurrent work: no `tokio::spawn`, no async
//! DNS, no helper threads expected to share its namespace. Spawned work runs
//! on some other thread, in whatever namespace that thread is in. This cannot
//! be checked at runtime. The closure type is synchronous, so it cannot
//! `.await` and give its OS thread back to a scheduler mid-call.

use netat_core::{Error, Result, ThreadId};
use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use tokio::sync::oneshot;
use tracing::{debug, error, trace};

use crate::backend::{LinuxBackend, NamespaceBackend};
use crate::pin::ThreadPin;

/// Executes confined operations in a target network namespace
///
/// Holds no per-call state, so one executor can serve any number of
/// concurrent callers, each on its own OS thread.
#[derive(Debug, Clone, Default)]
pub struct NamespaceExecutor<B = LinuxBackend> {
    backend: B,
}

impl NamespaceExecutor<LinuxBackend> {
    /// Create an executor that switches namespaces with `setns(2)`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            backend: LinuxBackend,
        }
    }
}

impl<B: NamespaceBackend> NamespaceExecutor<B> {
    /// Create an executor on a custom backend
    #[must_use]
    pub const fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Get the backend
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `op` with the calling OS thread inside `target`
    ///
    /// `target` is borrowed for the call and never closed. If the operation
    /// succeeds but the thread cannot be restored, its value is dropped and
    /// [`Error::RestoreNamespace`] is returned.
    ///
    /// # Errors
    /// - [`Error::OriginLookup`] if the thread's namespace cannot be opened
    /// - [`Error::EnterNamespace`] if switching into `target` fails
    /// - [`Error::Operation`] if `op` fails
    /// - [`Error::RestoreNamespace`] / [`Error::RestoreAfterOperation`] if the
    ///   thread could not return to its origin
    pub fn run<N, T, F>(&self, target: N, op: F) -> Result<T>
    where
        N: AsFd,
        F: FnOnce() -> io::Result<T>,
    {
        let pin = ThreadPin::acquire();
        let target_fd = target.as_fd().as_raw_fd();

        let origin = self.backend.capture_origin().map_err(|source| {
            debug!(tid = %pin.tid(), error = %source, "Failed to open origin namespace");
            Error::OriginLookup { source }
        })?;

        if let Err(source) = self.backend.enter(target.as_fd()) {
            debug!(tid = %pin.tid(), target_fd, error = %source, "Failed to enter namespace");
            return Err(Error::EnterNamespace { source });
        }

        debug!(tid = %pin.tid(), target_fd, "Entered namespace");

        let guard = RestoreGuard {
            backend: &self.backend,
            origin: Some(origin),
        };
        let outcome = op();
        let restored = guard.restore();

        if let Err(restore) = restored {
            error!(
                tid = %pin.tid(),
                target_fd,
                error = %restore,
                "Failed to return to origin namespace"
            );
        } else {
            debug!(tid = %pin.tid(), "Returned to origin namespace");
        }

        drop(pin);

        match (outcome, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(operation), Ok(())) => Err(Error::Operation(operation)),
            (Ok(_), Err(source)) => Err(Error::RestoreNamespace { source }),
            (Err(operation), Err(restore)) => {
                Err(Error::RestoreAfterOperation { restore, operation })
            }
        }
    }
}

impl<B: NamespaceBackend + Clone + 'static> NamespaceExecutor<B> {
    /// Run `op` inside `target` on a dedicated OS thread
    ///
    /// The thread is spawned for this call and exits when it returns, so a
    /// thread left in `target` by a failed restore is never reused by the
    /// runtime. A panic in `op` surfaces as [`Error::OperationPanicked`].
    ///
    /// # Errors
    /// Same as [`run`](Self::run), plus [`Error::Io`] if the thread cannot be
    /// spawned and [`Error::OperationPanicked`]
    pub async fn run_async<N, T, F>(&self, target: N, op: F) -> Result<T>
    where
        N: AsFd + Send + 'static,
        T: Send + 'static,
        F: FnOnce() -> io::Result<T> + Send + 'static,
    {
        let executor = self.clone();
        let (tx, rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("netat-confined".to_string())
            .spawn(move || {
                let result = executor.run(target, op);
                if result.as_ref().is_err_and(Error::is_restore_failure) {
                    trace!(tid = %ThreadId::current(), "Retiring thread left in target namespace");
                }
                // The receiver may have been dropped with the future
                let _ = tx.send(result);
            })?;

        rx.await.map_err(|_| Error::OperationPanicked)?
    }
}

/// Run `op` inside `target` with the default executor
///
/// # Errors
/// See [`NamespaceExecutor::run`]
pub fn run_in<N, T, F>(target: N, op: F) -> Result<T>
where
    N: AsFd,
    F: FnOnce() -> io::Result<T>,
{
    NamespaceExecutor::new().run(target, op)
}

/// Returns the thread to its origin namespace
///
/// The normal path calls [`restore`](Self::restore) and gets the error back.
/// `Drop` only restores while unwinding from a panicking operation.
struct RestoreGuard<'a, B: NamespaceBackend> {
    backend: &'a B,
    origin: Option<OwnedFd>,
}

impl<B: NamespaceBackend> RestoreGuard<'_, B> {
    fn restore(mut self) -> nix::Result<()> {
        match self.origin.take() {
            Some(origin) => self.backend.enter(origin.as_fd()),
            None => Ok(()),
        }
    }
}

impl<B: NamespaceBackend> Drop for RestoreGuard<'_, B> {
    fn drop(&mut self) {
        let Some(origin) = self.origin.take() else {
            return;
        };

        if let Err(e) = self.backend.enter(origin.as_fd()) {
            // The panic may be caught by a runtime that would keep using this
            // thread in the wrong namespace.
            error!(
                tid = %ThreadId::current(),
                error = %e,
                "Cannot return to origin namespace while unwinding, aborting"
            );
            std::process::abort();
        }
    }
}
