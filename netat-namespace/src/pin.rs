//! OS thread affinity for the duration of a confined call

use netat_core::ThreadId;
use std::marker::PhantomData;

/// Scoped claim on the calling OS thread
///
/// A `ThreadPin` is `!Send` and `!Sync`: it cannot be held across an
/// `.await` in a task that the runtime may move, and the code between
/// [`acquire`](Self::acquire) and drop runs synchronously on one thread.
/// Dropping it releases the claim on every exit path.
#[derive(Debug)]
pub struct ThreadPin {
    tid: ThreadId,
    _not_send: PhantomData<*const ()>,
}

impl ThreadPin {
    /// Pin to the calling OS thread
    #[must_use]
    pub fn acquire() -> Self {
        let tid = ThreadId::current();
        tracing::trace!(tid = %tid, "Pinned to OS thread");
        Self {
            tid,
            _not_send: PhantomData,
        }
    }

    /// The pinned thread
    #[must_use]
    pub const fn tid(&self) -> ThreadId {
        self.tid
    }
}

impl Drop for ThreadPin {
    fn drop(&mut self) {
        debug_assert_eq!(ThreadId::current(), self.tid, "ThreadPin released on another thread");
        tracing::trace!(tid = %self.tid, "Released OS thread");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_records_current_thread() {
        let pin = ThreadPin::acquire();
        assert_eq!(pin.tid(), ThreadId::current());
    }

    #[test]
    fn test_pins_on_different_threads() {
        let here = ThreadPin::acquire().tid();
        let there = std::thread::spawn(|| ThreadPin::acquire().tid())
            .join()
            .unwrap();
        assert_ne!(here, there);
    }
}
