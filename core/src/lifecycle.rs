//! Process-wide, run-once initialization of the transport library.
//!
//! There is no matching teardown: once initialized, the library stays up for
//! the life of the process.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{const_mutex, Mutex};

/// Double-checked run-once guard.
///
/// The fast path is a single acquire load. Only callers that observe the
/// flag unset take the lock, and the first of them runs the initializer.
/// The release store after the initializer returns makes its effects visible
/// to every thread that later sees the flag set.
pub struct InitGuard {
    done: AtomicBool,
    lock: Mutex<()>,
}

impl InitGuard {
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            lock: const_mutex(()),
        }
    }

    /// Run `init` unless some caller already has. Returns whether this call
    /// ran it.
    pub fn ensure(&self, init: impl FnOnce()) -> bool {
        if self.done.load(Ordering::Acquire) {
            return false;
        }
        let _guard = self.lock.lock();
        if self.done.load(Ordering::Acquire) {
            return false;
        }
        init();
        self.done.store(true, Ordering::Release);
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

impl Default for InitGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for the transport library used by `Request::create`.
pub static TRANSPORT_INIT: InitGuard = InitGuard::new();
