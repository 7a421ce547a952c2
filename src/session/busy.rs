//! In-flight guards for session operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A flag that is set for exactly as long as one operation is running.
///
/// [`BusyFlag::try_begin`] claims the flag and returns a guard; dropping the
/// guard clears it. A second claim while the first guard is alive fails.
/// Guards own a handle to the flag, so they can be moved into spawned tasks.
#[derive(Debug, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    /// Claim the flag, or `None` if an operation already holds it.
    #[must_use]
    pub fn try_begin(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                flag: Arc::clone(&self.0),
            })
    }

    /// Whether an operation currently holds the flag.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears its [`BusyFlag`] on drop, on every exit path.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
