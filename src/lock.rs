//! Bounded-wait lock acquisition. `spin::Mutex` itself has no timeout
//! primitive, so a timeout is layered on top as a bounded spin-retry loop
//! rather than ever blocking forever.

use spin::{Mutex, MutexGuard};

/// Retries `mutex.try_lock()` up to `budget` times, returning `None` if
/// the budget is exhausted without acquiring the lock. `budget` is a
/// caller-supplied iteration count standing in for the target's tick
/// budget (see [`crate::constants::LOCK_WAIT_TICKS`]); this crate has no
/// real tick source to block on so the retry count is the timeout.
pub fn acquire_bounded<T>(mutex: &Mutex<T>, budget: u32) -> Option<MutexGuard<'_, T>> {
    for _ in 0..budget {
        if let Some(guard) = mutex.try_lock() {
            return Some(guard);
        }
        core::hint::spin_loop();
    }
    None
}
