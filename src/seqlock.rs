//! A small seqlock for publishing a `Copy` value to lock-free readers.
//!
//! Single-writer, many-reader. The writer bumps an even/odd generation
//! counter around the update; a reader retries whenever it observes an
//! odd counter, or a counter that changed between its two reads. This
//! replaces a bare busy-wait flag with something whose ordering is
//! explicit rather than relying on the target having only one hardware
//! thread.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Publishes a `T` for lock-free reads. `T` must be `Copy`; readers take
/// a bitwise snapshot, never a reference into the writer's half-updated
/// state.
pub struct Published<T: Copy> {
    generation: AtomicU32,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is only ever performed between matching
// generation-counter transitions (`write`) or validated against the
// counter after the fact (`read`); there is exactly one writer.
unsafe impl<T: Copy> Sync for Published<T> {}

impl<T: Copy> Published<T> {
    pub const fn new(initial: T) -> Self {
        Self {
            generation: AtomicU32::new(0),
            value: UnsafeCell::new(initial),
        }
    }

    /// Replaces the published value. Must only ever be called by a single
    /// writer (the coordinator, under `bus_cache_lock`); concurrent
    /// `write` calls are not supported.
    pub fn write(&self, new_value: T) {
        let gen_before = self.generation.load(Ordering::Relaxed);
        self.generation.store(gen_before.wrapping_add(1), Ordering::Release);

        // SAFETY: the generation counter is now odd, so no reader will
        // treat `value` as stable until the closing store below.
        unsafe {
            *self.value.get() = new_value;
        }

        self.generation
            .store(gen_before.wrapping_add(2), Ordering::Release);
    }

    /// Returns a consistent snapshot, retrying while a write is in
    /// progress or was concurrent with the read.
    #[must_use]
    pub fn read(&self) -> T {
        loop {
            let before = self.generation.load(Ordering::Acquire);
            if before & 1 != 0 {
                core::hint::spin_loop();
                continue;
            }

            // SAFETY: `before` was even, so no writer had begun an update
            // at the time of this read; we validate that no write
            // interleaved before trusting the copy.
            let snapshot = unsafe { *self.value.get() };

            let after = self.generation.load(Ordering::Acquire);
            if after == before {
                return snapshot;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_observes_latest_value() {
        let published = Published::new(0u32);
        published.write(42);
        assert_eq!(published.read(), 42);
    }

    #[test]
    fn sequential_writes_are_all_observable() {
        let published = Published::new(0u32);
        for i in 1..=5u32 {
            published.write(i);
            assert_eq!(published.read(), i);
        }
    }
}
