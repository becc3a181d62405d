//! The logging contract this crate calls into. A flight build wires in a
//! real sink from outside; this crate ships only a no-op sink and a
//! recording sink for tests.

use heapless::Deque;
use spin::Mutex;

use crate::constants::ERROR_STACK_MAX;

/// Component that raised a log entry.
///
/// # Variants
///
/// * `NvA` / `NvB` - one of the two non-volatile devices.
/// * `RaidVoter` - the quadruple-copy read/vote algorithm.
/// * `CacheVoter` - the in-RAM triple-modular-redundancy voter.
/// * `Coordinator` - the persistent state coordinator.
/// * `Timebase` - the wall-clock helper.
/// * `ErrorLog` - the error-log persistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLocation {
    NvA,
    NvB,
    RaidVoter,
    CacheVoter,
    Coordinator,
    Timebase,
    ErrorLog,
}

/// The fixed logging vocabulary.
///
/// # Variants
///
/// * `InconsistentData` - a cross-copy or confirm-after-write mismatch.
/// * `Corrupted` - a RAM TMR copy diverged and was corrected.
/// * `OutOfBounds` - a stored count field exceeded its maximum.
/// * `AllSameVal` - both devices' byte patterns were the field width.
/// * `BadData` - no vote could be reached; data is unrecoverable.
/// * `MutexTimeout` - `bus_cache_lock` could not be acquired in time.
/// * `SpiMutexTimeout` - the NV bus mutex could not be acquired in time.
/// * `EquistackMutexTimeout` - the error stack's own mutex timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCode {
    InconsistentData,
    Corrupted,
    OutOfBounds,
    AllSameVal,
    BadData,
    MutexTimeout,
    SpiMutexTimeout,
    EquistackMutexTimeout,
}

/// A single recorded log call, used only by [`RecordingLogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub location: LogLocation,
    pub code: LogCode,
    pub priority: bool,
}

/// Sink for the fixed `log(location, code, priority)` contract. Implemented
/// by collaborating code outside this crate in flight; this crate only
/// calls `log`, never interprets the result.
pub trait LogSink {
    fn log(&self, location: LogLocation, code: LogCode, priority: bool);
}

/// Discards every log call. Used where a caller has no sink to offer yet
/// (e.g. early in `init`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn log(&self, _location: LogLocation, _code: LogCode, _priority: bool) {}
}

/// Retains the last `ERROR_STACK_MAX` log calls in a fixed-capacity ring.
/// Intended for tests that assert on what got logged; never used in
/// flight.
pub struct RecordingLogSink {
    entries: Mutex<Deque<LogEntry, ERROR_STACK_MAX>>,
}

impl RecordingLogSink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(Deque::new()),
        }
    }

    /// Snapshot of every recorded entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> heapless::Vec<LogEntry, ERROR_STACK_MAX> {
        self.entries.lock().iter().copied().collect()
    }

    /// Number of times `code` was logged, regardless of location.
    #[must_use]
    pub fn count(&self, code: LogCode) -> usize {
        self.entries.lock().iter().filter(|e| e.code == code).count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for RecordingLogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for RecordingLogSink {
    fn log(&self, location: LogLocation, code: LogCode, priority: bool) {
        let mut entries = self.entries.lock();
        if entries.is_full() {
            entries.pop_front();
        }
        let _ = entries.push_back(LogEntry {
            location,
            code,
            priority,
        });
    }
}
