//! Bounded in-RAM stack of recent error records, persisted into NV on
//! every flush and reloaded on boot. Producing error records is out of
//! scope; an external error-reporting subsystem pushes onto this stack;
//! this crate only serialises and restores it.

use heapless::Deque;
use spin::Mutex;

use crate::constants::{ERROR_STACK_MAX, LOCK_WAIT_TICKS};
use crate::lock::acquire_bounded;
use crate::logging::{LogCode, LogLocation, LogSink};
use crate::record::SatError;
use crate::seqlock::Published;

/// A point-in-time copy of the error stack, sized to fit the maximum
/// possible stack regardless of how many records are actually live.
#[derive(Debug, Clone, Copy)]
pub struct ErrorSnapshot {
    pub count: u8,
    pub records: [SatError; ERROR_STACK_MAX],
}

impl Default for ErrorSnapshot {
    fn default() -> Self {
        Self {
            count: 0,
            records: [SatError::default(); ERROR_STACK_MAX],
        }
    }
}

pub struct ErrorLogStack {
    stack: Mutex<Deque<SatError, ERROR_STACK_MAX>>,
    last_snapshot: Published<ErrorSnapshot>,
}

impl ErrorLogStack {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stack: Mutex::new(Deque::new()),
            last_snapshot: Published::new(ErrorSnapshot {
                count: 0,
                records: [SatError {
                    timestamp_s: 0,
                    location: 0,
                    code: 0,
                    priority: false,
                }; ERROR_STACK_MAX],
            }),
        }
    }

    /// Pushes a new record, evicting the oldest if the stack is full.
    /// Called by the (out-of-scope) error-reporting subsystem.
    pub fn push(&self, error: SatError) {
        let mut stack = self.stack.lock();
        if stack.is_full() {
            stack.pop_front();
        }
        let _ = stack.push_back(error);
    }

    /// Snapshots the stack under its own bounded-wait mutex. On timeout,
    /// logs `EQUISTACK_MUTEX_TIMEOUT` and falls back to the last snapshot
    /// that was taken successfully, per the "best-effort" contract.
    pub fn snapshot(&self, log: &dyn LogSink) -> ErrorSnapshot {
        match acquire_bounded(&self.stack, LOCK_WAIT_TICKS) {
            Some(stack) => {
                let mut snapshot = ErrorSnapshot::default();
                snapshot.count = stack.len() as u8;
                for (i, record) in stack.iter().enumerate() {
                    snapshot.records[i] = *record;
                }
                self.last_snapshot.write(snapshot);
                snapshot
            }
            None => {
                log.log(LogLocation::ErrorLog, LogCode::EquistackMutexTimeout, false);
                self.last_snapshot.read()
            }
        }
    }

    /// Restores the stack from a boot-time read. `stored_count` may exceed
    /// `ERROR_STACK_MAX` if the persisted field itself was corrupted; this
    /// clamps to the maximum and logs `OUT_OF_BOUNDS` rather than skipping
    /// the records entirely.
    pub fn populate(&self, stored_count: u8, records: &[SatError], log: &dyn LogSink) {
        let count = usize::from(stored_count);
        if count > ERROR_STACK_MAX {
            log.log(LogLocation::ErrorLog, LogCode::OutOfBounds, false);
        }
        let count = count.min(ERROR_STACK_MAX).min(records.len());

        let mut stack = self.stack.lock();
        stack.clear();
        for record in &records[..count] {
            let _ = stack.push_back(*record);
        }

        let mut snapshot = ErrorSnapshot::default();
        snapshot.count = count as u8;
        snapshot.records[..count].copy_from_slice(&records[..count]);
        self.last_snapshot.write(snapshot);
    }
}

impl Default for ErrorLogStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogSink;

    #[test]
    fn snapshot_reflects_pushed_records() {
        let stack = ErrorLogStack::new();
        stack.push(SatError {
            timestamp_s: 1,
            location: 2,
            code: 3,
            priority: true,
        });

        let snapshot = stack.snapshot(&NullLogSink);
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.records[0].timestamp_s, 1);
    }

    #[test]
    fn populate_clamps_out_of_range_count_and_keeps_max() {
        let stack = ErrorLogStack::new();
        let records = [SatError::default(); ERROR_STACK_MAX];

        stack.populate(255, &records, &NullLogSink);

        let snapshot = stack.snapshot(&NullLogSink);
        assert_eq!(snapshot.count as usize, ERROR_STACK_MAX);
    }

    #[test]
    fn push_evicts_oldest_once_full() {
        let stack = ErrorLogStack::new();
        for i in 0..ERROR_STACK_MAX as u32 + 1 {
            stack.push(SatError {
                timestamp_s: i,
                location: 0,
                code: 0,
                priority: false,
            });
        }

        let snapshot = stack.snapshot(&NullLogSink);
        assert_eq!(snapshot.count as usize, ERROR_STACK_MAX);
        assert_eq!(snapshot.records[0].timestamp_s, 1);
    }
}
