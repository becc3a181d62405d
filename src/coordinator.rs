//! The persistent state coordinator: orchestrates boot load, flush,
//! emergency flush, and per-field setters under a single coarse lock.

use spin::Mutex;

use crate::cache::CacheTrio;
use crate::codec::{Field, ALL_FIELDS};
use crate::constants::{LOCK_WAIT_TICKS, STORAGE_MAX_FIELD_SIZE};
use crate::driver::NvDriver;
use crate::errors::Error;
use crate::errorlog::ErrorLogStack;
use crate::external::{SatStateSource, TickSource};
use crate::lock::acquire_bounded;
use crate::logging::{LogCode, LogLocation, LogSink};
use crate::raid::RaidVoter;
use crate::record::{EventFlags, PersistentChargingData, PersistentState};
use crate::seqlock::Published;
use crate::timebase::Timebase;

/// Everything `bus_cache_lock` protects: the NV bus driver handle and the
/// RAM redundancy trio, as one unit.
struct CoordinatorInner<D> {
    driver: D,
    cache: CacheTrio,
    raid: RaidVoter,
}

/// Forwards only high-priority log calls. Used for `flush_emergency`,
/// where an ISR should not spend cycles recording routine detail.
struct QuietLog<'a, L: LogSink>(&'a L);

impl<'a, L: LogSink> LogSink for QuietLog<'a, L> {
    fn log(&self, location: LogLocation, code: LogCode, priority: bool) {
        if priority {
            self.0.log(location, code, priority);
        }
    }
}

/// Orchestrates the fault-tolerant persistent cache. Generic over the four
/// external collaborator contracts this crate consumes but does not
/// implement: the NV bus driver, the log sink, the scheduler's tick
/// source, and the mode-management task's current-state getter.
pub struct Coordinator<D, L, T, S> {
    inner: Mutex<CoordinatorInner<D>>,
    published: Published<PersistentState>,
    timebase: Timebase,
    error_log: ErrorLogStack,
    log: L,
    ticks: T,
    sat_state_source: S,
}

impl<D, L, T, S> Coordinator<D, L, T, S>
where
    D: NvDriver,
    L: LogSink,
    T: TickSource,
    S: SatStateSource,
{
    /// Brings the subsystem up: zeroes the cache so callers who read
    /// before `load()` observe well-defined values, and creates
    /// `bus_cache_lock` in the available state. Chip-select wiring is the
    /// caller's `driver` value's own concern, not this crate's.
    #[must_use]
    pub fn new(driver: D, log: L, ticks: T, sat_state_source: S) -> Self {
        let cache = CacheTrio::new(PersistentState::default());
        Self {
            inner: Mutex::new(CoordinatorInner {
                driver,
                cache,
                raid: RaidVoter::new(),
            }),
            published: Published::new(PersistentState::default()),
            timebase: Timebase::new(),
            error_log: ErrorLogStack::new(),
            log,
            ticks,
            sat_state_source,
        }
    }

    /// The named `UNINITIALISED -> READY` entry point: wraps [`Self::new`]
    /// in a `Result` so callers get the fallible contract described for
    /// subsystem bring-up, even though nothing in this crate's own state
    /// construction can currently fail. Chip-select wiring is the
    /// `driver` value's own concern and happens before this is called.
    pub fn init(driver: D, log: L, ticks: T, sat_state_source: S) -> Result<Self, Error> {
        Ok(Self::new(driver, log, ticks, sat_state_source))
    }

    /// Reads every field in from NV and populates the cache. On a lock
    /// timeout, logs and leaves the cache at its zeroed default, an
    /// acceptable fallback per the failure semantics table.
    pub fn load(&self) -> bool {
        let Some(mut inner) = acquire_bounded(&self.inner, LOCK_WAIT_TICKS) else {
            self.log.log(LogLocation::Coordinator, LogCode::MutexTimeout, false);
            return false;
        };

        for field in ALL_FIELDS {
            let width = self.confirm_width(field, inner.cache.primary.error_count);
            let (bytes, _confidence) = inner.raid.read(&mut inner.driver, &self.log, field, width);
            field.deserialize(&mut inner.cache.primary, bytes);
        }

        inner.cache.sync_redundancy();

        self.error_log.populate(
            inner.cache.primary.error_count,
            &inner.cache.primary.error_log,
            &self.log,
        );

        self.timebase
            .stamp(inner.cache.primary.secs_since_launch, self.ticks.ticks_ms());
        self.published.write(inner.cache.primary);

        true
    }

    /// The full write-out: refresh time-sensitive fields, synchronise the
    /// RAM trio, write every field, and optionally confirm by reading back.
    pub fn flush(&self, confirm: bool) -> bool {
        match acquire_bounded(&self.inner, LOCK_WAIT_TICKS) {
            Some(mut inner) => self.flush_locked(&mut inner, confirm, false),
            None => {
                self.log.log(LogLocation::Coordinator, LogCode::MutexTimeout, false);
                false
            }
        }
    }

    /// The reduced-safety path: a non-blocking lock acquire and, if
    /// successful, a flush without confirmation. Never spins; intended
    /// for a voltage-brownout interrupt handler. `from_isr` selects the
    /// reduced logging verbosity appropriate to that context; it does not
    /// change the locking primitive, since `spin::Mutex::try_lock` is
    /// already non-blocking.
    pub fn flush_emergency(&self, from_isr: bool) -> bool {
        match self.inner.try_lock() {
            Some(mut inner) => self.flush_locked(&mut inner, false, from_isr),
            None => false,
        }
    }

    fn flush_locked(&self, inner: &mut CoordinatorInner<D>, confirm: bool, quiet: bool) -> bool {
        let quiet_log = QuietLog(&self.log);
        let log: &dyn LogSink = if quiet { &quiet_log } else { &self.log };

        inner.cache.correct_errors(log);

        let ticks_now = self.ticks.ticks_ms();
        let (pre_secs, pre_tick) = self.timebase.current_stamp();
        let new_secs = self.timebase.now_seconds(ticks_now).min(u64::from(u32::MAX)) as u32;

        inner.cache.primary.sat_state = self.sat_state_source.current();
        inner.cache.primary.secs_since_launch = new_secs;
        self.timebase.stamp(new_secs, ticks_now);

        let snapshot = self.error_log.snapshot(log);
        inner.cache.primary.error_count = snapshot.count;
        inner.cache.primary.error_log = snapshot.records;

        inner.cache.sync_redundancy();

        let mut buf = [0u8; STORAGE_MAX_FIELD_SIZE];
        let mut all_ok = true;
        for field in ALL_FIELDS {
            let bytes = field.serialize(&inner.cache.primary, &mut buf);
            let status = inner.raid.write(&mut inner.driver, field, bytes);
            all_ok &= status.is_success();
        }

        if confirm {
            for field in ALL_FIELDS {
                let mut expected_buf = [0u8; STORAGE_MAX_FIELD_SIZE];
                let expected = field.serialize(&inner.cache.primary, &mut expected_buf);
                let width = expected.len();
                let (actual, _confidence) =
                    inner.raid.read(&mut inner.driver, log, field, width);

                if actual != expected {
                    log.log(LogLocation::Coordinator, LogCode::InconsistentData, false);

                    if field == Field::SecsSinceLaunch {
                        let read_back = u32::from_le_bytes(actual[..4].try_into().unwrap());
                        if read_back < new_secs {
                            inner.cache.primary.secs_since_launch = pre_secs;
                            self.timebase.stamp(pre_secs, pre_tick);
                        }
                    }
                }
            }
        }

        inner.cache.sync_redundancy();
        self.published.write(inner.cache.primary);

        all_ok
    }

    /// Width to read back or compare for `field`, given the live
    /// `error_count`; `ErrorLog`'s width at rest covers the whole extent,
    /// but only the live prefix was ever written.
    fn confirm_width(&self, field: Field, error_count: u8) -> usize {
        if field == Field::ErrorLog {
            Field::error_log_width(error_count)
        } else {
            field.width()
        }
    }

    fn setter(&self, apply: impl FnOnce(&mut PersistentState)) -> bool {
        let Some(mut inner) = acquire_bounded(&self.inner, LOCK_WAIT_TICKS) else {
            self.log.log(LogLocation::Coordinator, LogCode::MutexTimeout, false);
            return false;
        };

        inner.cache.correct_errors(&self.log);
        apply(&mut inner.cache.primary);
        inner.cache.sync_redundancy();

        self.flush_locked(&mut inner, true, false)
    }

    pub fn increment_reboot_count(&self) -> bool {
        self.setter(|state| state.reboot_count = state.reboot_count.saturating_add(1))
    }

    pub fn set_radio_revive_timestamp(&self, timestamp: u32) -> bool {
        self.setter(|state| state.radio_revive_timestamp = timestamp)
    }

    pub fn update_sat_event_history(&self, flags: EventFlags) -> bool {
        self.setter(|state| state.sat_event_history.merge(flags))
    }

    pub fn set_persistent_charging_data(&self, data: PersistentChargingData) -> bool {
        self.setter(|state| state.persistent_charging_data = data)
    }

    /// Set only by a bootloader collaborator, distinct from the latching
    /// bit of the same name inside `sat_event_history`.
    pub fn set_prog_mem_rewritten(&self, value: bool) -> bool {
        self.setter(|state| state.prog_mem_rewritten = value)
    }

    /// Queues a record for persistence on the next flush. The record
    /// itself originates outside this crate; this just accepts it.
    pub fn push_error(&self, error: crate::record::SatError) {
        self.error_log.push(error);
    }

    // Lock-free accessors. Every one reads the seqlock published at the
    // end of the last successful `load`/`flush`/setter; none touch
    // `bus_cache_lock`.

    #[must_use]
    pub fn secs_since_launch(&self) -> u32 {
        self.published.read().secs_since_launch
    }

    #[must_use]
    pub fn reboot_count(&self) -> u8 {
        self.published.read().reboot_count
    }

    #[must_use]
    pub fn sat_state(&self) -> crate::record::SatState {
        self.published.read().sat_state
    }

    #[must_use]
    pub fn sat_event_history(&self) -> crate::record::SatEventHistory {
        self.published.read().sat_event_history
    }

    #[must_use]
    pub fn prog_mem_rewritten(&self) -> bool {
        self.published.read().prog_mem_rewritten
    }

    #[must_use]
    pub fn radio_revive_timestamp(&self) -> u32 {
        self.published.read().radio_revive_timestamp
    }

    #[must_use]
    pub fn persistent_charging_data(&self) -> PersistentChargingData {
        self.published.read().persistent_charging_data
    }

    #[must_use]
    pub fn now_seconds(&self) -> u64 {
        self.timebase.now_seconds(self.ticks.ticks_ms())
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.timebase.now_ms(self.ticks.ticks_ms())
    }

    pub fn passed_orbit_fraction(&self, prev_bucket: &mut u64, denom: u64) -> bool {
        self.timebase
            .passed_orbit_fraction(prev_bucket, denom, self.ticks.ticks_ms())
    }
}
