//! Black-box fault-injection scenarios against the public API: the six
//! seed cases, one test each, plus the round-trip property.

use std::cell::Cell;
use std::rc::Rc;

use sat_persist::codec::{Field, ALL_FIELDS};
use sat_persist::driver::{DriverStatus, NvDevice, NvDriver};
use sat_persist::logging::{LogCode, NullLogSink, RecordingLogSink};
use sat_persist::raid::{Confidence, RaidVoter};
use sat_persist::record::{EventFlags, PersistentState, SatState};
use sat_persist::test_support::MockDriver;
use sat_persist::{Coordinator, external::{SatStateSource, TickSource}};

#[derive(Clone)]
struct SharedTicks(Rc<Cell<u64>>);

impl SharedTicks {
    fn new(initial: u64) -> Self {
        Self(Rc::new(Cell::new(initial)))
    }

    fn set(&self, ms: u64) {
        self.0.set(ms);
    }
}

impl TickSource for SharedTicks {
    fn ticks_ms(&self) -> u64 {
        self.0.get()
    }
}

struct FixedSatState(SatState);

impl SatStateSource for FixedSatState {
    fn current(&self) -> SatState {
        self.0
    }
}

/// Wraps a [`MockDriver`] and, once armed, substitutes a fixed byte
/// pattern for every read at a chosen address regardless of what was
/// actually written; models a confirm-after-write read-back that
/// disagrees with the cache.
struct StaleReadDriver {
    inner: MockDriver,
    armed: Rc<Cell<bool>>,
    stale_addr: u32,
    stale_width: usize,
    stale_bytes: [u8; 4],
}

impl NvDriver for StaleReadDriver {
    fn read_bytes(&mut self, device: NvDevice, dst: &mut [u8], addr: u32) -> DriverStatus {
        if self.armed.get()
            && dst.len() == self.stale_width
            && (addr == self.stale_addr || addr == self.stale_addr + self.stale_width as u32)
        {
            dst.copy_from_slice(&self.stale_bytes[..self.stale_width]);
            return DriverStatus::Success;
        }
        self.inner.read_bytes(device, dst, addr)
    }

    fn write_bytes(&mut self, device: NvDevice, src: &[u8], addr: u32) -> DriverStatus {
        self.inner.write_bytes(device, src, addr)
    }
}

#[test]
fn seed_case_1_single_copy_bit_flip_in_nv_a() {
    let mut driver = MockDriver::new();
    let mut voter = RaidVoter::new();
    let log = RecordingLogSink::new();

    let mut state = PersistentState::default();
    state.secs_since_launch = 0x0102_0304;
    let mut buf = [0u8; 400];
    let bytes = Field::SecsSinceLaunch.serialize(&state, &mut buf).to_vec();
    voter.write(&mut driver, Field::SecsSinceLaunch, &bytes);

    // Flip one byte of NV-A copy-1.
    driver.corrupt_byte(NvDevice::A, Field::SecsSinceLaunch.address(), 0xFF);

    let (result, confidence) = voter.read(&mut driver, &log, Field::SecsSinceLaunch, 4);
    let recovered = u32::from_le_bytes(result.try_into().unwrap());

    assert_eq!(recovered, 0x0102_0304);
    assert_eq!(confidence, Confidence::Low);
    assert_eq!(log.count(LogCode::InconsistentData), 1);
}

#[test]
fn seed_case_2_entire_nv_b_device_dead() {
    let mut driver = MockDriver::new();
    let mut voter = RaidVoter::new();
    let log = RecordingLogSink::new();

    let mut state = PersistentState::default();
    state.reboot_count = 7;
    let mut buf = [0u8; 400];
    let bytes = Field::RebootCount.serialize(&state, &mut buf).to_vec();
    voter.write(&mut driver, Field::RebootCount, &bytes);

    driver.kill_device(NvDevice::B);

    let (result, _confidence) = voter.read(&mut driver, &log, Field::RebootCount, 1);
    assert_eq!(result[0], 7);
    assert!(log.count(LogCode::InconsistentData) >= 1);
}

#[test]
fn seed_case_3_all_four_diverge_with_one_cross_match() {
    let mut driver = MockDriver::new();
    let mut voter = RaidVoter::new();
    let log = NullLogSink;

    let addr = Field::RebootCount.address();
    let width = Field::RebootCount.width() as u32;

    // A2 == B1 == 42; A1 and B2 are distinct garbage.
    driver.corrupt_byte(NvDevice::A, addr, 0x11);
    driver.corrupt_byte(NvDevice::A, addr + width, 42);
    driver.corrupt_byte(NvDevice::B, addr, 42);
    driver.corrupt_byte(NvDevice::B, addr + width, 0x22);

    let (result, confidence) = voter.read(&mut driver, &log, Field::RebootCount, 1);
    assert_eq!(result[0], 42);
    assert_eq!(confidence, Confidence::High);
}

#[test]
fn seed_case_4_ram_tmr_correction() {
    use sat_persist::cache::CacheTrio;

    let mut trio = CacheTrio::new(PersistentState::default());
    trio.copy2.reboot_count = trio.primary.reboot_count + 1;

    let log = RecordingLogSink::new();
    trio.correct_errors(&log);

    assert_eq!(trio.copy2, trio.primary);
    assert_eq!(log.count(LogCode::Corrupted), 1);
}

#[test]
fn seed_case_5_monotonic_clock_guard() {
    // Pre-populate every copy with secs_since_launch = 100 before the
    // coordinator ever touches the driver, so `load()` establishes the
    // documented pre-state exactly: secs_since_launch = 100, last_write_ms = 0.
    let mut inner = MockDriver::new();
    let mut seed_voter = RaidVoter::new();
    let mut seed_state = PersistentState::default();
    seed_state.secs_since_launch = 100;
    let mut buf = [0u8; 400];
    let bytes = Field::SecsSinceLaunch
        .serialize(&seed_state, &mut buf)
        .to_vec();
    seed_voter.write(&mut inner, Field::SecsSinceLaunch, &bytes);

    let armed = Rc::new(Cell::new(false));
    let driver = StaleReadDriver {
        inner,
        armed: armed.clone(),
        stale_addr: Field::SecsSinceLaunch.address(),
        stale_width: 4,
        stale_bytes: 50u32.to_le_bytes(),
    };

    let ticks = SharedTicks::new(0);
    let coordinator = Coordinator::new(driver, NullLogSink, ticks.clone(), FixedSatState(SatState::Idle));

    assert!(coordinator.load());
    assert_eq!(coordinator.secs_since_launch(), 100);

    ticks.set(5_000);
    armed.set(true);
    coordinator.flush(true);

    assert_eq!(
        coordinator.secs_since_launch(),
        100,
        "a stale read-back below what was just written must roll the cache back to its pre-flush value"
    );
}

#[test]
fn seed_case_6_event_history_monotonicity() {
    let driver = MockDriver::new();
    let ticks = SharedTicks::new(0);
    let coordinator = Coordinator::new(driver, NullLogSink, ticks, FixedSatState(SatState::Idle));

    coordinator.update_sat_event_history(EventFlags {
        antenna_deployed: true,
        ..Default::default()
    });

    coordinator.update_sat_event_history(EventFlags {
        antenna_deployed: false,
        lion_1_charged: true,
        ..Default::default()
    });

    let history = coordinator.sat_event_history();
    assert!(history.antenna_deployed());
    assert!(history.lion_1_charged());
}

#[test]
fn round_trip_every_field_on_a_fault_free_mock() {
    let mut driver = MockDriver::new();
    let mut voter = RaidVoter::new();
    let log = NullLogSink;

    let mut state = PersistentState::default();
    state.secs_since_launch = 999;
    state.reboot_count = 3;
    state.sat_state = SatState::LowPower;
    state.radio_revive_timestamp = 123_456;

    let mut buf = [0u8; 400];
    for field in ALL_FIELDS {
        if field == Field::ErrorLog {
            continue;
        }
        let bytes = field.serialize(&state, &mut buf).to_vec();
        voter.write(&mut driver, field, &bytes);
    }

    let mut decoded = PersistentState::default();
    for field in ALL_FIELDS {
        if field == Field::ErrorLog {
            continue;
        }
        let (bytes, confidence) = voter.read(&mut driver, &log, field, field.width());
        assert_eq!(confidence, Confidence::High);
        field.deserialize(&mut decoded, bytes);
    }

    assert_eq!(decoded.secs_since_launch, 999);
    assert_eq!(decoded.reboot_count, 3);
    assert_eq!(decoded.sat_state, SatState::LowPower);
    assert_eq!(decoded.radio_revive_timestamp, 123_456);
}
