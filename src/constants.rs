//! Compile-time constants: the NV address map, field widths, and timing
//! bounds. Nothing here allocates or depends on a particular target.

/// Maximum byte width of any single logical field, including the error log
/// extent. All RAID scratch buffers are sized to this bound.
pub const STORAGE_MAX_FIELD_SIZE: usize = 400;

/// Maximum number of error records retained in the bounded error stack.
pub const ERROR_STACK_MAX: usize = 16;

/// Byte width of a single serialised `SatError` record.
pub const ERROR_RECORD_SIZE: usize = 8;

/// Orbital period in seconds, used by [`crate::timebase::Timebase::passed_orbit_fraction`].
pub const ORBITAL_PERIOD_S: u64 = 5580;

/// Bounded-wait budget for acquiring `bus_cache_lock`, expressed in scheduler
/// ticks. Derived from a 1000 ms wait at a 1 ms tick period, matching the
/// original `MRAM_SPI_MUTEX_WAIT_TIME_TICKS` constant.
pub const LOCK_WAIT_TICKS: u32 = 1000;

/// SPI baud rate for the NV bus. Documentation only: chip selects and the
/// bus itself are configured by a collaborator outside this crate.
pub const NV_SPI_BAUD_HZ: u32 = 10_000_000;

/// Fixed offset, in bytes, of a field's copy-A location on either NV device.
/// Copy-B sits at `addr + width`.
pub struct FieldAddr {
    pub addr: u32,
    pub width: usize,
}

pub const SECS_SINCE_LAUNCH: FieldAddr = FieldAddr { addr: 20, width: 4 };
pub const REBOOT_COUNT: FieldAddr = FieldAddr { addr: 30, width: 1 };
pub const SAT_STATE: FieldAddr = FieldAddr { addr: 34, width: 1 };
pub const SAT_EVENT_HISTORY: FieldAddr = FieldAddr { addr: 38, width: 1 };
pub const PROG_MEM_REWRITTEN: FieldAddr = FieldAddr { addr: 42, width: 1 };
pub const RADIO_REVIVE_TIMESTAMP: FieldAddr = FieldAddr { addr: 46, width: 4 };
pub const PERSISTENT_CHARGING_DATA: FieldAddr = FieldAddr { addr: 50, width: 1 };

/// Start of the bootloader-owned program memory image. Not touched by this
/// crate; retained only so the address map reads as a complete picture.
pub const PROGRAM_MEMORY_IMAGE_ADDR: u32 = 60;

pub const ERROR_COUNT: FieldAddr = FieldAddr { addr: 175_080, width: 1 };
pub const ERROR_LOG: FieldAddr = FieldAddr {
    addr: 175_084,
    width: ERROR_STACK_MAX * ERROR_RECORD_SIZE,
};
