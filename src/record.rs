//! The persistent record and its constituent types.

use bit_field::BitField;

use crate::constants::ERROR_STACK_MAX;

/// Last known satellite mode at write time. An on-disk byte that doesn't
/// match a known variant decodes to `Unknown` rather than panicking or
/// silently coercing to a default; a RAID read of a corrupted enum byte
/// must still compare unequal to every valid variant, not look like
/// agreement with one by coincidence.
///
/// # Variants
///
/// * `Boot` - powered on, before subsystem init completes.
/// * `AntennaDeploy` - antenna deployment in progress.
/// * `Idle` - nominal, no mode-specific activity.
/// * `LowPower` - battery below the low-power threshold.
/// * `Safe` - safe mode, entered on an unrecoverable fault elsewhere.
/// * `Unknown(u8)` - an on-disk byte that matched none of the above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatState {
    Boot,
    AntennaDeploy,
    Idle,
    LowPower,
    Safe,
    Unknown(u8),
}

impl SatState {
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Boot => 0,
            Self::AntennaDeploy => 1,
            Self::Idle => 2,
            Self::LowPower => 3,
            Self::Safe => 4,
            Self::Unknown(byte) => byte,
        }
    }

    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Boot,
            1 => Self::AntennaDeploy,
            2 => Self::Idle,
            3 => Self::LowPower,
            4 => Self::Safe,
            other => Self::Unknown(other),
        }
    }
}

impl Default for SatState {
    fn default() -> Self {
        Self::Boot
    }
}

/// Seven monotonic latching flags packed into a single byte. Once a bit is
/// set TRUE, no later update may clear it; see
/// [`SatEventHistory::merge`].
///
/// # Bits
///
/// * `0` - `antenna_deployed`
/// * `1` - `lion_1_charged`
/// * `2` - `lion_2_charged`
/// * `3` - `lifepo_b1_charged`
/// * `4` - `lifepo_b2_charged`
/// * `5` - `first_flash`
/// * `6` - `prog_mem_rewritten`
/// * `7` - unused
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SatEventHistory(pub u8);

const BIT_ANTENNA_DEPLOYED: usize = 0;
const BIT_LION_1_CHARGED: usize = 1;
const BIT_LION_2_CHARGED: usize = 2;
const BIT_LIFEPO_B1_CHARGED: usize = 3;
const BIT_LIFEPO_B2_CHARGED: usize = 4;
const BIT_FIRST_FLASH: usize = 5;
const BIT_PROG_MEM_REWRITTEN: usize = 6;

/// The seven boolean inputs to [`SatEventHistory::merge`], one per
/// latching bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventFlags {
    pub antenna_deployed: bool,
    pub lion_1_charged: bool,
    pub lion_2_charged: bool,
    pub lifepo_b1_charged: bool,
    pub lifepo_b2_charged: bool,
    pub first_flash: bool,
    pub prog_mem_rewritten: bool,
}

macro_rules! bit_accessor {
    ($getter:ident, $setter:ident, $bit:expr) => {
        #[must_use]
        pub fn $getter(&self) -> bool {
            self.0.get_bit($bit)
        }

        pub fn $setter(&mut self, value: bool) {
            self.0.set_bit($bit, value);
        }
    };
}

impl SatEventHistory {
    bit_accessor!(antenna_deployed, set_antenna_deployed, BIT_ANTENNA_DEPLOYED);
    bit_accessor!(lion_1_charged, set_lion_1_charged, BIT_LION_1_CHARGED);
    bit_accessor!(lion_2_charged, set_lion_2_charged, BIT_LION_2_CHARGED);
    bit_accessor!(
        lifepo_b1_charged,
        set_lifepo_b1_charged,
        BIT_LIFEPO_B1_CHARGED
    );
    bit_accessor!(
        lifepo_b2_charged,
        set_lifepo_b2_charged,
        BIT_LIFEPO_B2_CHARGED
    );
    bit_accessor!(first_flash, set_first_flash, BIT_FIRST_FLASH);
    bit_accessor!(
        prog_mem_rewritten,
        set_prog_mem_rewritten,
        BIT_PROG_MEM_REWRITTEN
    );

    /// Applies `flags`, honouring the monotonic-latching contract: a FALSE
    /// input never clears a stored TRUE bit, only a TRUE input can set one.
    pub fn merge(&mut self, flags: EventFlags) {
        if flags.antenna_deployed {
            self.set_antenna_deployed(true);
        }
        if flags.lion_1_charged {
            self.set_lion_1_charged(true);
        }
        if flags.lion_2_charged {
            self.set_lion_2_charged(true);
        }
        if flags.lifepo_b1_charged {
            self.set_lifepo_b1_charged(true);
        }
        if flags.lifepo_b2_charged {
            self.set_lifepo_b2_charged(true);
        }
        if flags.first_flash {
            self.set_first_flash(true);
        }
        if flags.prog_mem_rewritten {
            self.set_prog_mem_rewritten(true);
        }
    }
}

/// Packed 1-byte battery-charging record. `li_caused_reboot` is signed
/// because the owning task encodes "not yet observed" as a negative
/// sentinel distinct from the FALSE/TRUE range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistentChargingData {
    pub li_caused_reboot: i8,
}

/// A single recorded error, as persisted into the bounded error-log
/// extent. Fixed size, matching [`crate::constants::ERROR_RECORD_SIZE`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SatError {
    pub timestamp_s: u32,
    pub location: u8,
    pub code: u8,
    pub priority: bool,
}

/// The full persistent record, cached in RAM under triple-modular
/// redundancy and mirrored across NV-A/NV-B under the RAID voter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistentState {
    pub secs_since_launch: u32,
    pub reboot_count: u8,
    pub sat_state: SatState,
    pub sat_event_history: SatEventHistory,
    pub prog_mem_rewritten: bool,
    pub radio_revive_timestamp: u32,
    pub persistent_charging_data: PersistentChargingData,
    pub error_count: u8,
    pub error_log: [SatError; ERROR_STACK_MAX],
}

impl Default for PersistentState {
    fn default() -> Self {
        Self {
            secs_since_launch: 0,
            reboot_count: 0,
            sat_state: SatState::default(),
            sat_event_history: SatEventHistory::default(),
            prog_mem_rewritten: false,
            radio_revive_timestamp: 0,
            persistent_charging_data: PersistentChargingData::default(),
            error_count: 0,
            error_log: [SatError::default(); ERROR_STACK_MAX],
        }
    }
}
