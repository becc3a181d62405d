//! Per-field serialisation: a fixed offset and fixed width per logical
//! field, little-endian multi-byte integers. Portability across byte
//! orders is not required; the NV devices never change endianness at
//! runtime.

use crate::constants::{
    self, ERROR_RECORD_SIZE, ERROR_STACK_MAX, STORAGE_MAX_FIELD_SIZE,
};
use crate::record::{PersistentState, SatError, SatEventHistory, SatState};

/// Every logical field the RAID voter moves in and out of NV, one at a
/// time. `ErrorLog` covers the whole variable-length extent at once; its
/// width is derived from the live `error_count`, never the fixed maximum,
/// so that a field-width-bound scratch buffer is always sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SecsSinceLaunch,
    RebootCount,
    SatState,
    SatEventHistory,
    ProgMemRewritten,
    RadioReviveTimestamp,
    PersistentChargingData,
    ErrorCount,
    ErrorLog,
}

/// Every field, in the fixed order the coordinator writes them. Not an
/// address-ascending order; `ErrorLog` always goes last so `ErrorCount`
/// is already committed when it does.
pub const ALL_FIELDS: [Field; 9] = [
    Field::SecsSinceLaunch,
    Field::RebootCount,
    Field::SatState,
    Field::SatEventHistory,
    Field::ProgMemRewritten,
    Field::RadioReviveTimestamp,
    Field::PersistentChargingData,
    Field::ErrorCount,
    Field::ErrorLog,
];

impl Field {
    /// Copy-A address for this field. Copy-B sits at `address() + width()`.
    #[must_use]
    pub fn address(self) -> u32 {
        match self {
            Self::SecsSinceLaunch => constants::SECS_SINCE_LAUNCH.addr,
            Self::RebootCount => constants::REBOOT_COUNT.addr,
            Self::SatState => constants::SAT_STATE.addr,
            Self::SatEventHistory => constants::SAT_EVENT_HISTORY.addr,
            Self::ProgMemRewritten => constants::PROG_MEM_REWRITTEN.addr,
            Self::RadioReviveTimestamp => constants::RADIO_REVIVE_TIMESTAMP.addr,
            Self::PersistentChargingData => constants::PERSISTENT_CHARGING_DATA.addr,
            Self::ErrorCount => constants::ERROR_COUNT.addr,
            Self::ErrorLog => constants::ERROR_LOG.addr,
        }
    }

    /// Fixed byte width of a single copy of this field, bounded by
    /// `STORAGE_MAX_FIELD_SIZE`. For `ErrorLog`, the width at rest is the
    /// full extent; callers that know the live `error_count` may read or
    /// write a shorter prefix via [`Self::error_log_width`].
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Self::SecsSinceLaunch => constants::SECS_SINCE_LAUNCH.width,
            Self::RebootCount => constants::REBOOT_COUNT.width,
            Self::SatState => constants::SAT_STATE.width,
            Self::SatEventHistory => constants::SAT_EVENT_HISTORY.width,
            Self::ProgMemRewritten => constants::PROG_MEM_REWRITTEN.width,
            Self::RadioReviveTimestamp => constants::RADIO_REVIVE_TIMESTAMP.width,
            Self::PersistentChargingData => constants::PERSISTENT_CHARGING_DATA.width,
            Self::ErrorCount => constants::ERROR_COUNT.width,
            Self::ErrorLog => constants::ERROR_LOG.width,
        }
    }

    /// Width of the error log extent actually occupied by `count` records.
    #[must_use]
    pub fn error_log_width(count: u8) -> usize {
        usize::from(count) * ERROR_RECORD_SIZE
    }

    /// Serialises this field out of `state` into `buf`, returning the
    /// slice actually written (`<= STORAGE_MAX_FIELD_SIZE`).
    pub fn serialize<'buf>(
        self,
        state: &PersistentState,
        buf: &'buf mut [u8; STORAGE_MAX_FIELD_SIZE],
    ) -> &'buf [u8] {
        match self {
            Self::SecsSinceLaunch => {
                buf[..4].copy_from_slice(&state.secs_since_launch.to_le_bytes());
                &buf[..4]
            }
            Self::RebootCount => {
                buf[0] = state.reboot_count;
                &buf[..1]
            }
            Self::SatState => {
                buf[0] = state.sat_state.to_byte();
                &buf[..1]
            }
            Self::SatEventHistory => {
                buf[0] = state.sat_event_history.0;
                &buf[..1]
            }
            Self::ProgMemRewritten => {
                buf[0] = u8::from(state.prog_mem_rewritten);
                &buf[..1]
            }
            Self::RadioReviveTimestamp => {
                buf[..4].copy_from_slice(&state.radio_revive_timestamp.to_le_bytes());
                &buf[..4]
            }
            Self::PersistentChargingData => {
                buf[0] = state.persistent_charging_data.li_caused_reboot as u8;
                &buf[..1]
            }
            Self::ErrorCount => {
                buf[0] = state.error_count;
                &buf[..1]
            }
            Self::ErrorLog => {
                let count = usize::from(state.error_count).min(ERROR_STACK_MAX);
                let width = Self::error_log_width(count as u8);
                for (i, record) in state.error_log[..count].iter().enumerate() {
                    serialize_error_record(record, &mut buf[i * ERROR_RECORD_SIZE..][..ERROR_RECORD_SIZE]);
                }
                &buf[..width]
            }
        }
    }

    /// Deserialises `bytes` into the matching field of `state`. `bytes`
    /// must be exactly [`Self::width`] long, except for `ErrorLog`, where
    /// it must be a whole multiple of [`ERROR_RECORD_SIZE`] no longer than
    /// [`Self::width`].
    pub fn deserialize(self, state: &mut PersistentState, bytes: &[u8]) {
        match self {
            Self::SecsSinceLaunch => {
                state.secs_since_launch = u32::from_le_bytes(bytes[..4].try_into().unwrap());
            }
            Self::RebootCount => state.reboot_count = bytes[0],
            Self::SatState => state.sat_state = SatState::from_byte(bytes[0]),
            Self::SatEventHistory => state.sat_event_history = SatEventHistory(bytes[0]),
            Self::ProgMemRewritten => state.prog_mem_rewritten = bytes[0] != 0,
            Self::RadioReviveTimestamp => {
                state.radio_revive_timestamp = u32::from_le_bytes(bytes[..4].try_into().unwrap());
            }
            Self::PersistentChargingData => {
                state.persistent_charging_data.li_caused_reboot = bytes[0] as i8;
            }
            Self::ErrorCount => {
                state.error_count = bytes[0].min(ERROR_STACK_MAX as u8);
            }
            Self::ErrorLog => {
                let count = (bytes.len() / ERROR_RECORD_SIZE).min(ERROR_STACK_MAX);
                for (i, chunk) in bytes.chunks_exact(ERROR_RECORD_SIZE).take(count).enumerate() {
                    state.error_log[i] = deserialize_error_record(chunk);
                }
            }
        }
    }
}

fn serialize_error_record(record: &SatError, out: &mut [u8]) {
    out[0..4].copy_from_slice(&record.timestamp_s.to_le_bytes());
    out[4] = record.location;
    out[5] = record.code;
    out[6] = u8::from(record.priority);
    out[7] = 0;
}

fn deserialize_error_record(bytes: &[u8]) -> SatError {
    SatError {
        timestamp_s: u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
        location: bytes[4],
        code: bytes[5],
        priority: bytes[6] != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secs_since_launch_round_trips() {
        let mut state = PersistentState::default();
        state.secs_since_launch = 0x0102_0304;

        let mut buf = [0u8; STORAGE_MAX_FIELD_SIZE];
        let bytes = Field::SecsSinceLaunch.serialize(&state, &mut buf).to_vec();

        let mut decoded = PersistentState::default();
        Field::SecsSinceLaunch.deserialize(&mut decoded, &bytes);
        assert_eq!(decoded.secs_since_launch, 0x0102_0304);
    }

    #[test]
    fn error_log_round_trips_prefix_only() {
        let mut state = PersistentState::default();
        state.error_count = 2;
        state.error_log[0] = SatError {
            timestamp_s: 10,
            location: 1,
            code: 2,
            priority: true,
        };
        state.error_log[1] = SatError {
            timestamp_s: 20,
            location: 3,
            code: 4,
            priority: false,
        };

        let mut buf = [0u8; STORAGE_MAX_FIELD_SIZE];
        let bytes = Field::ErrorLog.serialize(&state, &mut buf).to_vec();
        assert_eq!(bytes.len(), 2 * ERROR_RECORD_SIZE);

        let mut decoded = PersistentState::default();
        Field::ErrorLog.deserialize(&mut decoded, &bytes);
        assert_eq!(decoded.error_log[0], state.error_log[0]);
        assert_eq!(decoded.error_log[1], state.error_log[1]);
    }
}
