//! The provisioning entry point: writes an all-zero initial record plus
//! an empty error log and asserts read-back equality on every field. Run
//! once on the bench by a provisioning utility outside this crate; this
//! is explicitly not a silent-log path, since a mismatch here means the
//! hardware itself is unfit to fly.

use crate::codec::{Field, ALL_FIELDS};
use crate::constants::STORAGE_MAX_FIELD_SIZE;
use crate::driver::NvDriver;
use crate::errors::Error;
use crate::logging::LogSink;
use crate::raid::RaidVoter;
use crate::record::PersistentState;

/// Writes and verifies every field of a zero-valued [`PersistentState`].
/// Returns `Err(Error::ProvisionVerifyFailed(address))` naming the first
/// field that failed to write or read back correctly.
pub fn provision(driver: &mut dyn NvDriver, log: &dyn LogSink) -> Result<(), Error> {
    let zero_state = PersistentState::default();
    let mut voter = RaidVoter::new();

    for field in ALL_FIELDS {
        let width = if field == Field::ErrorLog {
            0
        } else {
            field.width()
        };

        let mut buf = [0u8; STORAGE_MAX_FIELD_SIZE];
        let expected = field.serialize(&zero_state, &mut buf);
        debug_assert_eq!(expected.len(), width);

        if !voter.write(driver, field, expected).is_success() {
            return Err(Error::ProvisionVerifyFailed(field.address()));
        }

        let (actual, _confidence) = voter.read(driver, log, field, width);
        if actual != expected {
            return Err(Error::ProvisionVerifyFailed(field.address()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogSink;
    use crate::test_support::MockDriver;

    #[test]
    fn provisioning_a_fresh_device_succeeds() {
        let mut driver = MockDriver::new();
        assert!(provision(&mut driver, &NullLogSink).is_ok());
    }
}
