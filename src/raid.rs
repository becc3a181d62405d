//! The quadruple-copy RAID voter: two copies per field on each of NV-A and
//! NV-B, a read-time voting algorithm that recovers from any subset of
//! corrupted copies, and a write path that fans out to all four.

use crate::codec::Field;
use crate::constants::STORAGE_MAX_FIELD_SIZE;
use crate::driver::{DriverStatus, NvDevice, NvDriver};
use crate::logging::{LogCode, LogLocation, LogSink};

/// Confidence annotation accompanying a RAID read.
///
/// # Variants
///
/// * `High` - full agreement, or a clean cross-device match.
/// * `Low` - some disagreement; this is the voter's best guess.
/// * `Failed` - no recovery possible; value is a fallback, not a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Low,
    Failed,
}

/// Length of the longest maximal run of identical bytes. 0 for empty
/// input; the first byte is always counted, so every non-empty input
/// yields at least 1.
#[must_use]
pub fn longest_same_byte_run(bytes: &[u8]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut prev: Option<u8> = None;

    for &byte in bytes {
        if prev == Some(byte) {
            current += 1;
        } else {
            current = 1;
        }
        if current > longest {
            longest = current;
        }
        prev = Some(byte);
    }

    longest
}

/// Owns the four per-field scratch buffers the voter needs. Sized once at
/// `STORAGE_MAX_FIELD_SIZE` and reused across every field, rather than
/// allocated per call, so the coordinator that embeds a `RaidVoter` has a
/// single static footprint regardless of how many fields it round-trips.
pub struct RaidVoter {
    a1: [u8; STORAGE_MAX_FIELD_SIZE],
    a2: [u8; STORAGE_MAX_FIELD_SIZE],
    b1: [u8; STORAGE_MAX_FIELD_SIZE],
    b2: [u8; STORAGE_MAX_FIELD_SIZE],
    result: [u8; STORAGE_MAX_FIELD_SIZE],
}

impl RaidVoter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a1: [0; STORAGE_MAX_FIELD_SIZE],
            a2: [0; STORAGE_MAX_FIELD_SIZE],
            b1: [0; STORAGE_MAX_FIELD_SIZE],
            b2: [0; STORAGE_MAX_FIELD_SIZE],
            result: [0; STORAGE_MAX_FIELD_SIZE],
        }
    }

    /// Writes `bytes` to all four physical copies, in order A1, A2, B1,
    /// B2. Succeeds only if every one of the four operations succeeds.
    pub fn write(
        &mut self,
        driver: &mut dyn NvDriver,
        field: Field,
        bytes: &[u8],
    ) -> DriverStatus {
        let width = bytes.len() as u32;
        let addr = field.address();

        let s1 = driver.write_bytes(NvDevice::A, bytes, addr);
        let s2 = driver.write_bytes(NvDevice::A, bytes, addr + width);
        let s3 = driver.write_bytes(NvDevice::B, bytes, addr);
        let s4 = driver.write_bytes(NvDevice::B, bytes, addr + width);

        if s1.is_success() && s2.is_success() && s3.is_success() && s4.is_success() {
            DriverStatus::Success
        } else {
            DriverStatus::Failure
        }
    }

    /// Reads `field` from all four physical copies and votes on the best
    /// reconstruction. Returns the recovered bytes (borrowed from internal
    /// scratch space, valid until the next call) and a confidence level.
    pub fn read(
        &mut self,
        driver: &mut dyn NvDriver,
        log: &dyn LogSink,
        field: Field,
        width: usize,
    ) -> (&[u8], Confidence) {
        let addr = field.address();
        let w = width as u32;

        let status_a1 = driver.read_bytes(NvDevice::A, &mut self.a1[..width], addr);
        let status_a2 = driver.read_bytes(NvDevice::A, &mut self.a2[..width], addr + w);
        let status_b1 = driver.read_bytes(NvDevice::B, &mut self.b1[..width], addr);
        let status_b2 = driver.read_bytes(NvDevice::B, &mut self.b2[..width], addr + w);

        let a_matches = self.a1[..width] == self.a2[..width];
        let b_matches = self.b1[..width] == self.b2[..width];

        let confidence = if a_matches && b_matches {
            if self.a1[..width] == self.b1[..width] {
                self.result[..width].copy_from_slice(&self.a1[..width]);
                Confidence::High
            } else {
                let a_ok = status_a1.is_success() && status_a2.is_success();
                let b_ok = status_b1.is_success() && status_b2.is_success();
                let is_tie = a_ok == b_ok;

                let prefer_a = if !is_tie {
                    a_ok
                } else {
                    longest_same_byte_run(&self.a1[..width]) <= longest_same_byte_run(&self.b1[..width])
                };

                let (winner_run, loser_location) = if prefer_a {
                    self.result[..width].copy_from_slice(&self.a1[..width]);
                    (longest_same_byte_run(&self.a1[..width]), LogLocation::NvB)
                } else {
                    self.result[..width].copy_from_slice(&self.b1[..width]);
                    (longest_same_byte_run(&self.b1[..width]), LogLocation::NvA)
                };

                log.log(loser_location, LogCode::InconsistentData, false);
                if is_tie && width > 2 && winner_run == width {
                    log.log(loser_location, LogCode::AllSameVal, false);
                }

                Confidence::Low
            }
        } else if a_matches != b_matches {
            let (good, bad_location) = if a_matches {
                (&self.a1[..width], LogLocation::NvB)
            } else {
                (&self.b1[..width], LogLocation::NvA)
            };
            self.result[..width].copy_from_slice(good);
            log.log(bad_location, LogCode::InconsistentData, false);
            Confidence::Low
        } else {
            let candidates = [
                (status_a1, &self.a1, status_b1, &self.b1),
                (status_a1, &self.a1, status_b2, &self.b2),
                (status_a2, &self.a2, status_b1, &self.b1),
                (status_a2, &self.a2, status_b2, &self.b2),
            ];

            let mut cross_matched = false;
            for (xs, x, ys, y) in candidates {
                if xs.is_success() && ys.is_success() && x[..width] == y[..width] {
                    self.result[..width].copy_from_slice(&x[..width]);
                    cross_matched = true;
                    break;
                }
            }

            if cross_matched {
                Confidence::High
            } else {
                self.result[..width].copy_from_slice(&self.a1[..width]);
                log.log(LogLocation::RaidVoter, LogCode::BadData, true);
                Confidence::Failed
            }
        };

        (&self.result[..width], confidence)
    }
}

impl Default for RaidVoter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_run_empty_is_zero() {
        assert_eq!(longest_same_byte_run(&[]), 0);
    }

    #[test]
    fn longest_run_all_identical_equals_len() {
        assert_eq!(longest_same_byte_run(&[7, 7, 7, 7]), 4);
    }

    #[test]
    fn longest_run_mixed() {
        assert_eq!(longest_same_byte_run(&[1, 2, 2, 3, 3, 3, 1]), 3);
    }
}
