//! An in-memory stand-in for the real NV bus driver, used by this crate's
//! own unit tests and by the fault-injection integration tests. Not part
//! of the flight build's external contract.

use crate::constants::ERROR_LOG;
use crate::driver::{DriverStatus, NvDevice, NvDriver};

/// Large enough to back every address in the map, including both copies
/// of the full error-log extent (the RAID voter writes copy-B at
/// `addr + width`).
pub const NV_SIZE: usize = ERROR_LOG.addr as usize + 2 * ERROR_LOG.width;

/// Two independent byte arrays standing in for NV-A and NV-B, with
/// injectable per-byte corruption and whole-device failure.
pub struct MockDriver {
    nv_a: [u8; NV_SIZE],
    nv_b: [u8; NV_SIZE],
    dead: [bool; 2],
}

impl MockDriver {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nv_a: [0u8; NV_SIZE],
            nv_b: [0u8; NV_SIZE],
            dead: [false, false],
        }
    }

    fn backing(&mut self, device: NvDevice) -> &mut [u8; NV_SIZE] {
        match device {
            NvDevice::A => &mut self.nv_a,
            NvDevice::B => &mut self.nv_b,
        }
    }

    /// Overwrites a single byte directly, bypassing `write_bytes`; models
    /// a radiation-induced single-event upset striking NV after the fact.
    pub fn corrupt_byte(&mut self, device: NvDevice, addr: u32, value: u8) {
        let backing = self.backing(device);
        backing[addr as usize] = value;
    }

    /// Marks a whole device dead: every read returns `0xFF` bytes with a
    /// failure status, regardless of what was previously written.
    pub fn kill_device(&mut self, device: NvDevice) {
        self.dead[device_index(device)] = true;
    }

    fn is_dead(&self, device: NvDevice) -> bool {
        self.dead[device_index(device)]
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn device_index(device: NvDevice) -> usize {
    match device {
        NvDevice::A => 0,
        NvDevice::B => 1,
    }
}

impl NvDriver for MockDriver {
    fn read_bytes(&mut self, device: NvDevice, dst: &mut [u8], addr: u32) -> DriverStatus {
        if self.is_dead(device) {
            dst.fill(0xFF);
            return DriverStatus::Failure;
        }

        let backing = self.backing(device);
        let start = addr as usize;
        dst.copy_from_slice(&backing[start..start + dst.len()]);
        DriverStatus::Success
    }

    fn write_bytes(&mut self, device: NvDevice, src: &[u8], addr: u32) -> DriverStatus {
        if self.is_dead(device) {
            return DriverStatus::Failure;
        }

        let backing = self.backing(device);
        let start = addr as usize;
        backing[start..start + src.len()].copy_from_slice(src);
        DriverStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut driver = MockDriver::new();
        let payload = [1, 2, 3, 4];
        assert_eq!(
            driver.write_bytes(NvDevice::A, &payload, 100),
            DriverStatus::Success
        );

        let mut out = [0u8; 4];
        assert_eq!(
            driver.read_bytes(NvDevice::A, &mut out, 100),
            DriverStatus::Success
        );
        assert_eq!(out, payload);
    }

    #[test]
    fn dead_device_reads_fail() {
        let mut driver = MockDriver::new();
        driver.kill_device(NvDevice::B);

        let mut out = [0u8; 4];
        let status = driver.read_bytes(NvDevice::B, &mut out, 0);
        assert_eq!(status, DriverStatus::Failure);
        assert_eq!(out, [0xFF; 4]);
    }

    #[test]
    fn corrupt_byte_is_visible_on_next_read() {
        let mut driver = MockDriver::new();
        driver.write_bytes(NvDevice::A, &[1, 2, 3, 4], 200);
        driver.corrupt_byte(NvDevice::A, 200, 0xAA);

        let mut out = [0u8; 4];
        driver.read_bytes(NvDevice::A, &mut out, 200);
        assert_eq!(out, [0xAA, 2, 3, 4]);
    }
}
