//! The NV bus driver contract this crate consumes. The actual serial-bus
//! implementation (SPI timing, chip-select toggling) lives outside this
//! crate; we only depend on this trait.

/// One of the two non-volatile devices sharing the serial bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvDevice {
    A,
    B,
}

/// Outcome of a single NV bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    Success,
    Failure,
}

impl DriverStatus {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Byte-addressed read/write over the shared serial bus to NV-A and NV-B.
/// Implemented by the low-level SPI driver; this crate only calls it.
pub trait NvDriver {
    fn read_bytes(&mut self, device: NvDevice, dst: &mut [u8], addr: u32) -> DriverStatus;
    fn write_bytes(&mut self, device: NvDevice, src: &[u8], addr: u32) -> DriverStatus;
}
