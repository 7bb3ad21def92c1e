//! Digital I/O backend interface
//!
//! The door logic only ever talks to pins through [`DigitalIo`]. Two
//! implementations exist: [`SysfsGpio`](super::sysfs::SysfsGpio) for real
//! hardware and [`EmulatedGpio`](super::emulated::EmulatedGpio) for running
//! without a board.

use crate::domain::types::{Direction, HardwareIoError, Level, PinId, Pull};

pub trait DigitalIo: Send + Sync {
    fn configure(&self, pin: PinId, direction: Direction, pull: Pull) -> Result<(), HardwareIoError>;

    fn read(&self, pin: PinId) -> Result<Level, HardwareIoError>;

    fn write(&self, pin: PinId, level: Level) -> Result<(), HardwareIoError>;

    /// Read several pins as one snapshot.
    ///
    /// Backends with shared in-process state override this to hold a single
    /// lock across all reads.
    fn read_all(&self, pins: &[PinId]) -> Result<Vec<Level>, HardwareIoError> {
        pins.iter().map(|&pin| self.read(pin)).collect()
    }

    /// Release pins at shutdown
    fn cleanup(&self, _pins: &[PinId]) -> Result<(), HardwareIoError> {
        Ok(())
    }
}
