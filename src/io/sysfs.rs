//! Linux sysfs GPIO backend
//!
//! Layout under the root directory (normally `/sys/class/gpio`):
//! - `export` / `unexport` - write a pin number to claim / release it
//! - `gpio<N>/direction` - `in` or `out`
//! - `gpio<N>/value` - `0` or `1`
//!
//! Pull resistors cannot be set through sysfs; the reed inputs rely on the
//! board's pull-up configuration.

use crate::domain::types::{Direction, HardwareIoError, Level, PinId, Pull};
use crate::io::gpio::DigitalIo;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// udev needs a moment to fix permissions on a freshly exported pin
const EXPORT_SETTLE: Duration = Duration::from_millis(50);

pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        info!(root = %root.display(), "gpio_sysfs_initialized");
        Self { root }
    }

    fn pin_dir(&self, pin: PinId) -> PathBuf {
        self.root.join(format!("gpio{}", pin.0))
    }

    /// Claim the pin. A fresh export sleeps the calling thread for
    /// `EXPORT_SETTLE`; async callers should configure pins from a blocking
    /// context.
    fn export(&self, pin: PinId) -> std::io::Result<()> {
        if self.pin_dir(pin).exists() {
            return Ok(());
        }
        fs::write(self.root.join("export"), pin.0.to_string())?;
        std::thread::sleep(EXPORT_SETTLE);
        debug!(pin = %pin, "gpio_sysfs_exported");
        Ok(())
    }
}

impl DigitalIo for SysfsGpio {
    fn configure(&self, pin: PinId, direction: Direction, pull: Pull) -> Result<(), HardwareIoError> {
        self.export(pin).map_err(|source| HardwareIoError::Configure { pin, source })?;

        // Writing "low" sets an output's direction and level in one step
        let dir = match direction {
            Direction::Input => "in",
            Direction::Output => "low",
        };
        fs::write(self.pin_dir(pin).join("direction"), dir)
            .map_err(|source| HardwareIoError::Configure { pin, source })?;

        if pull == Pull::Up {
            debug!(pin = %pin, "gpio_sysfs_pull_up_from_board_config");
        }
        info!(pin = %pin, direction = %direction.as_str(), "gpio_sysfs_configured");
        Ok(())
    }

    fn read(&self, pin: PinId) -> Result<Level, HardwareIoError> {
        let raw = fs::read_to_string(self.pin_dir(pin).join("value"))
            .map_err(|source| HardwareIoError::Read { pin, source })?;
        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(HardwareIoError::InvalidLevel { pin, raw: other.to_string() }),
        }
    }

    fn write(&self, pin: PinId, level: Level) -> Result<(), HardwareIoError> {
        let value = match level {
            Level::Low => "0",
            Level::High => "1",
        };
        fs::write(self.pin_dir(pin).join("value"), value)
            .map_err(|source| HardwareIoError::Write { pin, source })?;
        debug!(pin = %pin, level = %level.as_str(), "gpio_sysfs_write");
        Ok(())
    }

    fn cleanup(&self, pins: &[PinId]) -> Result<(), HardwareIoError> {
        for &pin in pins {
            if !self.pin_dir(pin).exists() {
                continue;
            }
            if let Err(e) = fs::write(self.root.join("unexport"), pin.0.to_string()) {
                // Keep releasing the remaining pins
                warn!(pin = %pin, error = %e, "gpio_sysfs_unexport_failed");
            }
        }
        info!(pins = ?pins, "gpio_sysfs_cleanup");
        Ok(())
    }
}
