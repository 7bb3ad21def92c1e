//! In-memory GPIO backend
//!
//! Pin levels live in a [`SensorStore`] shared with the travel emulator.
//! Every pin starts LOW, which on the reed-switch ladder reads as a fully
//! closed door. All access goes through one `RwLock`, so a multi-pin read
//! never observes a half-applied travel step.

use crate::domain::types::{Direction, HardwareIoError, Level, PinId, Pull};
use crate::io::gpio::DigitalIo;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Pin → level map shared between the emulated backend and the travel emulator
#[derive(Debug, Default)]
pub struct SensorStore {
    levels: RwLock<HashMap<PinId, Level>>,
}

impl SensorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown pins read LOW
    pub fn get(&self, pin: PinId) -> Level {
        self.levels.read().get(&pin).copied().unwrap_or(Level::Low)
    }

    pub fn set(&self, pin: PinId, level: Level) {
        self.levels.write().insert(pin, level);
    }

    /// Read `pins` under one lock acquisition
    pub fn snapshot(&self, pins: &[PinId]) -> Vec<Level> {
        let levels = self.levels.read();
        pins.iter().map(|pin| levels.get(pin).copied().unwrap_or(Level::Low)).collect()
    }

    /// Write several pins under one lock acquisition
    pub fn apply(&self, updates: &[(PinId, Level)]) {
        let mut levels = self.levels.write();
        for &(pin, level) in updates {
            levels.insert(pin, level);
        }
    }

    /// Initialize a pin without overriding a level that was already forced
    fn init(&self, pin: PinId) {
        self.levels.write().entry(pin).or_insert(Level::Low);
    }

    pub fn clear(&self) {
        self.levels.write().clear();
    }
}

/// Emulated digital I/O
pub struct EmulatedGpio {
    store: Arc<SensorStore>,
}

impl EmulatedGpio {
    pub fn new() -> Self {
        Self::with_store(Arc::new(SensorStore::new()))
    }

    pub fn with_store(store: Arc<SensorStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<SensorStore> {
        self.store.clone()
    }

    /// Test hook: set a pin as if the outside world changed it
    pub fn force(&self, pin: PinId, level: Level) {
        info!(pin = %pin, level = %level.as_str(), "gpio_emulated_force");
        self.store.set(pin, level);
    }
}

impl Default for EmulatedGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalIo for EmulatedGpio {
    fn configure(&self, pin: PinId, direction: Direction, pull: Pull) -> Result<(), HardwareIoError> {
        info!(
            pin = %pin,
            direction = %direction.as_str(),
            pull_up = %(pull == Pull::Up),
            "gpio_emulated_configure"
        );
        self.store.init(pin);
        Ok(())
    }

    fn read(&self, pin: PinId) -> Result<Level, HardwareIoError> {
        Ok(self.store.get(pin))
    }

    fn write(&self, pin: PinId, level: Level) -> Result<(), HardwareIoError> {
        info!(pin = %pin, level = %level.as_str(), "gpio_emulated_write");
        self.store.set(pin, level);
        Ok(())
    }

    fn read_all(&self, pins: &[PinId]) -> Result<Vec<Level>, HardwareIoError> {
        Ok(self.store.snapshot(pins))
    }

    fn cleanup(&self, pins: &[PinId]) -> Result<(), HardwareIoError> {
        debug!(pins = ?pins, "gpio_emulated_cleanup");
        self.store.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_pins_read_low() {
        let gpio = EmulatedGpio::new();
        assert_eq!(gpio.read(PinId(27)).unwrap(), Level::Low);
    }

    #[test]
    fn test_write_then_read() {
        let gpio = EmulatedGpio::new();
        gpio.configure(PinId(17), Direction::Output, Pull::None).unwrap();
        gpio.write(PinId(17), Level::High).unwrap();
        assert_eq!(gpio.read(PinId(17)).unwrap(), Level::High);
    }

    #[test]
    fn test_configure_keeps_forced_level() {
        let gpio = EmulatedGpio::new();
        gpio.force(PinId(27), Level::High);
        gpio.configure(PinId(27), Direction::Input, Pull::Up).unwrap();
        assert_eq!(gpio.read(PinId(27)).unwrap(), Level::High);
    }

    #[test]
    fn test_store_is_shared() {
        let store = Arc::new(SensorStore::new());
        let gpio = EmulatedGpio::with_store(store.clone());
        store.apply(&[(PinId(27), Level::High), (PinId(22), Level::High)]);
        let levels = gpio.read_all(&[PinId(27), PinId(22), PinId(23)]).unwrap();
        assert_eq!(levels, vec![Level::High, Level::High, Level::Low]);
    }

    #[test]
    fn test_cleanup_clears_levels() {
        let gpio = EmulatedGpio::new();
        gpio.force(PinId(24), Level::High);
        gpio.cleanup(&[PinId(24)]).unwrap();
        assert_eq!(gpio.read(PinId(24)).unwrap(), Level::Low);
    }

    #[test]
    fn test_snapshot_concurrent_with_writer() {
        // A writer flips two pins together; readers must never see them differ
        let store = Arc::new(SensorStore::new());
        let pins = [PinId(1), PinId(2)];
        let writer_store = store.clone();
        let writer = std::thread::spawn(move || {
            for i in 0..10_000 {
                let level = if i % 2 == 0 { Level::High } else { Level::Low };
                writer_store.apply(&[(PinId(1), level), (PinId(2), level)]);
            }
        });
        for _ in 0..10_000 {
            let snap = store.snapshot(&pins);
            assert_eq!(snap[0], snap[1]);
        }
        writer.join().unwrap();
    }
}
