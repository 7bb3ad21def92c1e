//! Relay actuation
//!
//! A toggle presses the door opener's button through the relay: drive the
//! relay pin HIGH, hold, drive it LOW. The release always runs, including when
//! the press write fails or the toggle future is dropped mid-hold.

use crate::domain::types::{DoorPosition, HardwareIoError, Level, PinId};
use crate::io::event_log::{EventSink, ACTION_USER_TOGGLE};
use crate::io::gpio::DigitalIo;
use crate::services::position::PositionReader;
use crate::services::travel::{TravelDirection, TravelEmulator};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Outcome of a completed relay pulse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseResult {
    /// Position read just before the relay was energized
    pub from: DoorPosition,
    /// How long the relay was held
    pub held: Duration,
    /// Direction of the simulated travel, when running on the emulator
    pub simulated: Option<TravelDirection>,
}

/// Relay held HIGH until released or dropped
struct RelayPress<'a> {
    io: &'a dyn DigitalIo,
    pin: PinId,
    released: bool,
}

impl<'a> RelayPress<'a> {
    /// Energize the relay. The returned press releases even if energizing failed.
    fn engage(io: &'a dyn DigitalIo, pin: PinId) -> (Self, Result<(), HardwareIoError>) {
        let result = io.write(pin, Level::High);
        (Self { io, pin, released: false }, result)
    }

    fn release(mut self) -> Result<(), HardwareIoError> {
        self.released = true;
        self.io.write(self.pin, Level::Low)
    }
}

impl Drop for RelayPress<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.io.write(self.pin, Level::Low) {
            Ok(()) => warn!(pin = %self.pin, "relay_released_on_drop"),
            Err(e) => error!(pin = %self.pin, error = %e, "relay_release_failed"),
        }
    }
}

pub struct Actuator {
    io: Arc<dyn DigitalIo>,
    relay_pin: PinId,
    hold: Duration,
    reader: Arc<PositionReader>,
    sink: Arc<dyn EventSink>,
    travel: Option<TravelEmulator>,
}

impl Actuator {
    pub fn new(
        io: Arc<dyn DigitalIo>,
        relay_pin: PinId,
        hold: Duration,
        reader: Arc<PositionReader>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self { io, relay_pin, hold, reader, sink, travel: None }
    }

    /// Simulate door travel after each pulse (emulated backend only)
    pub fn with_travel(mut self, travel: TravelEmulator) -> Self {
        self.travel = Some(travel);
        self
    }

    pub fn relay_pin(&self) -> PinId {
        self.relay_pin
    }

    /// Pulse the relay once
    pub async fn toggle(&self) -> Result<PulseResult, HardwareIoError> {
        let from = self.reader.position()?;
        info!(pin = %self.relay_pin, from = %from.as_str(), "relay_pulse_start");

        let start = Instant::now();
        let (press, pressed) = RelayPress::engage(self.io.as_ref(), self.relay_pin);
        if pressed.is_ok() {
            tokio::time::sleep(self.hold).await;
        }
        let released = press.release();
        let held = start.elapsed();

        if let Err(e) = &pressed {
            error!(pin = %self.relay_pin, error = %e, "relay_press_failed");
        }
        if let Err(e) = &released {
            error!(pin = %self.relay_pin, error = %e, "relay_release_failed");
        }
        pressed?;
        released?;

        self.sink.record(ACTION_USER_TOGGLE, &format!("Activating (from {})", from.as_str()));
        info!(pin = %self.relay_pin, held_ms = %held.as_millis(), "relay_pulse_complete");

        let simulated = self.travel.as_ref().map(|travel| {
            // Detached: toggle never waits for travel
            drop(travel.launch(from));
            TravelDirection::from_position(from)
        });

        Ok(PulseResult { from, held, simulated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decode::DecodeTable;
    use crate::domain::types::{Direction, Pull, SensorTopology};
    use crate::io::emulated::EmulatedGpio;
    use crate::io::event_log::MemoryEventSink;
    use parking_lot::Mutex;

    /// Records writes and optionally fails HIGH writes
    #[derive(Default)]
    struct RecordingGpio {
        inner: EmulatedGpio,
        writes: Mutex<Vec<(PinId, Level)>>,
        fail_high: bool,
    }

    impl DigitalIo for RecordingGpio {
        fn configure(&self, pin: PinId, direction: Direction, pull: Pull) -> Result<(), HardwareIoError> {
            self.inner.configure(pin, direction, pull)
        }

        fn read(&self, pin: PinId) -> Result<Level, HardwareIoError> {
            self.inner.read(pin)
        }

        fn write(&self, pin: PinId, level: Level) -> Result<(), HardwareIoError> {
            self.writes.lock().push((pin, level));
            if self.fail_high && level == Level::High {
                return Err(HardwareIoError::Write {
                    pin,
                    source: std::io::Error::new(std::io::ErrorKind::Other, "relay driver fault"),
                });
            }
            self.inner.write(pin, level)
        }
    }

    fn actuator(gpio: Arc<RecordingGpio>, sink: Arc<MemoryEventSink>) -> Actuator {
        let reader = Arc::new(PositionReader::new(
            gpio.clone(),
            SensorTopology::new(vec![PinId(27), PinId(22), PinId(23), PinId(24)]),
            DecodeTable::ladder(4).unwrap(),
        ));
        Actuator::new(gpio, PinId(17), Duration::from_millis(500), reader, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_pulses_and_records() {
        let gpio = Arc::new(RecordingGpio::default());
        let sink = Arc::new(MemoryEventSink::new());
        let actuator = actuator(gpio.clone(), sink.clone());

        let result = actuator.toggle().await.unwrap();

        assert_eq!(result.from, DoorPosition::Closed);
        assert!(result.held >= Duration::from_millis(500));
        assert_eq!(result.simulated, None);
        assert_eq!(*gpio.writes.lock(), vec![(PinId(17), Level::High), (PinId(17), Level::Low)]);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "User Toggle");
        assert_eq!(events[0].state, "Activating (from Closed)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_press_still_releases() {
        let gpio = Arc::new(RecordingGpio { fail_high: true, ..Default::default() });
        let sink = Arc::new(MemoryEventSink::new());
        let actuator = actuator(gpio.clone(), sink.clone());

        let err = actuator.toggle().await.unwrap_err();

        assert!(matches!(err, HardwareIoError::Write { pin: PinId(17), .. }));
        assert_eq!(*gpio.writes.lock(), vec![(PinId(17), Level::High), (PinId(17), Level::Low)]);
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_toggle_releases_relay() {
        let gpio = Arc::new(RecordingGpio::default());
        let sink = Arc::new(MemoryEventSink::new());
        let actuator = actuator(gpio.clone(), sink.clone());

        // Abandon the pulse halfway through the hold
        let outcome =
            tokio::time::timeout(Duration::from_millis(200), actuator.toggle()).await;
        assert!(outcome.is_err());

        assert_eq!(*gpio.writes.lock(), vec![(PinId(17), Level::High), (PinId(17), Level::Low)]);
        assert_eq!(gpio.read(PinId(17)).unwrap(), Level::Low);
        assert!(sink.is_empty());
    }
}
