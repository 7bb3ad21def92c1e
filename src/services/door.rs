//! Door controller - wires the GPIO backend, position reader, actuator and
//! transition monitor for one door.

use crate::domain::types::{Direction, DoorPosition, HardwareIoError, Level, Pull};
use crate::infra::config::{Config, GpioBackend};
use crate::io::emulated::EmulatedGpio;
use crate::io::event_log::EventSink;
use crate::io::gpio::DigitalIo;
use crate::io::sysfs::SysfsGpio;
use crate::services::actuator::{Actuator, PulseResult};
use crate::services::monitor::TransitionMonitor;
use crate::services::position::PositionReader;
use crate::services::travel::{TravelEmulator, TravelTiming};
use std::sync::Arc;
use tracing::{error, info};

pub struct DoorController {
    io: Arc<dyn DigitalIo>,
    reader: Arc<PositionReader>,
    actuator: Actuator,
    monitor: TransitionMonitor,
}

impl DoorController {
    /// Build a controller for the backend selected in the config
    pub fn from_config(config: &Config, sink: Arc<dyn EventSink>) -> Self {
        match config.gpio_backend() {
            GpioBackend::Emulated => Self::emulated(config, Arc::new(EmulatedGpio::new()), sink),
            GpioBackend::Sysfs => {
                Self::with_backend(config, Arc::new(SysfsGpio::new(config.sysfs_root())), sink)
            }
        }
    }

    /// Controller on the emulated backend, with simulated travel after each toggle
    pub fn emulated(config: &Config, gpio: Arc<EmulatedGpio>, sink: Arc<dyn EventSink>) -> Self {
        let travel = TravelEmulator::new(
            gpio.store(),
            config.topology().clone(),
            config.decode_table().clone(),
            TravelTiming {
                start_delay: config.travel_start_delay(),
                step_delay: config.travel_step_delay(),
                settle: config.travel_settle(),
            },
        );
        Self::build(config, gpio, sink, Some(travel))
    }

    /// Controller on any backend, without simulated travel
    pub fn with_backend(config: &Config, io: Arc<dyn DigitalIo>, sink: Arc<dyn EventSink>) -> Self {
        Self::build(config, io, sink, None)
    }

    fn build(
        config: &Config,
        io: Arc<dyn DigitalIo>,
        sink: Arc<dyn EventSink>,
        travel: Option<TravelEmulator>,
    ) -> Self {
        let reader = Arc::new(PositionReader::new(
            io.clone(),
            config.topology().clone(),
            config.decode_table().clone(),
        ));
        let mut actuator =
            Actuator::new(io.clone(), config.relay_pin(), config.relay_hold(), reader.clone(), sink.clone());
        if let Some(travel) = travel {
            actuator = actuator.with_travel(travel);
        }
        let monitor =
            TransitionMonitor::new(reader.clone(), sink, config.poll_interval(), config.stop_timeout());
        Self { io, reader, actuator, monitor }
    }

    /// Configure the pins, make sure the relay is released, start the monitor.
    ///
    /// Blocks on the sysfs backend while freshly exported pins settle. Must be
    /// called inside a tokio runtime.
    pub fn setup(&self) -> Result<(), HardwareIoError> {
        let relay = self.actuator.relay_pin();
        self.io.configure(relay, Direction::Output, Pull::None)?;
        for &pin in self.reader.topology().pins() {
            self.io.configure(pin, Direction::Input, Pull::Up)?;
        }
        self.io.write(relay, Level::Low)?;
        info!(
            relay_pin = %relay,
            sensor_pins = ?self.reader.topology().pins(),
            "door_gpio_configured"
        );

        self.monitor.start()
    }

    pub fn status(&self) -> Result<DoorPosition, HardwareIoError> {
        self.reader.position()
    }

    pub async fn toggle(&self) -> Result<PulseResult, HardwareIoError> {
        self.actuator.toggle().await
    }

    pub fn monitor(&self) -> &TransitionMonitor {
        &self.monitor
    }

    /// Stop the monitor, release the relay and the pins
    pub async fn shutdown(&self) {
        self.monitor.stop().await;

        let relay = self.actuator.relay_pin();
        if let Err(e) = self.io.write(relay, Level::Low) {
            error!(pin = %relay, error = %e, "relay_release_failed");
        }

        let mut pins = vec![relay];
        pins.extend_from_slice(self.reader.topology().pins());
        if let Err(e) = self.io.cleanup(&pins) {
            error!(error = %e, "gpio_cleanup_failed");
        }
        info!("door_controller_shutdown");
    }
}
