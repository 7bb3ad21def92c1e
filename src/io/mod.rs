//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `gpio` - digital I/O backend trait
//! - `sysfs` - Linux sysfs GPIO backend
//! - `emulated` - in-memory GPIO backend and shared sensor store
//! - `event_log` - append-only door event sink
//! - `http_api` - door status / toggle / log HTTP endpoint

pub mod emulated;
pub mod event_log;
pub mod gpio;
pub mod http_api;
pub mod sysfs;

// Re-export commonly used types
pub use emulated::{EmulatedGpio, SensorStore};
pub use event_log::{EventSink, FileEventSink, MemoryEventSink};
pub use gpio::DigitalIo;
pub use http_api::{start_api_server, ApiState};
pub use sysfs::SysfsGpio;
