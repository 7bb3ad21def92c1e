//! Domain models - door positions, sensor snapshots and decoding
//!
//! This module contains the canonical data types used throughout the system:
//! - `DoorPosition` - discrete position reported to users and the event log
//! - `SensorTopology` / `SensorVector` - sensor pins and one reading of them
//! - `DecodeTable` - ordered pattern → position mapping
//! - `HardwareIoError` - digital I/O backend failure

pub mod decode;
pub mod types;

pub use decode::{decode, DecodeEntry, DecodeTable, DecodeTableError};
pub use types::{
    Direction, DoorPosition, HardwareIoError, Level, PinId, Pull, SensorTopology, SensorVector,
};
