//! Shared types for the door controller

use serde::{Deserialize, Serialize};

/// Newtype wrapper for GPIO pin numbers (BCM numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PinId(pub u32);

impl std::fmt::Display for PinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Electrical level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::High => "HIGH",
        }
    }

    /// Level seen on a pulled-up reed input: magnet present pulls it to ground
    #[inline]
    pub fn is_active(self) -> bool {
        self == Level::Low
    }

    #[inline]
    pub fn from_active(active: bool) -> Self {
        if active {
            Level::Low
        } else {
            Level::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "in",
            Direction::Output => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
}

/// Discrete door position derived from the sensor ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorPosition {
    Closed,
    Ajar,
    PartiallyOpen,
    Open,
    /// No recognized sensor pattern (door travelling or sensors miswired)
    Indeterminate,
}

impl DoorPosition {
    /// Positions a door passes through, from fully closed to fully open
    pub const TRAVEL_ORDER: [DoorPosition; 4] =
        [DoorPosition::Closed, DoorPosition::Ajar, DoorPosition::PartiallyOpen, DoorPosition::Open];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoorPosition::Closed => "Closed",
            DoorPosition::Ajar => "Ajar",
            DoorPosition::PartiallyOpen => "Partially Open",
            DoorPosition::Open => "Open",
            DoorPosition::Indeterminate => "Indeterminate",
        }
    }

    /// Index in [`Self::TRAVEL_ORDER`]. An unrecognized position ranks with `Open`
    /// so that travel from it always closes.
    pub fn travel_rank(&self) -> usize {
        match self {
            DoorPosition::Closed => 0,
            DoorPosition::Ajar => 1,
            DoorPosition::PartiallyOpen => 2,
            DoorPosition::Open | DoorPosition::Indeterminate => 3,
        }
    }
}

impl std::fmt::Display for DoorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered sensor pins, index 0 nearest the closed end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTopology {
    pins: Vec<PinId>,
}

impl SensorTopology {
    pub fn new(pins: Vec<PinId>) -> Self {
        Self { pins }
    }

    pub fn pins(&self) -> &[PinId] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// One reading of every sensor in topology order; `true` means a magnet is present
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SensorVector(pub Vec<bool>);

impl SensorVector {
    pub fn from_levels(levels: &[Level]) -> Self {
        Self(levels.iter().map(|l| l.is_active()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }
}

impl std::fmt::Display for SensorVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &active in &self.0 {
            f.write_str(if active { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Failure of the digital I/O backend
#[derive(Debug)]
pub enum HardwareIoError {
    /// Pin could not be exported or its direction set
    Configure { pin: PinId, source: std::io::Error },
    Read { pin: PinId, source: std::io::Error },
    Write { pin: PinId, source: std::io::Error },
    /// Backend returned something that is not a logic level
    InvalidLevel { pin: PinId, raw: String },
}

impl HardwareIoError {
    pub fn pin(&self) -> PinId {
        match self {
            Self::Configure { pin, .. }
            | Self::Read { pin, .. }
            | Self::Write { pin, .. }
            | Self::InvalidLevel { pin, .. } => *pin,
        }
    }
}

impl std::fmt::Display for HardwareIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configure { pin, source } => write!(f, "configure pin {pin}: {source}"),
            Self::Read { pin, source } => write!(f, "read pin {pin}: {source}"),
            Self::Write { pin, source } => write!(f, "write pin {pin}: {source}"),
            Self::InvalidLevel { pin, raw } => write!(f, "pin {pin} reported invalid level {raw:?}"),
        }
    }
}

impl std::error::Error for HardwareIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configure { source, .. } | Self::Read { source, .. } | Self::Write { source, .. } => {
                Some(source)
            }
            Self::InvalidLevel { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_activity_is_active_low() {
        assert!(Level::Low.is_active());
        assert!(!Level::High.is_active());
        assert_eq!(Level::from_active(true), Level::Low);
        assert_eq!(Level::from_active(false), Level::High);
    }

    #[test]
    fn test_sensor_vector_from_levels() {
        let v = SensorVector::from_levels(&[Level::High, Level::Low, Level::Low, Level::Low]);
        assert_eq!(v.bits(), &[false, true, true, true]);
        assert_eq!(v.to_string(), "0111");
    }

    #[test]
    fn test_door_position_labels() {
        assert_eq!(DoorPosition::PartiallyOpen.as_str(), "Partially Open");
        assert_eq!(DoorPosition::Indeterminate.to_string(), "Indeterminate");
        assert_eq!(DoorPosition::Indeterminate.travel_rank(), DoorPosition::Open.travel_rank());
    }

    #[test]
    fn test_hardware_error_display_names_pin() {
        let err = HardwareIoError::Write {
            pin: PinId(17),
            source: std::io::Error::new(std::io::ErrorKind::Other, "bus fault"),
        };
        assert_eq!(err.pin(), PinId(17));
        assert_eq!(err.to_string(), "write pin 17: bus fault");
    }
}
