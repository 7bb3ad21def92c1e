//! Sensor pattern decoding
//!
//! A [`DecodeTable`] is an ordered list of exact sensor patterns, each mapped to
//! a door position. Lookup is a linear scan that stops at the first equal
//! pattern; any vector not listed decodes to [`DoorPosition::Indeterminate`].

use crate::domain::types::{DoorPosition, SensorVector};

/// One recognized sensor combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeEntry {
    pub pattern: SensorVector,
    pub position: DoorPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeTableError {
    /// Topology has no sensors
    Empty,
    /// Pattern length differs from the number of sensors
    WidthMismatch { index: usize, expected: usize, actual: usize },
    /// The same pattern is listed twice (the second entry would never match)
    DuplicatePattern { index: usize, pattern: String },
}

impl std::fmt::Display for DecodeTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "decode table needs at least one sensor"),
            Self::WidthMismatch { index, expected, actual } => write!(
                f,
                "decode entry {index} has {actual} sensor bits, topology has {expected}"
            ),
            Self::DuplicatePattern { index, pattern } => {
                write!(f, "decode entry {index} repeats pattern {pattern}")
            }
        }
    }
}

impl std::error::Error for DecodeTableError {}

/// Ordered pattern → position mapping for a fixed sensor count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeTable {
    width: usize,
    entries: Vec<DecodeEntry>,
}

impl DecodeTable {
    pub fn new(width: usize, entries: Vec<DecodeEntry>) -> Result<Self, DecodeTableError> {
        if width == 0 {
            return Err(DecodeTableError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            if entry.pattern.len() != width {
                return Err(DecodeTableError::WidthMismatch {
                    index,
                    expected: width,
                    actual: entry.pattern.len(),
                });
            }
            if entries[..index].iter().any(|e| e.pattern == entry.pattern) {
                return Err(DecodeTableError::DuplicatePattern {
                    index,
                    pattern: entry.pattern.to_string(),
                });
            }
        }
        Ok(Self { width, entries })
    }

    /// Standard ladder for `width` sensors: sensors clear from the closed end
    /// one at a time, and the topmost sensor stays covered when fully open.
    ///
    /// With a single sensor, covered means closed and clear means open.
    pub fn ladder(width: usize) -> Result<Self, DecodeTableError> {
        if width == 0 {
            return Err(DecodeTableError::Empty);
        }
        if width == 1 {
            return Self::new(
                1,
                vec![
                    DecodeEntry { pattern: SensorVector(vec![true]), position: DoorPosition::Closed },
                    DecodeEntry { pattern: SensorVector(vec![false]), position: DoorPosition::Open },
                ],
            );
        }

        let entries = (0..width)
            .map(|cleared| {
                let position = match cleared {
                    0 => DoorPosition::Closed,
                    c if c == width - 1 => DoorPosition::Open,
                    1 => DoorPosition::Ajar,
                    _ => DoorPosition::PartiallyOpen,
                };
                let pattern = SensorVector((0..width).map(|i| i >= cleared).collect());
                DecodeEntry { pattern, position }
            })
            .collect();
        Self::new(width, entries)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn entries(&self) -> &[DecodeEntry] {
        &self.entries
    }

    /// First pattern listed for `position`, used to drive emulated travel
    pub fn pattern_for(&self, position: DoorPosition) -> Option<&SensorVector> {
        self.entries.iter().find(|e| e.position == position).map(|e| &e.pattern)
    }
}

/// Map a sensor snapshot to a door position. Never fails.
pub fn decode(vector: &SensorVector, table: &DecodeTable) -> DoorPosition {
    table
        .entries
        .iter()
        .find(|entry| entry.pattern == *vector)
        .map_or(DoorPosition::Indeterminate, |entry| entry.position)
}
