//! Door position reading
//!
//! Reads every sensor of the topology as one snapshot and decodes it.

use crate::domain::decode::{decode, DecodeTable};
use crate::domain::types::{DoorPosition, HardwareIoError, SensorTopology, SensorVector};
use crate::io::gpio::DigitalIo;
use std::sync::Arc;

pub struct PositionReader {
    io: Arc<dyn DigitalIo>,
    topology: SensorTopology,
    table: DecodeTable,
}

impl PositionReader {
    pub fn new(io: Arc<dyn DigitalIo>, topology: SensorTopology, table: DecodeTable) -> Self {
        Self { io, topology, table }
    }

    pub fn topology(&self) -> &SensorTopology {
        &self.topology
    }

    pub fn table(&self) -> &DecodeTable {
        &self.table
    }

    pub fn snapshot(&self) -> Result<SensorVector, HardwareIoError> {
        let levels = self.io.read_all(self.topology.pins())?;
        Ok(SensorVector::from_levels(&levels))
    }

    pub fn position(&self) -> Result<DoorPosition, HardwareIoError> {
        let vector = self.snapshot()?;
        let position = decode(&vector, &self.table);
        tracing::trace!(sensors = %vector, position = %position.as_str(), "door_position_read");
        Ok(position)
    }
}
