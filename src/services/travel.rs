//! Simulated door travel for the emulated GPIO backend
//!
//! After a relay pulse the emulator walks the sensor store through every
//! recognized position between the pre-toggle position and the end of travel,
//! one timed step at a time. Each step writes the full pattern of its target
//! position under one store lock.
//!
//! Opening walks Closed → Ajar → Partially Open → Open; closing walks the
//! reverse. Positions the decode table does not list are skipped, so a
//! single-sensor door travels in one step.

use crate::domain::decode::DecodeTable;
use crate::domain::types::{DoorPosition, Level, PinId, SensorTopology};
use crate::io::emulated::SensorStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelDirection {
    Opening,
    Closing,
}

impl TravelDirection {
    /// A door short of partially open opens on a pulse; anything else closes
    pub fn from_position(position: DoorPosition) -> Self {
        match position {
            DoorPosition::Closed | DoorPosition::Ajar => TravelDirection::Opening,
            _ => TravelDirection::Closing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelDirection::Opening => "opening",
            TravelDirection::Closing => "closing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelTiming {
    pub start_delay: Duration,
    pub step_delay: Duration,
    pub settle: Duration,
}

/// One timed sensor mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelStep {
    /// Position the sensors show once this step is applied
    pub position: DoorPosition,
    pub updates: Vec<(PinId, Level)>,
}

#[derive(Clone)]
pub struct TravelEmulator {
    store: Arc<SensorStore>,
    topology: SensorTopology,
    table: DecodeTable,
    timing: TravelTiming,
}

impl TravelEmulator {
    pub fn new(
        store: Arc<SensorStore>,
        topology: SensorTopology,
        table: DecodeTable,
        timing: TravelTiming,
    ) -> Self {
        Self { store, topology, table, timing }
    }

    /// Sensor mutations that take the door from `from` to the end of travel
    pub fn plan(&self, from: DoorPosition) -> Vec<TravelStep> {
        let rank = from.travel_rank();
        let targets: Vec<DoorPosition> = match TravelDirection::from_position(from) {
            TravelDirection::Opening => DoorPosition::TRAVEL_ORDER[rank + 1..].to_vec(),
            TravelDirection::Closing => DoorPosition::TRAVEL_ORDER[..rank].iter().rev().copied().collect(),
        };

        targets
            .into_iter()
            .filter_map(|position| {
                let pattern = self.table.pattern_for(position)?;
                let updates = self
                    .topology
                    .pins()
                    .iter()
                    .zip(pattern.bits())
                    .map(|(&pin, &active)| (pin, Level::from_active(active)))
                    .collect();
                Some(TravelStep { position, updates })
            })
            .collect()
    }

    /// Run the travel to completion
    pub async fn simulate(&self, from: DoorPosition) {
        let direction = TravelDirection::from_position(from);
        let steps = self.plan(from);
        info!(
            from = %from.as_str(),
            direction = %direction.as_str(),
            steps = %steps.len(),
            "travel_started"
        );

        if !self.timing.start_delay.is_zero() {
            tokio::time::sleep(self.timing.start_delay).await;
        }

        let total = steps.len();
        for (i, step) in steps.into_iter().enumerate() {
            tokio::time::sleep(self.timing.step_delay).await;
            self.store.apply(&step.updates);
            info!(
                step = %(i + 1),
                total = %total,
                position = %step.position.as_str(),
                "travel_step"
            );
        }

        if !self.timing.settle.is_zero() {
            debug!(settle_ms = %self.timing.settle.as_millis(), "travel_settling");
            tokio::time::sleep(self.timing.settle).await;
        }
        info!(direction = %direction.as_str(), "travel_complete");
    }

    /// Start travel as a detached task. The caller is free to drop the handle.
    pub fn launch(&self, from: DoorPosition) -> JoinHandle<()> {
        let emulator = self.clone();
        tokio::spawn(async move { emulator.simulate(from).await })
    }
}
