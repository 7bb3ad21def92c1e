//! Services - door logic and state management
//!
//! This module contains the core door services:
//! - `position` - sensor snapshot and decode
//! - `actuator` - relay pulse with guaranteed release
//! - `travel` - simulated door travel for the emulated backend
//! - `monitor` - background transition monitor
//! - `door` - controller wiring the above together

pub mod actuator;
pub mod door;
pub mod monitor;
pub mod position;
pub mod travel;

// Re-export commonly used types
pub use actuator::{Actuator, PulseResult};
pub use door::DoorController;
pub use monitor::TransitionMonitor;
pub use position::PositionReader;
pub use travel::{TravelDirection, TravelEmulator};
