//! Infrastructure - configuration and logging setup
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `logging` - tracing subscriber setup shared by the binaries

pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::{Config, GpioBackend};
