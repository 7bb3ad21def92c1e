//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::decode::{DecodeEntry, DecodeTable};
use crate::domain::types::{DoorPosition, PinId, SensorTopology, SensorVector};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioBackend {
    /// In-memory pins with simulated door travel
    Emulated,
    /// Linux sysfs GPIO
    Sysfs,
}

impl GpioBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpioBackend::Emulated => "emulated",
            GpioBackend::Sysfs => "sysfs",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpioConfig {
    #[serde(default = "default_backend")]
    pub backend: GpioBackend,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,
    pub relay_pin: u32,
    /// Bottom (closed end) first
    pub sensor_pins: Vec<u32>,
}

fn default_backend() -> GpioBackend {
    GpioBackend::Emulated
}

fn default_sysfs_root() -> String {
    "/sys/class/gpio".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecodeEntryConfig {
    /// Sensor activity in topology order (true = magnet present)
    pub active: Vec<bool>,
    pub position: DoorPosition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { hold_ms: default_hold_ms() }
    }
}

fn default_hold_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { poll_interval_ms: default_poll_interval_ms(), stop_timeout_ms: default_stop_timeout_ms() }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_stop_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TravelConfig {
    /// Delay before the first sensor changes
    #[serde(default)]
    pub start_delay_ms: u64,
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Idle time after the last step before travel counts as finished
    #[serde(default)]
    pub settle_ms: u64,
}

fn default_step_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_events_file")]
    pub file: String,
    /// Default number of lines returned by /api/logs
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { file: default_events_file(), recent_limit: default_recent_limit() }
    }
}

fn default_events_file() -> String {
    "garage_events.log".to_string()
}

fn default_recent_limit() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_bind_address")]
    pub bind_address: String,
    /// HTTP API port (0 to disable)
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { bind_address: default_http_bind_address(), port: default_http_port() }
    }
}

fn default_http_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub gpio: GpioConfig,
    #[serde(default)]
    pub decode: Vec<DecodeEntryConfig>,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub travel: TravelConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    gpio_backend: GpioBackend,
    sysfs_root: String,
    relay_pin: PinId,
    topology: SensorTopology,
    decode_table: DecodeTable,
    relay_hold_ms: u64,
    poll_interval_ms: u64,
    stop_timeout_ms: u64,
    travel_start_delay_ms: u64,
    travel_step_delay_ms: u64,
    travel_settle_ms: u64,
    events_file: String,
    events_recent_limit: usize,
    http_bind_address: String,
    http_port: u16,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        let sensor_pins = vec![PinId(27), PinId(22), PinId(23), PinId(24)];
        let decode_table =
            DecodeTable::ladder(sensor_pins.len()).expect("four-sensor ladder should be valid");
        Self {
            gpio_backend: GpioBackend::Emulated,
            sysfs_root: default_sysfs_root(),
            relay_pin: PinId(17),
            topology: SensorTopology::new(sensor_pins),
            decode_table,
            relay_hold_ms: default_hold_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            travel_start_delay_ms: 0,
            travel_step_delay_ms: default_step_delay_ms(),
            travel_settle_ms: 0,
            events_file: default_events_file(),
            events_recent_limit: default_recent_limit(),
            http_bind_address: default_http_bind_address(),
            http_port: default_http_port(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        // Check for --config argument
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        // Default to dev.toml
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Self::from_toml(toml_config, path.display().to_string())
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn from_toml(toml_config: TomlConfig, config_file: String) -> anyhow::Result<Self> {
        let sensor_pins: Vec<PinId> = toml_config.gpio.sensor_pins.into_iter().map(PinId).collect();
        let relay_pin = PinId(toml_config.gpio.relay_pin);
        if sensor_pins.contains(&relay_pin) {
            anyhow::bail!("relay pin {} is also listed as a sensor pin", relay_pin);
        }
        for (i, pin) in sensor_pins.iter().enumerate() {
            if sensor_pins[..i].contains(pin) {
                anyhow::bail!("sensor pin {} is listed more than once", pin);
            }
        }

        let decode_table = if toml_config.decode.is_empty() {
            DecodeTable::ladder(sensor_pins.len())?
        } else {
            let entries = toml_config
                .decode
                .into_iter()
                .map(|e| DecodeEntry { pattern: SensorVector(e.active), position: e.position })
                .collect();
            DecodeTable::new(sensor_pins.len(), entries)?
        };

        if toml_config.monitor.poll_interval_ms == 0 {
            anyhow::bail!("monitor.poll_interval_ms must be greater than zero");
        }

        Ok(Self {
            gpio_backend: toml_config.gpio.backend,
            sysfs_root: toml_config.gpio.sysfs_root,
            relay_pin,
            topology: SensorTopology::new(sensor_pins),
            decode_table,
            relay_hold_ms: toml_config.relay.hold_ms,
            poll_interval_ms: toml_config.monitor.poll_interval_ms,
            stop_timeout_ms: toml_config.monitor.stop_timeout_ms,
            travel_start_delay_ms: toml_config.travel.start_delay_ms,
            travel_step_delay_ms: toml_config.travel.step_delay_ms,
            travel_settle_ms: toml_config.travel.settle_ms,
            events_file: toml_config.events.file,
            events_recent_limit: toml_config.events.recent_limit,
            http_bind_address: toml_config.http.bind_address,
            http_port: toml_config.http.port,
            config_file,
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load(args: &[String]) -> Self {
        Self::load_from_path(&Self::resolve_config_path(args))
    }

    /// Load configuration from an explicit path, falling back to defaults
    pub fn load_from_path(config_path: &str) -> Self {
        match Self::from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn gpio_backend(&self) -> GpioBackend {
        self.gpio_backend
    }

    pub fn sysfs_root(&self) -> &str {
        &self.sysfs_root
    }

    pub fn relay_pin(&self) -> PinId {
        self.relay_pin
    }

    pub fn topology(&self) -> &SensorTopology {
        &self.topology
    }

    pub fn decode_table(&self) -> &DecodeTable {
        &self.decode_table
    }

    pub fn relay_hold(&self) -> Duration {
        Duration::from_millis(self.relay_hold_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn travel_start_delay(&self) -> Duration {
        Duration::from_millis(self.travel_start_delay_ms)
    }

    pub fn travel_step_delay(&self) -> Duration {
        Duration::from_millis(self.travel_step_delay_ms)
    }

    pub fn travel_settle(&self) -> Duration {
        Duration::from_millis(self.travel_settle_ms)
    }

    pub fn events_file(&self) -> &str {
        &self.events_file
    }

    pub fn events_recent_limit(&self) -> usize {
        self.events_recent_limit
    }

    pub fn http_bind_address(&self) -> &str {
        &self.http_bind_address
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to shorten monitor and travel timing
    pub fn with_timing(mut self, poll_interval_ms: u64, travel_step_delay_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self.travel_step_delay_ms = travel_step_delay_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> anyhow::Result<Config> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        Config::from_toml(toml_config, "inline".to_string())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gpio_backend(), GpioBackend::Emulated);
        assert_eq!(config.relay_pin(), PinId(17));
        assert_eq!(config.topology().pins(), &[PinId(27), PinId(22), PinId(23), PinId(24)]);
        assert_eq!(config.decode_table().entries().len(), 4);
        assert_eq!(config.relay_hold(), Duration::from_millis(500));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.stop_timeout(), Duration::from_secs(2));
        assert_eq!(config.travel_step_delay(), Duration::from_secs(1));
        assert_eq!(config.events_file(), "garage_events.log");
        assert_eq!(config.http_port(), 5000);
    }

    #[test]
    fn test_resolve_config_path_default() {
        let args: Vec<String> = vec!["door-controller".to_string()];
        if env::var("CONFIG_FILE").is_err() {
            assert_eq!(Config::resolve_config_path(&args), "config/dev.toml");
        }
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        let args: Vec<String> = vec![
            "door-controller".to_string(),
            "--config".to_string(),
            "config/single-sensor.toml".to_string(),
        ];
        assert_eq!(Config::resolve_config_path(&args), "config/single-sensor.toml");
    }

    #[test]
    fn test_resolve_config_path_from_arg_equals() {
        let args: Vec<String> =
            vec!["door-controller".to_string(), "--config=config/garage.toml".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/garage.toml");
    }

    #[test]
    fn test_minimal_config_uses_ladder() {
        let config = parse(
            r#"
[gpio]
relay_pin = 17
sensor_pins = [5]
"#,
        )
        .unwrap();
        assert_eq!(config.topology().len(), 1);
        assert_eq!(config.decode_table(), &DecodeTable::ladder(1).unwrap());
        assert_eq!(config.http_port(), 5000);
    }

    #[test]
    fn test_explicit_decode_table() {
        let config = parse(
            r#"
[gpio]
relay_pin = 17
sensor_pins = [27, 22]

[[decode]]
active = [true, true]
position = "closed"

[[decode]]
active = [false, false]
position = "open"
"#,
        )
        .unwrap();
        let positions: Vec<_> = config.decode_table().entries().iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![DoorPosition::Closed, DoorPosition::Open]);
    }

    #[test]
    fn test_decode_width_mismatch_rejected() {
        let result = parse(
            r#"
[gpio]
relay_pin = 17
sensor_pins = [27, 22, 23]

[[decode]]
active = [true, true]
position = "closed"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_relay_pin_overlapping_sensor_rejected() {
        let result = parse(
            r#"
[gpio]
relay_pin = 22
sensor_pins = [27, 22]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_sensor_pin_rejected() {
        let err = parse(
            r#"
[gpio]
relay_pin = 17
sensor_pins = [27, 27, 23, 24]
"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "sensor pin 27 is listed more than once");
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = parse(
            r#"
[gpio]
relay_pin = 17
sensor_pins = [27]

[monitor]
poll_interval_ms = 0
"#,
        );
        assert!(result.is_err());
    }
}
