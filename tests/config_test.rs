//! Integration tests for configuration loading

use door_controller::domain::{DoorPosition, PinId};
use door_controller::infra::{Config, GpioBackend};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[gpio]
backend = "sysfs"
sysfs_root = "/tmp/gpio"
relay_pin = 4
sensor_pins = [5, 6, 13, 19]

[[decode]]
active = [true, true, true, true]
position = "closed"

[[decode]]
active = [false, false, false, true]
position = "open"

[[decode]]
active = [false, false, false, false]
position = "open"

[relay]
hold_ms = 750

[monitor]
poll_interval_ms = 250
stop_timeout_ms = 1000

[travel]
start_delay_ms = 100
step_delay_ms = 400
settle_ms = 50

[events]
file = "/tmp/door.log"
recent_limit = 25

[http]
bind_address = "127.0.0.1"
port = 8080
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.gpio_backend(), GpioBackend::Sysfs);
    assert_eq!(config.sysfs_root(), "/tmp/gpio");
    assert_eq!(config.relay_pin(), PinId(4));
    assert_eq!(config.topology().pins(), &[PinId(5), PinId(6), PinId(13), PinId(19)]);
    let positions: Vec<_> = config.decode_table().entries().iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![DoorPosition::Closed, DoorPosition::Open, DoorPosition::Open]);
    assert_eq!(config.relay_hold(), Duration::from_millis(750));
    assert_eq!(config.poll_interval(), Duration::from_millis(250));
    assert_eq!(config.stop_timeout(), Duration::from_secs(1));
    assert_eq!(config.travel_start_delay(), Duration::from_millis(100));
    assert_eq!(config.travel_step_delay(), Duration::from_millis(400));
    assert_eq!(config.travel_settle(), Duration::from_millis(50));
    assert_eq!(config.events_file(), "/tmp/door.log");
    assert_eq!(config.events_recent_limit(), 25);
    assert_eq!(config.http_bind_address(), "127.0.0.1");
    assert_eq!(config.http_port(), 8080);
}

#[test]
fn test_bundled_configs_parse() {
    let dir = env!("CARGO_MANIFEST_DIR");
    for name in ["dev.toml", "single-sensor.toml", "garage.toml"] {
        let path = format!("{dir}/config/{name}");
        let config = Config::from_file(&path).unwrap_or_else(|e| panic!("{name}: {e:#}"));
        assert_eq!(config.relay_pin(), PinId(17), "{name}");
    }
}

#[test]
fn test_single_sensor_config() {
    let path = format!("{}/config/single-sensor.toml", env!("CARGO_MANIFEST_DIR"));
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.topology().len(), 1);
    assert_eq!(config.travel_start_delay(), Duration::from_secs(2));
    assert_eq!(config.travel_settle(), Duration::from_secs(10));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.gpio_backend(), GpioBackend::Emulated);
    assert_eq!(config.relay_pin(), PinId(17));
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_load_honours_config_file_env() {
    let path = format!("{}/config/single-sensor.toml", env!("CARGO_MANIFEST_DIR"));
    std::env::set_var("CONFIG_FILE", &path);
    let config = Config::load(&["door-controller".to_string()]);
    std::env::remove_var("CONFIG_FILE");

    assert_eq!(config.config_file(), path);
    assert_eq!(config.topology().len(), 1);
}

#[test]
fn test_load_prefers_config_argument() {
    let dir = env!("CARGO_MANIFEST_DIR");
    let args = vec!["door-controller".to_string(), format!("--config={dir}/config/garage.toml")];
    let config = Config::load(&args);
    assert_eq!(config.gpio_backend(), GpioBackend::Sysfs);
}
