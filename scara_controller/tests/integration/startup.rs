//! Integration test: startup from a configuration file.

use std::io::Write;

use scara_common::config::{ConfigError, ConfigLoader, ControllerConfig};
use scara_common::hal::Axis;
use tempfile::NamedTempFile;

use super::Bench;

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

const BENCH_TOML: &str = r#"
[shared]
service_name = "bench"

[mechanics]
steps_per_rev = 10
microsteps = 1
mm_per_rev = 1.0

[motion]
max_speed_steps = 1000.0
max_accel_steps = 20000.0
min_speed_steps = 50.0
default_speed = 50

[gripper]
initial_angle = 90.0
settle_ms = 5

[status]
interval_ms = 100

[[vision.objects]]
id = "red_circle_camera_x_0"
x = 12.0
y = -8.0
"#;

#[test]
fn controller_starts_from_file() {
    let file = write_config(BENCH_TOML);
    let config = ControllerConfig::load(file.path()).unwrap();
    let mut bench = Bench::with_config(&config);

    // Power-on settings come from the file.
    assert_eq!(bench.ctl.state().speed, 50);
    assert_eq!(bench.ctl.axis(Axis::X).max_speed(), 500.0);
    bench.tick();
    assert_eq!(bench.hal.gripper(), Some(90.0));

    // Seeded objects resolve without an `O` report.
    assert!(bench.send("V:red_circle_camera_x_0").is_empty());
    bench.run_until_idle(20_000);
    assert_eq!(bench.replies(), vec!["OK"]);
    assert_eq!(bench.hal.position(Axis::X), 120);
    assert_eq!(bench.hal.position(Axis::Y), -80);
}

#[test]
fn seeded_object_outside_workspace_is_refused() {
    let file = write_config(
        r#"
[[vision.objects]]
id = "far"
x = 1000.0
y = 0.0
"#,
    );
    let config = ControllerConfig::load(file.path()).unwrap();
    let err = scara_controller::controller::Controller::new(&config).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn printed_config_loads_back() {
    let text = super::bench_config().to_toml_string().unwrap();
    let file = write_config(&text);
    let config = ControllerConfig::load(file.path()).unwrap();
    assert_eq!(config.mechanics, super::bench_config().mechanics);
    assert_eq!(config.status.interval_ms, 100);
}
