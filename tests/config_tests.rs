use std::rc::Rc;

use render_telemetry::kernel::config::{TelemetrySettings, DEFAULT_CAPACITY, MAX_CAPACITY};
use render_telemetry::kernel::telemetry::sink::NullSink;
use render_telemetry::kernel::time::{Clock, ManualClock};
use render_telemetry::{use_performance_monitor, DashboardConfig, MonitorConfig, MonitorRegistry, TelemetryError};

#[test]
fn test_partial_json_uses_defaults() {
    let config = MonitorConfig::from_json_str(r#"{ "warn_threshold_ms": 100, "track_memory": true }"#).expect("valid");

    assert_eq!(config.warn_threshold_ms, 100.0);
    assert!(config.track_memory);
    assert!(config.track_render, "Render tracking defaults on");
    assert!(!config.track_network);
    assert!(!config.enable_logging);
    assert_eq!(config.capacity, DEFAULT_CAPACITY);
}

#[test]
fn test_out_of_range_values_are_normalized() {
    let config = MonitorConfig::from_json_str(r#"{ "warn_threshold_ms": -5.0, "capacity": 0 }"#).expect("valid");

    assert_eq!(config.warn_threshold_ms, 0.0);
    assert_eq!(config.capacity, 1);

    let dashboard = DashboardConfig::from_json_str(r#"{ "poll_interval_ms": 0 }"#).expect("valid");
    assert_eq!(dashboard.poll_interval_ms, 1);
    assert_eq!(dashboard.recent_events, 10);
}

#[test]
fn test_huge_capacity_is_capped() {
    let config = MonitorConfig::from_json_str(r#"{ "capacity": 18446744073709551615 }"#).expect("valid");
    assert_eq!(config.capacity, MAX_CAPACITY);

    let clock = ManualClock::new();
    let registry = MonitorRegistry::with_parts(Rc::new(clock.clone()), Rc::new(NullSink));
    let unchecked = MonitorConfig {
        capacity: usize::MAX,
        ..MonitorConfig::default()
    };
    let monitor = use_performance_monitor(&registry, "Avatar", unchecked);

    clock.advance(3.0);
    assert!(monitor.record_render());
    assert_eq!(monitor.capacity(), MAX_CAPACITY);
    assert_eq!(monitor.get_performance_summary().total_events, 1);
}

#[test]
fn test_invalid_json_is_a_config_error() {
    let err = MonitorConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, TelemetryError::Config(_)));
    assert!(err.to_string().starts_with("invalid telemetry config"));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = TelemetrySettings::from_json_file("/definitely/not/here/telemetry.json").unwrap_err();
    assert!(matches!(err, TelemetryError::Io { .. }));
}

#[test]
fn test_settings_file_round() {
    let path = std::env::temp_dir().join(format!("render-telemetry-settings-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{ "monitor": { "track_network": true, "enable_logging": true }, "dashboard": { "poll_interval_ms": 250 } }"#,
    )
    .expect("write temp settings");

    let settings = TelemetrySettings::from_json_file(&path).expect("load");
    let _ = std::fs::remove_file(&path);

    assert!(settings.monitor.track_network);
    assert!(settings.monitor.enable_logging);
    assert_eq!(settings.dashboard.poll_interval_ms, 250);
    assert_eq!(settings.dashboard.poll_interval().as_millis(), 250);
}

#[test]
fn test_manual_clock_never_goes_backwards() {
    let clock = ManualClock::starting_at(10.0);
    let shared = clock.clone();

    clock.advance(5.0);
    clock.advance(-3.0);
    clock.set(2.0);

    assert_eq!(shared.now_ms(), 15.0);
}
