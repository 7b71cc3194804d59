use render_telemetry::kernel::telemetry::event::{EventKind, TelemetryEvent};
use render_telemetry::kernel::telemetry::metrics::{compute_summary, DurationStats};

fn timed(seq: u64, kind: EventKind, duration: f64, threshold: f64) -> TelemetryEvent {
    TelemetryEvent::timed(seq, kind, seq as f64, duration, threshold)
}

#[test]
fn test_empty_log_averages_to_zero() {
    let empty: Vec<TelemetryEvent> = Vec::new();
    let summary = compute_summary(&empty, 0.0, 250.0);

    assert_eq!(summary.avg_duration_ms, 0.0);
    assert!(!summary.avg_duration_ms.is_nan());
    assert_eq!(summary.total_events, 0);
    assert_eq!(summary.warning_count, 0);
    assert_eq!(summary.uptime_ms, 250.0);
    assert!(summary.durations.is_none());
}

#[test]
fn test_uptime_never_negative() {
    let empty: Vec<TelemetryEvent> = Vec::new();
    let summary = compute_summary(&empty, 100.0, 40.0);
    assert_eq!(summary.uptime_ms, 0.0);
}

#[test]
fn test_average_ignores_untimed_events() {
    let events = vec![
        timed(0, EventKind::Render, 10.0, 16.0),
        TelemetryEvent::memory(1, 1.0, 9_999.0),
        timed(2, EventKind::Network, 30.0, 16.0),
        TelemetryEvent::warning(3, 3.0, "manual"),
    ];

    let summary = compute_summary(&events, 0.0, 10.0);

    assert_eq!(summary.total_events, 4);
    assert_eq!(summary.avg_duration_ms, 20.0);
    assert_eq!(summary.warning_count, 2, "Slow network call plus the explicit warning");
    assert_eq!(summary.kinds.render, 1);
    assert_eq!(summary.kinds.memory, 1);
    assert_eq!(summary.kinds.network, 1);
    assert_eq!(summary.kinds.warning, 1);
    assert_eq!(summary.kinds.get(EventKind::Effect), 0);
}

#[test]
fn test_warning_count_matches_threshold() {
    let threshold = 100.0;
    let durations = [50.0, 150.0, 100.0, 101.0, 0.0];
    let events: Vec<TelemetryEvent> = durations
        .iter()
        .enumerate()
        .map(|(i, d)| timed(i as u64, EventKind::Effect, *d, threshold))
        .collect();

    let summary = compute_summary(&events, 0.0, 1.0);

    let expected = durations.iter().filter(|d| **d > threshold).count();
    assert_eq!(summary.warning_count, expected);
    assert_eq!(summary.warning_count, 2);
}

#[test]
fn test_summary_is_deterministic() {
    let events = vec![timed(0, EventKind::Render, 3.0, 16.0), timed(1, EventKind::Effect, 40.0, 16.0)];

    let a = compute_summary(&events, 5.0, 90.0);
    let b = compute_summary(events.iter(), 5.0, 90.0);

    assert_eq!(a, b);
}

#[test]
fn test_duration_stats_percentiles() {
    let samples: Vec<f64> = (1..=100).map(f64::from).collect();

    let stats = DurationStats::from_samples(&samples).expect("non-empty");

    assert_eq!(stats.count, 100);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 100.0);
    assert_eq!(stats.mean, 50.5);
    assert_eq!(stats.p50, 50.0);
    assert_eq!(stats.p90, 90.0);
    assert_eq!(stats.p95, 95.0);
    assert_eq!(stats.p99, 99.0);
}

#[test]
fn test_duration_stats_unsorted_and_single() {
    let stats = DurationStats::from_samples(&[30.0, 10.0, 20.0]).expect("non-empty");
    assert_eq!(stats.min, 10.0);
    assert_eq!(stats.p50, 20.0);
    assert_eq!(stats.max, 30.0);

    let single = DurationStats::from_samples(&[7.0]).expect("non-empty");
    assert_eq!(single.p50, 7.0);
    assert_eq!(single.p99, 7.0);

    assert!(DurationStats::from_samples(&[]).is_none());
}
