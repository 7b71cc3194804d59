use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use render_telemetry::dashboard::{
    render_lines, Dashboard, DashboardCommand, DashboardDriver, DashboardFrame, DashboardState, StopReason, Surface,
    TerminalSurface,
};
use render_telemetry::kernel::telemetry::sink::NullSink;
use render_telemetry::kernel::time::ManualClock;
use render_telemetry::{use_performance_monitor, DashboardConfig, MonitorConfig, MonitorRegistry};

fn manual_registry() -> (ManualClock, MonitorRegistry) {
    let clock = ManualClock::new();
    let registry = MonitorRegistry::with_parts(Rc::new(clock.clone()), Rc::new(NullSink));
    (clock, registry)
}

#[derive(Clone, Default)]
struct RecordingSurface {
    frames: Rc<RefCell<Vec<DashboardFrame>>>,
    closed: Rc<RefCell<bool>>,
}

impl Surface for RecordingSurface {
    fn draw(&mut self, frame: &DashboardFrame, _lines: &[String]) {
        self.frames.borrow_mut().push(frame.clone());
    }

    fn close(&mut self) {
        *self.closed.borrow_mut() = true;
    }
}

#[test]
fn test_state_machine() {
    let (_clock, registry) = manual_registry();
    let mut dashboard = Dashboard::new(registry, "Avatar", DashboardConfig::default());

    assert_eq!(dashboard.state(), DashboardState::Collapsed);
    assert_eq!(dashboard.toggle(), DashboardState::Expanded);
    assert_eq!(dashboard.toggle(), DashboardState::Collapsed);

    dashboard.close();
    assert_eq!(dashboard.state(), DashboardState::Hidden);
    assert_eq!(dashboard.toggle(), DashboardState::Hidden, "Hidden is terminal");
    assert!(dashboard.poll().is_none());
    assert!(!dashboard.clear());
}

#[test]
fn test_close_leaves_monitor_recording() {
    let (clock, registry) = manual_registry();
    let monitor = use_performance_monitor(&registry, "Avatar", MonitorConfig::default());
    let mut dashboard = Dashboard::new(registry.clone(), "Avatar", DashboardConfig::default());

    dashboard.close();
    clock.advance(5.0);

    assert!(monitor.record_render());
    assert_eq!(monitor.get_performance_summary().total_events, 1);
    assert!(registry.lookup("Avatar").is_some());
}

#[test]
fn test_dashboard_attaches_late() {
    let (clock, registry) = manual_registry();
    let dashboard = Dashboard::new(registry.clone(), "Ghost", DashboardConfig::default());

    let frame = dashboard.poll().expect("visible");
    assert!(!frame.attached);
    assert_eq!(render_lines(&frame), vec!["· Ghost: waiting for monitor".to_string()]);

    let monitor = registry.monitor("Ghost", MonitorConfig::default());
    clock.advance(2.0);
    monitor.record_render();

    let frame = dashboard.poll().expect("visible");
    assert!(frame.attached);
    assert_eq!(frame.summary.total_events, 1);
}

#[test]
fn test_clear_action_resets_monitor() {
    let (clock, registry) = manual_registry();
    let monitor = registry.monitor("Avatar", MonitorConfig::default());
    for _ in 0..4 {
        clock.advance(3.0);
        monitor.record_render();
    }
    let mut dashboard = Dashboard::new(registry, "Avatar", DashboardConfig::default());

    assert!(dashboard.clear());

    assert!(monitor.get_events().is_empty());
    let frame = dashboard.poll().expect("visible");
    assert_eq!(frame.summary.total_events, 0);
    assert_eq!(frame.metrics.render_count, 0);
    assert_eq!(frame.summary.uptime_ms, 12.0);
}

#[test]
fn test_expanded_frame_lists_recent_newest_first() {
    let (clock, registry) = manual_registry();
    let monitor = registry.monitor("Avatar", MonitorConfig::default().with_warn_threshold(20.0));
    for _ in 0..15 {
        clock.advance(4.0);
        monitor.record_render();
    }
    monitor.record_effect(35.0);

    let mut dashboard = Dashboard::new(registry, "Avatar", DashboardConfig::default());
    let collapsed = render_lines(&dashboard.poll().expect("visible"));
    assert_eq!(collapsed.len(), 1);
    assert!(collapsed[0].contains("Avatar"));
    assert!(collapsed[0].contains("renders 15"));
    assert!(collapsed[0].contains("warnings 1"));

    dashboard.toggle();
    let frame = dashboard.poll().expect("visible");
    assert_eq!(frame.recent.len(), 10);
    assert_eq!(frame.recent[0].seq, 15, "Newest event first");
    assert_eq!(frame.recent[9].seq, 6);

    let lines = render_lines(&frame);
    assert!(lines.len() > 10);
    assert!(lines.iter().any(|l| l.contains("recent (10)")));
    assert!(lines.iter().any(|l| l.contains("#15") && l.contains("effect") && l.contains("SLOW")));
    assert!(lines.iter().any(|l| l.contains("events 16/500")));
}

#[test]
fn test_terminal_surface_writes_blocks() {
    let (_clock, registry) = manual_registry();
    registry.monitor("Avatar", MonitorConfig::default()).record_effect(3.0);
    let dashboard = Dashboard::new(registry, "Avatar", DashboardConfig::default());
    let frame = dashboard.poll().expect("visible");

    let mut surface = TerminalSurface::new(Vec::new());
    surface.draw(&frame, &render_lines(&frame));
    surface.close();

    let text = String::from_utf8(surface.into_inner()).expect("utf8");
    assert!(text.contains("Avatar"));
    assert!(text.contains("--\n"));
    assert!(text.ends_with("dashboard closed\n"));
}

#[test]
fn test_command_parsing() {
    assert_eq!(DashboardCommand::parse("e"), Some(DashboardCommand::Toggle));
    assert_eq!(DashboardCommand::parse(" C \n"), Some(DashboardCommand::Clear));
    assert_eq!(DashboardCommand::parse("quit"), Some(DashboardCommand::Close));
    assert_eq!(DashboardCommand::parse("hello"), None);
}

#[tokio::test(start_paused = true)]
async fn test_polled_totals_only_drop_after_clear() {
    let (clock, registry) = manual_registry();
    let monitor = use_performance_monitor(&registry, "Avatar", MonitorConfig::default());
    let surface = RecordingSurface::default();
    let frames = surface.frames.clone();

    let dashboard = Dashboard::new(registry.clone(), "Avatar", DashboardConfig::default());
    let (driver, control) = DashboardDriver::new(dashboard, surface.clone());

    let subject = async {
        for i in 0..12 {
            clock.advance(5.0);
            monitor.record_render();
            if i == 6 {
                monitor.clear_data();
            }
            tokio::time::sleep(Duration::from_millis(400)).await;
        }
        control.cancel();
    };

    let (report, _) = tokio::join!(driver.run(), subject);

    assert_eq!(report.stop, StopReason::Cancelled);
    assert!(report.polls >= 4, "Polled roughly once per second");
    assert!(*surface.closed.borrow());

    let totals: Vec<usize> = frames.borrow().iter().map(|f| f.summary.total_events).collect();
    let drops = totals.windows(2).filter(|w| w[1] < w[0]).count();
    assert_eq!(drops, 1, "Totals only decrease across the single clear: {:?}", totals);
}

#[tokio::test(start_paused = true)]
async fn test_commands_drive_the_dashboard() {
    let (clock, registry) = manual_registry();
    let monitor = registry.monitor("Avatar", MonitorConfig::default());
    clock.advance(4.0);
    monitor.record_render();

    let surface = RecordingSurface::default();
    let frames = surface.frames.clone();
    let dashboard = Dashboard::new(registry.clone(), "Avatar", DashboardConfig::default());
    let (driver, control) = DashboardDriver::new(dashboard, surface.clone());

    let user = async {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(control.send(DashboardCommand::Toggle).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(control.send(DashboardCommand::Clear).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(control.send(DashboardCommand::Close).await);
    };

    let (report, _) = tokio::join!(driver.run(), user);

    assert_eq!(report.stop, StopReason::Closed);
    assert!(report.draws > report.polls, "Commands trigger an immediate redraw");

    let frames = frames.borrow();
    let last = frames.last().expect("drew frames");
    assert_eq!(last.state, DashboardState::Expanded);
    assert_eq!(last.summary.total_events, 0, "Clear reached the monitor");

    // Recording continues after the dashboard is gone
    clock.advance(4.0);
    assert!(monitor.record_render());
    assert_eq!(monitor.get_performance_summary().total_events, 1);
}

#[tokio::test(start_paused = true)]
async fn test_driver_keeps_polling_without_controls() {
    let (_clock, registry) = manual_registry();
    let dashboard = Dashboard::new(
        registry,
        "Avatar",
        DashboardConfig {
            poll_interval_ms: 1000,
            recent_events: 10,
        },
    );
    let (driver, control) = DashboardDriver::new(dashboard, RecordingSurface::default());
    let token = control.cancellation_token();
    drop(control);

    let stopper = async {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        token.cancel();
    };

    let (report, _) = tokio::join!(driver.run(), stopper);

    assert_eq!(report.stop, StopReason::Cancelled);
    assert_eq!(report.polls, 3, "Ticks at 0ms, 1000ms and 2000ms");
}
