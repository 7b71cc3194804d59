use crate::kernel::config::DashboardConfig;
use crate::kernel::registry::MonitorRegistry;
use crate::kernel::telemetry::event::{EventKind, TelemetryEvent};
use crate::kernel::telemetry::metrics::PerformanceSummary;
use crate::kernel::telemetry::recorder::RenderMetrics;
use crate::kernel::time::Millis;

/// `Collapsed` and `Expanded` are the visible states; `Hidden` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    Collapsed,
    Expanded,
    Hidden,
}

impl DashboardState {
    pub fn is_visible(self) -> bool {
        !matches!(self, DashboardState::Hidden)
    }
}

/// Everything one redraw needs, read in a single poll.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardFrame {
    pub subject: String,
    pub state: DashboardState,
    /// False until a monitor is registered under `subject`.
    pub attached: bool,
    pub capacity: usize,
    pub metrics: RenderMetrics,
    pub summary: PerformanceSummary,
    /// Newest first.
    pub recent: Vec<TelemetryEvent>,
}

/// Display model for one subject. Looks the monitor up by name on every poll, so it can be
/// created before the subject starts recording.
#[derive(Debug)]
pub struct Dashboard {
    subject: String,
    registry: MonitorRegistry,
    config: DashboardConfig,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(registry: MonitorRegistry, subject: impl Into<String>, config: DashboardConfig) -> Self {
        Self {
            subject: subject.into(),
            registry,
            config: config.normalized(),
            state: DashboardState::Collapsed,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn state(&self) -> DashboardState {
        self.state
    }

    pub fn toggle(&mut self) -> DashboardState {
        self.state = match self.state {
            DashboardState::Collapsed => DashboardState::Expanded,
            DashboardState::Expanded => DashboardState::Collapsed,
            DashboardState::Hidden => DashboardState::Hidden,
        };
        self.state
    }

    /// Clears the observed monitor. Returns whether anything was cleared.
    pub fn clear(&mut self) -> bool {
        if !self.state.is_visible() {
            return false;
        }
        match self.registry.lookup(&self.subject) {
            Some(monitor) => {
                monitor.clear_data();
                true
            }
            None => false,
        }
    }

    /// Stops this dashboard. The monitor keeps recording.
    pub fn close(&mut self) {
        self.state = DashboardState::Hidden;
    }

    /// `None` once closed.
    pub fn poll(&self) -> Option<DashboardFrame> {
        if !self.state.is_visible() {
            return None;
        }

        let frame = match self.registry.lookup(&self.subject) {
            Some(monitor) => DashboardFrame {
                subject: self.subject.clone(),
                state: self.state,
                attached: true,
                capacity: monitor.capacity(),
                metrics: monitor.get_metrics(),
                summary: monitor.get_performance_summary(),
                recent: monitor.recent_events(self.config.recent_events),
            },
            None => DashboardFrame {
                subject: self.subject.clone(),
                state: self.state,
                attached: false,
                capacity: 0,
                metrics: RenderMetrics::default(),
                summary: PerformanceSummary::default(),
                recent: Vec::new(),
            },
        };
        Some(frame)
    }
}

/// Text rendering of a frame.
pub fn render_lines(frame: &DashboardFrame) -> Vec<String> {
    if !frame.attached {
        return vec![format!("· {}: waiting for monitor", frame.subject)];
    }

    let metrics = &frame.metrics;
    let summary = &frame.summary;
    let marker = match frame.state {
        DashboardState::Expanded => '▾',
        _ => '▸',
    };

    let mut lines = vec![format!(
        "{} {}  renders {}  last {}  avg {}  warnings {}",
        marker,
        frame.subject,
        metrics.render_count,
        format_optional_ms(metrics.last_render_ms),
        format_ms(summary.avg_duration_ms),
        summary.warning_count
    )];

    if frame.state != DashboardState::Expanded {
        return lines;
    }

    // Tiles
    lines.push(format!("  render   count {:>6}  last {}", metrics.render_count, format_optional_ms(metrics.last_render_ms)));
    lines.push(format!("  effect   count {:>6}  last {}", metrics.effect_count, format_optional_ms(metrics.last_effect_ms)));
    lines.push(format!("  network  count {:>6}  last {}", metrics.network_count, format_optional_ms(metrics.last_network_ms)));
    lines.push(format!(
        "  memory   count {:>6}  last {}",
        metrics.memory_samples,
        metrics.last_memory_value.map_or_else(|| "-".to_string(), |v| format!("{:.0}", v))
    ));
    if let Some(stats) = &summary.durations {
        lines.push(format!(
            "  timing   p50 {}  p95 {}  max {}",
            format_ms(stats.p50),
            format_ms(stats.p95),
            format_ms(stats.max)
        ));
    }

    lines.push(format!("  recent ({})", frame.recent.len()));
    if frame.recent.is_empty() {
        lines.push("    (none)".to_string());
    }
    for event in &frame.recent {
        lines.push(format!("    {}", describe_event(event)));
    }

    lines.push(format!(
        "  uptime {}  events {}/{}  warnings {}  evicted {}",
        format_uptime(summary.uptime_ms),
        summary.total_events,
        frame.capacity,
        summary.warning_count,
        metrics.evicted
    ));

    lines
}

fn describe_event(event: &TelemetryEvent) -> String {
    let body = match event.kind {
        EventKind::Memory => event.value.map_or_else(|| "-".to_string(), |v| format!("{:.0}", v)),
        EventKind::Warning => event.detail.clone().unwrap_or_default(),
        _ => format_optional_ms(event.duration_ms),
    };
    let flag = if event.warning && event.kind.is_timed() { "  SLOW" } else { "" };
    format!("#{:<5} {:<8} {}{}", event.seq, event.kind.label(), body, flag)
}

fn format_ms(ms: Millis) -> String {
    format!("{:.1}ms", ms)
}

fn format_optional_ms(ms: Option<Millis>) -> String {
    ms.map_or_else(|| "-".to_string(), format_ms)
}

fn format_uptime(ms: Millis) -> String {
    if ms >= 60_000.0 {
        format!("{:.1}m", ms / 60_000.0)
    } else {
        format!("{:.1}s", ms / 1000.0)
    }
}
