use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::event::{clamp_sample, EventKind, TelemetryEvent};
use super::log::EventLog;
use super::metrics::{compute_summary, PerformanceSummary};
use super::sink::{WarningRecord, WarningSink};
use crate::kernel::config::MonitorConfig;
use crate::kernel::error::{Result, TelemetryError};
use crate::kernel::time::{Clock, Millis};

/// Cheap running totals for frequent polling.
///
/// Counts every record accepted since the last clear, including entries since evicted from the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderMetrics {
    pub render_count: u64,
    pub effect_count: u64,
    pub network_count: u64,
    pub memory_samples: u64,
    pub warning_total: u64,
    pub evicted: u64,
    pub last_render_ms: Option<Millis>,
    pub last_effect_ms: Option<Millis>,
    pub last_network_ms: Option<Millis>,
    pub last_memory_value: Option<f64>,
}

impl RenderMetrics {
    fn absorb(&mut self, event: &TelemetryEvent) {
        match event.kind {
            EventKind::Render => {
                self.render_count += 1;
                self.last_render_ms = event.duration_ms;
            }
            EventKind::Effect => {
                self.effect_count += 1;
                self.last_effect_ms = event.duration_ms;
            }
            EventKind::Network => {
                self.network_count += 1;
                self.last_network_ms = event.duration_ms;
            }
            EventKind::Memory => {
                self.memory_samples += 1;
                self.last_memory_value = event.value;
            }
            EventKind::Warning => {}
        }
        if event.warning {
            self.warning_total += 1;
        }
    }
}

/// Recorder for one subject: configuration, bounded event log and running totals.
pub struct PerformanceMonitor {
    name: String,
    config: MonitorConfig,
    created_at_ms: Millis,
    last_render_at_ms: Millis,
    next_seq: u64,
    log: EventLog,
    totals: RenderMetrics,
    clock: Rc<dyn Clock>,
    sink: Rc<dyn WarningSink>,
}

impl PerformanceMonitor {
    pub fn new(name: impl Into<String>, config: MonitorConfig, clock: Rc<dyn Clock>, sink: Rc<dyn WarningSink>) -> Self {
        let config = config.normalized();
        let now = clock.now_ms();
        Self {
            name: name.into(),
            log: EventLog::new(config.capacity),
            config,
            created_at_ms: now,
            last_render_at_ms: now,
            next_seq: 0,
            totals: RenderMetrics::default(),
            clock,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Records the time since the previous render (or since creation for the first one).
    pub fn record_render(&mut self) -> bool {
        if !self.config.track_render {
            return false;
        }
        let now = self.clock.now_ms();
        let elapsed = now - self.last_render_at_ms;
        self.last_render_at_ms = now;
        self.push_timed(EventKind::Render, now, elapsed);
        true
    }

    /// Effects belong to the render cycle and share its switch.
    pub fn record_effect(&mut self, duration_ms: Millis) -> bool {
        if !self.config.track_render {
            return false;
        }
        let now = self.clock.now_ms();
        self.push_timed(EventKind::Effect, now, duration_ms);
        true
    }

    pub fn record_network(&mut self, duration_ms: Millis) -> bool {
        if !self.config.track_network {
            return false;
        }
        let now = self.clock.now_ms();
        self.push_timed(EventKind::Network, now, duration_ms);
        true
    }

    pub fn record_memory(&mut self, value: f64) -> bool {
        if !self.config.track_memory {
            return false;
        }
        let event = TelemetryEvent::memory(self.take_seq(), self.clock.now_ms(), clamp_sample(value));
        self.append(event);
        true
    }

    /// Explicit warning. Not gated by any category.
    pub fn record_warning(&mut self, detail: impl Into<String>) -> bool {
        let event = TelemetryEvent::warning(self.take_seq(), self.clock.now_ms(), detail);
        self.append(event);
        true
    }

    pub fn get_metrics(&self) -> RenderMetrics {
        self.totals.clone()
    }

    /// Copy of the retained events, oldest first.
    pub fn get_events(&self) -> Vec<TelemetryEvent> {
        self.log.snapshot()
    }

    /// Copy of at most `n` events, newest first.
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        self.log.recent(n)
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }

    pub fn get_performance_summary(&self) -> PerformanceSummary {
        compute_summary(self.log.iter(), self.created_at_ms, self.clock.now_ms())
    }

    /// Drops events and totals. Creation time and sequence numbering are kept.
    pub fn clear_data(&mut self) {
        let dropped = self.log.len();
        self.log.clear();
        self.totals = RenderMetrics::default();
        debug!(monitor = %self.name, dropped, "telemetry cleared");
    }

    pub fn export_json(&self) -> Result<String> {
        let export = MonitorExport {
            name: &self.name,
            config: &self.config,
            metrics: self.get_metrics(),
            summary: self.get_performance_summary(),
            events: self.get_events(),
        };
        serde_json::to_string_pretty(&export).map_err(|source| TelemetryError::Export {
            name: self.name.clone(),
            source,
        })
    }

    fn push_timed(&mut self, kind: EventKind, now: Millis, duration_ms: Millis) {
        let seq = self.take_seq();
        let event = TelemetryEvent::timed(seq, kind, now, clamp_sample(duration_ms), self.config.warn_threshold_ms);
        self.append(event);
    }

    fn append(&mut self, event: TelemetryEvent) {
        if event.warning && self.config.enable_logging {
            self.sink.warn(&WarningRecord::for_event(&self.name, &event, self.config.warn_threshold_ms));
        }
        self.totals.absorb(&event);
        if self.log.push(event).is_some() {
            self.totals.evicted += 1;
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("created_at_ms", &self.created_at_ms)
            .field("log", &self.log)
            .field("totals", &self.totals)
            .finish()
    }
}

#[derive(Serialize)]
struct MonitorExport<'a> {
    name: &'a str,
    config: &'a MonitorConfig,
    metrics: RenderMetrics,
    summary: PerformanceSummary,
    events: Vec<TelemetryEvent>,
}

/// Shared handle to a monitor. Clones observe the same instance.
///
/// Single-threaded by construction (`Rc`). A call that arrives while the monitor is already
/// borrowed, e.g. from a sink that records back into it, is dropped rather than panicking.
#[derive(Clone)]
pub struct MonitorHandle {
    inner: Rc<RefCell<PerformanceMonitor>>,
}

impl MonitorHandle {
    pub fn new(monitor: PerformanceMonitor) -> Self {
        Self {
            inner: Rc::new(RefCell::new(monitor)),
        }
    }

    pub fn ptr_eq(&self, other: &MonitorHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn name(&self) -> String {
        self.read(|m| m.name().to_string()).unwrap_or_default()
    }

    pub fn config(&self) -> MonitorConfig {
        self.read(|m| m.config().clone()).unwrap_or_default()
    }

    /// Maximum number of retained events.
    pub fn capacity(&self) -> usize {
        self.read(PerformanceMonitor::capacity).unwrap_or_default()
    }

    pub fn record_render(&self) -> bool {
        self.write(PerformanceMonitor::record_render).unwrap_or(false)
    }

    pub fn record_effect(&self, duration_ms: Millis) -> bool {
        self.write(|m| m.record_effect(duration_ms)).unwrap_or(false)
    }

    pub fn record_network(&self, duration_ms: Millis) -> bool {
        self.write(|m| m.record_network(duration_ms)).unwrap_or(false)
    }

    pub fn record_memory(&self, value: f64) -> bool {
        self.write(|m| m.record_memory(value)).unwrap_or(false)
    }

    pub fn record_warning(&self, detail: impl Into<String>) -> bool {
        let detail = detail.into();
        self.write(move |m| m.record_warning(detail)).unwrap_or(false)
    }

    /// Runs `work` and records its elapsed time as an effect. The monitor is not borrowed while
    /// `work` runs, so it may record into the same monitor.
    pub fn measure_effect<T>(&self, work: impl FnOnce() -> T) -> T {
        let (output, elapsed) = self.timed(work);
        if let Some(elapsed) = elapsed {
            self.record_effect(elapsed);
        }
        output
    }

    /// Like [`measure_effect`](Self::measure_effect), recorded as a network event.
    pub fn measure_network<T>(&self, work: impl FnOnce() -> T) -> T {
        let (output, elapsed) = self.timed(work);
        if let Some(elapsed) = elapsed {
            self.record_network(elapsed);
        }
        output
    }

    pub fn get_metrics(&self) -> RenderMetrics {
        self.read(PerformanceMonitor::get_metrics).unwrap_or_default()
    }

    pub fn get_events(&self) -> Vec<TelemetryEvent> {
        self.read(PerformanceMonitor::get_events).unwrap_or_default()
    }

    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        self.read(|m| m.recent_events(n)).unwrap_or_default()
    }

    pub fn get_performance_summary(&self) -> PerformanceSummary {
        self.read(PerformanceMonitor::get_performance_summary).unwrap_or_default()
    }

    pub fn clear_data(&self) {
        self.write(PerformanceMonitor::clear_data);
    }

    pub fn export_json(&self) -> Result<String> {
        match self.read(PerformanceMonitor::export_json) {
            Some(result) => result,
            None => Ok(String::new()),
        }
    }

    fn timed<T>(&self, work: impl FnOnce() -> T) -> (T, Option<Millis>) {
        let clock = self.read(|m| Rc::clone(&m.clock));
        let started = clock.as_ref().map(|c| c.now_ms());
        let output = work();
        let elapsed = clock.zip(started).map(|(clock, started)| clock.now_ms() - started);
        (output, elapsed)
    }

    fn read<T>(&self, f: impl FnOnce(&PerformanceMonitor) -> T) -> Option<T> {
        match self.inner.try_borrow() {
            Ok(monitor) => Some(f(&monitor)),
            Err(_) => {
                debug!("monitor busy; read skipped");
                None
            }
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut PerformanceMonitor) -> T) -> Option<T> {
        match self.inner.try_borrow_mut() {
            Ok(mut monitor) => Some(f(&mut monitor)),
            Err(_) => {
                debug!("monitor busy; record dropped");
                None
            }
        }
    }
}

impl fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(monitor) => fmt::Debug::fmt(&*monitor, f),
            Err(_) => f.write_str("MonitorHandle(<busy>)"),
        }
    }
}
