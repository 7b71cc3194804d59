use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::config::MonitorConfig;
use super::telemetry::recorder::{MonitorHandle, PerformanceMonitor};
use super::telemetry::sink::{TracingSink, WarningSink};
use super::time::{Clock, MonotonicClock};

/// Subject name used when a caller passes an empty one.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Process-wide `name -> monitor` map.
///
/// Passed explicitly to instrumented code and to dashboards; clones share the same entries.
/// Entries live until removed; two unrelated subjects using the same name share one monitor.
#[derive(Clone)]
pub struct MonitorRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

struct RegistryInner {
    monitors: HashMap<String, MonitorHandle>,
    clock: Rc<dyn Clock>,
    sink: Rc<dyn WarningSink>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::with_parts(Rc::new(MonotonicClock::new()), Rc::new(TracingSink))
    }

    /// Registry whose monitors read time from `clock` and report warnings to `sink`.
    pub fn with_parts(clock: Rc<dyn Clock>, sink: Rc<dyn WarningSink>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                monitors: HashMap::new(),
                clock,
                sink,
            })),
        }
    }

    /// Returns the monitor registered under `name`, creating it with `config` on first use.
    ///
    /// A later call with a different config gets the existing monitor; the first config wins.
    pub fn monitor(&self, name: &str, config: MonitorConfig) -> MonitorHandle {
        let key = subject_key(name);
        let mut inner = self.inner.borrow_mut();

        if let Some(existing) = inner.monitors.get(&key) {
            let existing = existing.clone();
            if existing.config() != config.clone().normalized() {
                debug!(monitor = %key, "monitor already registered; keeping its original config");
            }
            return existing;
        }

        let monitor = PerformanceMonitor::new(key.clone(), config, Rc::clone(&inner.clock), Rc::clone(&inner.sink));
        let handle = MonitorHandle::new(monitor);
        debug!(monitor = %key, "monitor registered");
        inner.monitors.insert(key, handle.clone());
        handle
    }

    pub fn lookup(&self, name: &str) -> Option<MonitorHandle> {
        self.inner.borrow().monitors.get(&subject_key(name)).cloned()
    }

    /// Detaches a monitor from the registry. Existing handles keep working.
    pub fn remove(&self, name: &str) -> Option<MonitorHandle> {
        let removed = self.inner.borrow_mut().monitors.remove(&subject_key(name));
        if removed.is_some() {
            debug!(monitor = %subject_key(name), "monitor removed");
        }
        removed
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.borrow().monitors.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().monitors.is_empty()
    }
}

impl Default for MonitorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MonitorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorRegistry").field("names", &self.names()).finish()
    }
}

/// Instrumentation entry point: the monitor for `name`, created on first call.
pub fn use_performance_monitor(registry: &MonitorRegistry, name: &str, config: MonitorConfig) -> MonitorHandle {
    registry.monitor(name, config)
}

fn subject_key(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        ANONYMOUS_SUBJECT.to_string()
    } else {
        trimmed.to_string()
    }
}
