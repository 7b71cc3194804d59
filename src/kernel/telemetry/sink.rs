use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::warn;

use super::event::{EventKind, TelemetryEvent};
use crate::kernel::time::Millis;

/// Structured warning forwarded to a sink when a monitor has logging enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningRecord {
    pub monitor: String,
    pub kind: EventKind,
    pub seq: u64,
    pub timestamp_ms: Millis,
    pub duration_ms: Option<Millis>,
    pub threshold_ms: Millis,
    pub detail: Option<String>,
}

impl WarningRecord {
    pub fn for_event(monitor: &str, event: &TelemetryEvent, threshold_ms: Millis) -> Self {
        Self {
            monitor: monitor.to_string(),
            kind: event.kind,
            seq: event.seq,
            timestamp_ms: event.timestamp_ms,
            duration_ms: event.duration_ms,
            threshold_ms,
            detail: event.detail.clone(),
        }
    }
}

/// Receives warning classifications. Must return promptly and never call back into the monitor.
pub trait WarningSink {
    fn warn(&self, record: &WarningRecord);
}

/// Emits warnings through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, record: &WarningRecord) {
        match record.duration_ms {
            Some(duration) => warn!(
                monitor = %record.monitor,
                kind = %record.kind,
                seq = record.seq,
                duration_ms = duration,
                threshold_ms = record.threshold_ms,
                "slow {} in {}: {:.1}ms > {:.1}ms",
                record.kind,
                record.monitor,
                duration,
                record.threshold_ms
            ),
            None => warn!(
                monitor = %record.monitor,
                seq = record.seq,
                detail = record.detail.as_deref().unwrap_or(""),
                "warning in {}",
                record.monitor
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl WarningSink for NullSink {
    fn warn(&self, _record: &WarningRecord) {}
}

/// Keeps every record in memory. Clones share storage.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    records: Rc<RefCell<Vec<WarningRecord>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<WarningRecord> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl WarningSink for CollectingSink {
    fn warn(&self, record: &WarningRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}
