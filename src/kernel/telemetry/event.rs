use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kernel::time::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Render,
    Effect,
    Memory,
    Network,
    Warning,
}

impl EventKind {
    /// Kinds that carry a duration and are subject to warning classification.
    pub fn is_timed(self) -> bool {
        matches!(self, EventKind::Render | EventKind::Effect | EventKind::Network)
    }

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Render => "render",
            EventKind::Effect => "effect",
            EventKind::Memory => "memory",
            EventKind::Network => "network",
            EventKind::Warning => "warning",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded occurrence. Built once, then only ever cloned out of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Per-monitor sequence number; survives clears.
    pub seq: u64,
    pub kind: EventKind,
    pub timestamp_ms: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TelemetryEvent {
    /// Timed event, flagged when `duration_ms` exceeds `threshold_ms`.
    pub fn timed(seq: u64, kind: EventKind, timestamp_ms: Millis, duration_ms: Millis, threshold_ms: Millis) -> Self {
        Self {
            seq,
            kind,
            timestamp_ms,
            duration_ms: Some(duration_ms),
            value: None,
            warning: duration_ms > threshold_ms,
            detail: None,
        }
    }

    pub fn memory(seq: u64, timestamp_ms: Millis, value: f64) -> Self {
        Self {
            seq,
            kind: EventKind::Memory,
            timestamp_ms,
            duration_ms: None,
            value: Some(value),
            warning: false,
            detail: None,
        }
    }

    pub fn warning(seq: u64, timestamp_ms: Millis, detail: impl Into<String>) -> Self {
        Self {
            seq,
            kind: EventKind::Warning,
            timestamp_ms,
            duration_ms: None,
            value: None,
            warning: true,
            detail: Some(detail.into()),
        }
    }
}

/// Clamp a sample from an imprecise source: negatives and non-finite values become 0.
pub(crate) fn clamp_sample(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}
