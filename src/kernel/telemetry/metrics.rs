use serde::{Deserialize, Serialize};

use super::event::{EventKind, TelemetryEvent};
use crate::kernel::time::Millis;

/// Aggregate view of a monitor's retained events. Never stored; always recomputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub avg_duration_ms: f64,
    pub total_events: usize,
    /// Flagged events: timed events over the threshold plus explicit `record_warning` entries.
    pub warning_count: usize,
    pub uptime_ms: Millis,
    pub kinds: KindCounts,
    /// `None` when no timed events are retained.
    pub durations: Option<DurationStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub render: usize,
    pub effect: usize,
    pub memory: usize,
    pub network: usize,
    pub warning: usize,
}

impl KindCounts {
    pub fn get(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Render => self.render,
            EventKind::Effect => self.effect,
            EventKind::Memory => self.memory,
            EventKind::Network => self.network,
            EventKind::Warning => self.warning,
        }
    }

    fn bump(&mut self, kind: EventKind) {
        match kind {
            EventKind::Render => self.render += 1,
            EventKind::Effect => self.effect += 1,
            EventKind::Memory => self.memory += 1,
            EventKind::Network => self.network += 1,
            EventKind::Warning => self.warning += 1,
        }
    }
}

/// Distribution of retained durations. Percentiles use nearest rank on the sorted samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub count: usize,
    pub min: Millis,
    pub max: Millis,
    pub mean: Millis,
    pub p50: Millis,
    pub p90: Millis,
    pub p95: Millis,
    pub p99: Millis,
}

impl DurationStats {
    pub fn from_samples(samples: &[Millis]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            p50: percentile(&sorted, 0.50),
            p90: percentile(&sorted, 0.90),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        })
    }
}

fn percentile(sorted: &[Millis], q: f64) -> Millis {
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Pure function over a log: no clock access, no state.
pub fn compute_summary<'a, I>(events: I, created_at_ms: Millis, now_ms: Millis) -> PerformanceSummary
where
    I: IntoIterator<Item = &'a TelemetryEvent>,
{
    let mut summary = PerformanceSummary::default();
    let mut durations = Vec::new();

    for event in events {
        summary.total_events += 1;
        summary.kinds.bump(event.kind);

        if event.warning {
            summary.warning_count += 1;
        }
        if let Some(duration) = event.duration_ms {
            durations.push(duration);
        }
    }

    if !durations.is_empty() {
        summary.avg_duration_ms = durations.iter().sum::<f64>() / durations.len() as f64;
    }
    summary.durations = DurationStats::from_samples(&durations);
    summary.uptime_ms = (now_ms - created_at_ms).max(0.0);

    summary
}
