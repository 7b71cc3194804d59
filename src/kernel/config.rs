use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Result, TelemetryError};

pub const DEFAULT_CAPACITY: usize = 500;
/// Upper bound on `capacity`; the log allocates its full capacity up front.
pub const MAX_CAPACITY: usize = 100_000;
pub const DEFAULT_WARN_THRESHOLD_MS: f64 = 16.0;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RECENT_EVENTS: usize = 10;

/// Per-subject capture settings. Fixed for the lifetime of the monitor it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub track_render: bool,
    pub track_memory: bool,
    pub track_network: bool,
    /// Timed events strictly above this many milliseconds are flagged as warnings.
    pub warn_threshold_ms: f64,
    /// Forward warnings to the injected sink.
    pub enable_logging: bool,
    /// Maximum number of retained events, within `1..=MAX_CAPACITY`.
    pub capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            track_render: true,
            track_memory: false,
            track_network: false,
            warn_threshold_ms: DEFAULT_WARN_THRESHOLD_MS,
            enable_logging: false,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl MonitorConfig {
    pub fn with_warn_threshold(mut self, ms: f64) -> Self {
        self.warn_threshold_ms = ms;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    pub fn tracking_all(mut self) -> Self {
        self.track_render = true;
        self.track_memory = true;
        self.track_network = true;
        self
    }

    /// Clamp out-of-range values instead of rejecting them.
    pub fn normalized(mut self) -> Self {
        if !self.warn_threshold_ms.is_finite() || self.warn_threshold_ms < 0.0 {
            self.warn_threshold_ms = 0.0;
        }
        self.capacity = self.capacity.clamp(1, MAX_CAPACITY);
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(TelemetryError::Config)?;
        Ok(config.normalized())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TelemetryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

/// Settings for a dashboard surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub poll_interval_ms: u64,
    /// Length of the recent-event list shown when expanded.
    pub recent_events: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            recent_events: DEFAULT_RECENT_EVENTS,
        }
    }
}

impl DashboardConfig {
    pub fn normalized(mut self) -> Self {
        self.poll_interval_ms = self.poll_interval_ms.max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(TelemetryError::Config)?;
        Ok(config.normalized())
    }
}

/// Combined file layout read by the live binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub monitor: MonitorConfig,
    pub dashboard: DashboardConfig,
}

impl TelemetrySettings {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw).map_err(TelemetryError::Config)?;
        Ok(Self {
            monitor: settings.monitor.normalized(),
            dashboard: settings.dashboard.normalized(),
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TelemetryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
