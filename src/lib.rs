pub mod dashboard;
pub mod kernel;

// Re-export the instrumentation surface for convenient access
pub use kernel::config::{DashboardConfig, MonitorConfig};
pub use kernel::error::TelemetryError;
pub use kernel::registry::{use_performance_monitor, MonitorRegistry};
pub use kernel::telemetry::event::{EventKind, TelemetryEvent};
pub use kernel::telemetry::metrics::PerformanceSummary;
pub use kernel::telemetry::recorder::{MonitorHandle, RenderMetrics};
