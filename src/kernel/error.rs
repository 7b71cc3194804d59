use thiserror::Error;

/// Failures surfaced by the crate.
///
/// Recording and querying never fail; only loading configuration and exporting data do.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid telemetry config: {0}")]
    Config(#[source] serde_json::Error),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to export telemetry for '{name}': {source}")]
    Export {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
