//! Tracing subscriber initialization.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "cinedex_service=info,cinedex_storage=info,warn";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `CINEDEX_LOG_FORMAT`: `json` (default) or `pretty`.
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: std::env::var("CINEDEX_LOG_FORMAT")
                .ok()
                .and_then(|s| LogFormat::parse(&s))
                .unwrap_or(LogFormat::Json),
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to init subscriber: {0}")]
    Init(String),
}

/// Install the global tracing subscriber.
///
/// Call once at startup, before the first event. `RUST_LOG` takes precedence
/// over [`TelemetryConfig::default_filter`].
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };
    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(format = ?config.format, "Telemetry initialized");
    Ok(())
}
