//! Structured logging initialization via `tracing`.

use tracing_subscriber::EnvFilter;

/// Output format for the tracing subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    Human,
    /// Newline-delimited JSON, for log shippers.
    Json,
}

impl LogFormat {
    /// Parse from a config string; anything unrecognized falls back to human.
    pub fn from_config(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Human,
        }
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. `"info"`)
/// applies. Calling this twice is a no-op rather than a panic so tests can
/// initialize freely.
pub fn init_tracing_with(format: LogFormat, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let result = match format {
        LogFormat::Human => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}

/// Initialize with human output at `info` unless `RUST_LOG` overrides.
pub fn init_tracing() {
    init_tracing_with(LogFormat::Human, "info");
}
