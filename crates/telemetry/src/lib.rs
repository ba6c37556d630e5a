//! Logging and timing for LunaTrack build tools
//!
//! - Structured logging with tracing, written to stderr so machine-readable
//!   output on stdout stays clean
//! - Per-process session id for correlating log lines
//! - Lightweight operation timers

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize with custom configuration
///
/// `RUST_LOG` takes precedence over `config.log_level` when set.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        tracing::subscriber::set_global_default(
            registry.with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(config.show_target),
            ),
        )
    } else {
        tracing::subscriber::set_global_default(
            registry.with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.show_target)
                    .with_file(config.show_file)
                    .with_line_number(config.show_line_number)
                    .compact(),
            ),
        )
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// One JSON object per event instead of compact text
    pub json: bool,
    /// Include the event target (module path)
    pub show_target: bool,
    /// Include the source file (text format only)
    pub show_file: bool,
    /// Include the source line (text format only)
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
            show_target: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl TelemetryConfig {
    /// Map `-v` count and `--quiet` to a log level
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let log_level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };
        Self {
            log_level: log_level.to_string(),
            show_target: verbose >= 2,
            show_file: verbose >= 3,
            show_line_number: verbose >= 3,
            ..Self::default()
        }
    }

    /// Switch between JSON and compact text output
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.name,
            duration_us = duration.as_micros() as u64,
            "Timer completed"
        );
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(TelemetryConfig::from_verbosity(0, false).log_level, "warn");
        assert_eq!(TelemetryConfig::from_verbosity(1, false).log_level, "info");
        assert_eq!(TelemetryConfig::from_verbosity(2, false).log_level, "debug");
        assert_eq!(TelemetryConfig::from_verbosity(5, false).log_level, "trace");
        assert_eq!(TelemetryConfig::from_verbosity(3, true).log_level, "error");
    }

    #[test]
    fn test_source_locations_at_trace() {
        let config = TelemetryConfig::from_verbosity(3, false);
        assert!(config.show_target && config.show_file && config.show_line_number);
        assert!(!TelemetryConfig::from_verbosity(2, false).show_file);
    }

    #[test]
    fn test_with_json() {
        let config = TelemetryConfig::from_verbosity(0, false).with_json(true);
        assert!(config.json);
        assert_eq!(config.log_level, "warn");
        assert!(!TelemetryConfig::default().json);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start("resolve");
        std::thread::sleep(Duration::from_millis(5));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 5);
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(!id.is_empty());
        // Should be a valid UUID
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(id, session_id());
    }
}
