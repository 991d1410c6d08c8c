//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Filter directive (trace, debug, info, warn, error, or a full `EnvFilter` string)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include thread names in each line
    pub log_threads: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "crosscore".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            log_threads: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XC_SERVICE_NAME`: Service name (default: crosscore)
    /// - `XC_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `XC_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `XC_LOG_THREADS`: Show thread names (default: true)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("XC_SERVICE_NAME").unwrap_or_else(|_| "crosscore".to_string()),

            log_level: env::var("XC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("XC_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            log_threads: env::var("XC_LOG_THREADS")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
