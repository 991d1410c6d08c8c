//! # Crosscore Telemetry
//!
//! Structured logging for the crosscore runtime. Every crate logs through
//! `tracing`; this crate installs the subscriber once per process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let logs = init_telemetry(TelemetryConfig::from_env())?;
//! logs.set_level("xc_core=debug")?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XC_SERVICE_NAME` | `crosscore` | Service name on the startup line |
//! | `XC_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `XC_JSON_LOGS` | `false` | JSON output |
//! | `XC_LOG_THREADS` | `true` | Thread names in each line |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LogLevelHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to reload log filter: {0}")]
    Reload(String),
}

/// Initialize logging and return the runtime level handle.
pub fn init_telemetry(config: TelemetryConfig) -> Result<LogLevelHandle, TelemetryError> {
    init_logging(&config)
}

/// Span carrying the runtime's core assignment.
///
/// # Example
///
/// ```rust,ignore
/// let _span = core_span!("worker", core = 1).entered();
/// ```
#[macro_export]
macro_rules! core_span {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
