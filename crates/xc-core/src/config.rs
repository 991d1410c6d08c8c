//! Configuration for the Crosscore runtime

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::CoreError;

/// Runtime configuration.
///
/// Defaults match the firmware build: 16-deep channels, 32 pending slots,
/// a 100 ms worker poll and a 10 ms monitor poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Command channel depth
    pub command_queue_capacity: usize,
    /// Response channel depth
    pub response_queue_capacity: usize,
    /// Pending-request table slots
    pub max_pending: usize,
    /// Deferred callback ring size
    pub callback_queue_capacity: usize,
    /// Worker wait on the command channel per cycle
    pub worker_poll_interval_ms: u64,
    /// Monitor wait on the response channel per cycle
    pub monitor_poll_interval_ms: u64,
    /// How long a submitter or the worker waits for channel space
    pub send_timeout_ms: u64,
    /// Monitor pause after handing a response back to a blocking caller
    pub requeue_backoff_ms: u64,
    /// Core the worker thread is pinned to
    pub worker_core: u8,
    /// Core the monitor thread is pinned to
    pub monitor_core: u8,
    pub worker_stack_size: usize,
    pub monitor_stack_size: usize,
    /// Start the monitor as part of `init`
    pub start_monitor_on_init: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            command_queue_capacity: 16,
            response_queue_capacity: 16,
            max_pending: 32,
            callback_queue_capacity: 16,
            worker_poll_interval_ms: 100,
            monitor_poll_interval_ms: 10,
            send_timeout_ms: 100,
            requeue_backoff_ms: 1,
            worker_core: 1,
            monitor_core: 0,
            worker_stack_size: 256 * 1024,
            monitor_stack_size: 128 * 1024,
            start_monitor_on_init: false,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `XC_*` environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `XC_COMMAND_QUEUE`: command channel depth (default: 16)
    /// - `XC_RESPONSE_QUEUE`: response channel depth (default: 16)
    /// - `XC_MAX_PENDING`: pending table slots (default: 32)
    /// - `XC_CALLBACK_QUEUE`: deferred callback ring size (default: 16)
    /// - `XC_WORKER_POLL_MS`: worker poll interval (default: 100)
    /// - `XC_MONITOR_POLL_MS`: monitor poll interval (default: 10)
    /// - `XC_SEND_TIMEOUT_MS`: channel send timeout (default: 100)
    /// - `XC_AUTO_MONITOR`: start the monitor during init (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            command_queue_capacity: env_parse("XC_COMMAND_QUEUE")
                .unwrap_or(defaults.command_queue_capacity),
            response_queue_capacity: env_parse("XC_RESPONSE_QUEUE")
                .unwrap_or(defaults.response_queue_capacity),
            max_pending: env_parse("XC_MAX_PENDING").unwrap_or(defaults.max_pending),
            callback_queue_capacity: env_parse("XC_CALLBACK_QUEUE")
                .unwrap_or(defaults.callback_queue_capacity),
            worker_poll_interval_ms: env_parse("XC_WORKER_POLL_MS")
                .unwrap_or(defaults.worker_poll_interval_ms),
            monitor_poll_interval_ms: env_parse("XC_MONITOR_POLL_MS")
                .unwrap_or(defaults.monitor_poll_interval_ms),
            send_timeout_ms: env_parse("XC_SEND_TIMEOUT_MS").unwrap_or(defaults.send_timeout_ms),
            start_monitor_on_init: env::var("XC_AUTO_MONITOR")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.start_monitor_on_init),
            ..defaults
        }
    }

    /// Reject configurations the runtime cannot start with.
    pub fn validate(&self) -> Result<(), CoreError> {
        let sizes = [
            ("command_queue_capacity", self.command_queue_capacity),
            ("response_queue_capacity", self.response_queue_capacity),
            ("max_pending", self.max_pending),
            ("callback_queue_capacity", self.callback_queue_capacity),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(CoreError::InvalidConfig(format!("{name} must be non-zero")));
        }
        if self.worker_poll_interval_ms == 0 || self.monitor_poll_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "poll intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }

    pub fn monitor_poll_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_poll_interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn requeue_backoff(&self) -> Duration {
        Duration::from_millis(self.requeue_backoff_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
