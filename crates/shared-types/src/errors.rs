//! # Error Types
//!
//! Caller-facing errors of the Crosscore runtime.

use thiserror::Error;

use crate::messages::Status;

/// Errors building a [`crate::Payload`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Input does not fit into a payload block.
    #[error("Payload too large: {len} bytes exceeds {max}")]
    TooLarge { len: usize, max: usize },
}

/// Errors surfaced by submission, resolution and lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No response arrived before the caller's deadline.
    #[error("Timed out waiting for response")]
    Timeout,

    /// The command channel stayed full for the whole send window.
    #[error("Command queue full")]
    QueueFull,

    /// Every pending-request slot is occupied.
    #[error("Pending request table full ({capacity} slots)")]
    TableFull { capacity: usize },

    /// The sequence number is still in flight.
    #[error("Sequence {sequence} is already pending")]
    DuplicateSequence { sequence: u32 },

    /// The worker answered with a non-success status.
    #[error("Worker error: {0}")]
    Worker(Status),

    /// The runtime has not been initialized.
    #[error("Runtime not initialized")]
    NotInitialized,

    /// `init` was called on a running runtime.
    #[error("Runtime already initialized")]
    AlreadyInitialized,

    /// The runtime is shutting down or its channels were closed.
    #[error("Runtime is shutting down")]
    ShuttingDown,

    /// An event was polled before its response arrived.
    #[error("Result not ready")]
    NotReady,

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker or monitor thread could not be started.
    #[error("Failed to spawn task {name}: {reason}")]
    TaskSpawn { name: String, reason: String },
}

impl CoreError {
    /// Map a worker status to an error. `Status::Ok` maps to `None`.
    #[must_use]
    pub fn from_status(status: Status) -> Option<Self> {
        match status {
            Status::Ok => None,
            other => Some(CoreError::Worker(other)),
        }
    }

    /// True for caller-side deadlines and for worker-reported timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::Timeout | CoreError::Worker(Status::Timeout))
    }

    /// True when retrying later may succeed.
    #[must_use]
    pub fn is_backpressure(&self) -> bool {
        matches!(
            self,
            CoreError::QueueFull
                | CoreError::TableFull { .. }
                | CoreError::Worker(Status::WorkerBusy)
        )
    }
}
