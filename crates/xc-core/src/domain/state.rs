//! Lifecycle states of the runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state.
///
/// ```text
/// Uninitialized ──init()──▶ Initialized ──shutdown()──▶ ShuttingDown ──▶ Uninitialized
///       │
///       └──init() fails──▶ Error ──init()──▶ ...
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemState {
    #[default]
    Uninitialized,
    Initialized,
    ShuttingDown,
    Error,
}

impl SystemState {
    /// True if `init` may be attempted from this state.
    #[must_use]
    pub fn can_init(self) -> bool {
        matches!(self, SystemState::Uninitialized | SystemState::Error)
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemState::Uninitialized => "uninitialized",
            SystemState::Initialized => "initialized",
            SystemState::ShuttingDown => "shutting down",
            SystemState::Error => "error",
        };
        f.write_str(name)
    }
}
