//! Channel error types.

use std::fmt;

use thiserror::Error;

/// Reasons a channel operation did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// No space became available within the timeout.
    #[error("channel full")]
    Full,

    /// Nothing arrived within the timeout.
    #[error("channel empty")]
    Empty,

    /// The channel was closed.
    #[error("channel closed")]
    Closed,

    #[error("channel capacity must be non-zero")]
    ZeroCapacity,
}

/// A failed send. The rejected item is handed back to the sender.
pub struct SendError<T> {
    pub kind: ChannelError,
    pub item: T,
}

impl<T> SendError<T> {
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "send failed: {}", self.kind)
    }
}

impl<T> std::error::Error for SendError<T> {}
