//! Process-wide sequence counter.

use std::sync::atomic::{AtomicU32, Ordering};

use shared_types::Sequence;

/// First sequence handed out after construction or reset.
pub const FIRST_SEQUENCE: Sequence = 1;

/// Atomic, wrapping sequence generator.
#[derive(Debug)]
pub struct SequenceCounter {
    next: AtomicU32,
}

impl SequenceCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(FIRST_SEQUENCE),
        }
    }

    /// Take the next sequence. Wraps on overflow.
    pub fn next(&self) -> Sequence {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The value the next call to [`Self::next`] will return.
    pub fn peek(&self) -> Sequence {
        self.next.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.next.store(FIRST_SEQUENCE, Ordering::Relaxed);
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}
