//! Runtime counters
//!
//! Lock-free counters updated by submitters, the worker and the monitor.
//! Read them through [`Metrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Thread-safe counters for one runtime instance.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Commands accepted onto the command channel
    pub commands_submitted: AtomicU64,
    /// Submissions rejected (queue full, table full, not initialized)
    pub submissions_rejected: AtomicU64,
    /// Commands executed by the worker
    pub commands_processed: AtomicU64,
    /// Commands answered with a non-success status
    pub commands_failed: AtomicU64,
    /// Responses delivered to a callback, event or blocking caller
    pub responses_resolved: AtomicU64,
    /// Blocking responses handed back onto the response channel
    pub responses_requeued: AtomicU64,
    /// Responses with no pending entry
    pub orphans_discarded: AtomicU64,
    /// Entries resolved as timeouts by the monitor or a blocking caller
    pub timeouts: AtomicU64,
    /// Responses the worker could not enqueue
    pub responses_lost: AtomicU64,
    /// Resolutions dropped because the callback ring was full
    pub callbacks_dropped: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.commands_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.submissions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a worker-side completion.
    pub fn record_processed(&self, ok: bool) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_resolved(&self) {
        self.responses_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_requeued(&self) {
        self.responses_requeued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_orphan(&self) {
        self.orphans_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response_lost(&self) {
        self.responses_lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_callback_dropped(&self) {
        self.callbacks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands_submitted: self.commands_submitted.load(Ordering::Relaxed),
            submissions_rejected: self.submissions_rejected.load(Ordering::Relaxed),
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            responses_resolved: self.responses_resolved.load(Ordering::Relaxed),
            responses_requeued: self.responses_requeued.load(Ordering::Relaxed),
            orphans_discarded: self.orphans_discarded.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            responses_lost: self.responses_lost.load(Ordering::Relaxed),
            callbacks_dropped: self.callbacks_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Metrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub commands_submitted: u64,
    pub submissions_rejected: u64,
    pub commands_processed: u64,
    pub commands_failed: u64,
    pub responses_resolved: u64,
    pub responses_requeued: u64,
    pub orphans_discarded: u64,
    pub timeouts: u64,
    pub responses_lost: u64,
    pub callbacks_dropped: u64,
}

impl MetricsSnapshot {
    /// Commands submitted but not yet resolved or timed out.
    pub fn in_flight(&self) -> u64 {
        self.commands_submitted
            .saturating_sub(self.responses_resolved)
            .saturating_sub(self.timeouts)
    }
}
