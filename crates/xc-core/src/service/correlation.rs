//! # Correlation State
//!
//! Everything submitters and the monitor share to match responses with
//! requests: the pending table, the deferred callback ring, the event
//! registry and the runtime counters.
//!
//! Lock order is table, then ring or registry. Nothing acquires the table
//! while holding either of the others.

use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{CorrelationMode, Sequence};
use tracing::warn;

use crate::config::CoreConfig;
use crate::domain::{PendingEntry, PendingError, PendingTable, Resolution};
use crate::metrics::Metrics;
use crate::service::deferred::DeferredCallbacks;
use crate::service::events::EventRegistry;

/// Result of looking up a response's sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// No entry: the request was already resolved, timed out or cleared.
    Orphan,
    /// Left in place for the blocking caller.
    Blocking,
    /// Removed from the table and ready to be delivered.
    Resolvable(PendingEntry),
}

/// What happened to a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Deferred,
    Signaled,
    Requeued,
    Orphaned,
    Dropped,
}

pub struct Correlation {
    pending: Mutex<PendingTable>,
    deferred: DeferredCallbacks,
    events: EventRegistry,
    metrics: Arc<Metrics>,
}

impl Correlation {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            pending: Mutex::new(PendingTable::new(config.max_pending)),
            deferred: DeferredCallbacks::new(config.callback_queue_capacity),
            events: EventRegistry::new(),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn register(&self, entry: PendingEntry) -> Result<usize, PendingError> {
        self.pending.lock().register(entry)
    }

    pub fn clear(&self, sequence: Sequence) -> Option<PendingEntry> {
        self.pending.lock().clear(sequence)
    }

    pub fn find(&self, sequence: Sequence) -> Option<PendingEntry> {
        self.pending.lock().find(sequence).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn pending_capacity(&self) -> usize {
        self.pending.lock().capacity()
    }

    /// True while `sequence` is registered for a blocking caller.
    pub fn is_blocking(&self, sequence: Sequence) -> bool {
        self.pending
            .lock()
            .find(sequence)
            .is_some_and(|entry| entry.mode == CorrelationMode::Blocking)
    }

    /// Look up `sequence` and, unless it is blocking, remove it under the same lock.
    pub fn claim(&self, sequence: Sequence) -> Claim {
        let mut pending = self.pending.lock();
        match pending.find(sequence).map(|entry| entry.mode) {
            None => Claim::Orphan,
            Some(CorrelationMode::Blocking) => Claim::Blocking,
            Some(_) => pending
                .clear(sequence)
                .map_or(Claim::Orphan, Claim::Resolvable),
        }
    }

    /// Hand a resolution to the callback ring or the event registry.
    pub fn deliver(&self, entry: &PendingEntry, resolution: Resolution) -> Disposition {
        let disposition = match (entry.mode, entry.callback, entry.event) {
            (CorrelationMode::Callback, Some(handle), _) => {
                if self.deferred.schedule(handle, resolution) {
                    Disposition::Deferred
                } else {
                    self.metrics.record_callback_dropped();
                    Disposition::Dropped
                }
            }
            (CorrelationMode::Event, _, Some(handle)) => {
                if self.events.signal(handle, resolution) {
                    Disposition::Signaled
                } else {
                    warn!(sequence = entry.sequence, event = %handle, "Event no longer registered");
                    Disposition::Dropped
                }
            }
            (mode, _, _) => {
                warn!(sequence = entry.sequence, %mode, "Entry has no deliverable handle");
                Disposition::Dropped
            }
        };

        if matches!(disposition, Disposition::Deferred | Disposition::Signaled) {
            match resolution {
                Resolution::Completed(_) => self.metrics.record_resolved(),
                Resolution::TimedOut { .. } => self.metrics.record_timeout(),
            }
        }
        disposition
    }

    /// Resolve every expired callback or event entry as a timeout.
    ///
    /// Blocking entries are left for their own caller.
    pub fn expire(&self, now_us: u64) -> usize {
        self.pending.lock().remove_expired(now_us, |entry| {
            if entry.mode == CorrelationMode::Blocking {
                return false;
            }
            warn!(sequence = entry.sequence, mode = %entry.mode, "Request timed out");
            self.deliver(
                entry,
                Resolution::TimedOut {
                    sequence: entry.sequence,
                },
            );
            true
        })
    }

    /// Drop every pending entry and outstanding event. Returns `(entries, events)`.
    pub fn reset(&self) -> (usize, usize) {
        let entries = self.pending.lock().clear_all();
        let events = self.events.clear();
        (entries, events)
    }

    pub fn deferred(&self) -> &DeferredCallbacks {
        &self.deferred
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shared handle to the counters, for the worker.
    pub fn metrics_handle(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }
}
