//! # Monitor Loop
//!
//! Runs on the controller core. Each cycle drains the response channel,
//! resolves callback and event requests, and then expires overdue entries.
//! Responses owned by a blocking caller are skipped in place so only that
//! caller ever removes them.
//!
//! ```text
//! response ──is_blocking?── yes ──▶ left queued for the caller
//!              │ no
//!              └──claim(sequence)──┬─ Orphan     ──▶ warn, discard
//!                                  ├─ Blocking   ──▶ restore_front, back off
//!                                  └─ Resolvable ──▶ callback ring | event
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use shared_channel::{BoundedChannel, ChannelError};
use shared_types::Response;
use tracing::{debug, error, info, warn};

use crate::config::CoreConfig;
use crate::domain::Resolution;
use crate::ports::Clock;
use crate::service::correlation::{Claim, Correlation, Disposition};
use crate::service::task::{ExitGuard, TaskControl};

/// Counts from one monitor cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub resolved: usize,
    pub requeued: usize,
    pub orphaned: usize,
    pub dropped: usize,
    pub expired: usize,
    pub closed: bool,
}

pub struct Monitor {
    responses: Arc<BoundedChannel<Response>>,
    correlation: Arc<Correlation>,
    clock: Arc<dyn Clock>,
    control: Arc<TaskControl>,
    poll_interval: Duration,
    requeue_backoff: Duration,
}

impl Monitor {
    pub fn new(
        responses: Arc<BoundedChannel<Response>>,
        correlation: Arc<Correlation>,
        clock: Arc<dyn Clock>,
        control: Arc<TaskControl>,
        config: &CoreConfig,
    ) -> Self {
        Self {
            responses,
            correlation,
            clock,
            control,
            poll_interval: config.monitor_poll_interval(),
            requeue_backoff: config.requeue_backoff(),
        }
    }

    /// Run until a stop is requested or the response channel closes.
    pub fn run(self) {
        let _exit = ExitGuard::new(&self.control);
        info!("Monitor loop started");
        while !self.control.stop_requested() {
            if self.poll_once().closed {
                debug!("Response channel closed");
                break;
            }
        }
        info!("Monitor loop exiting");
    }

    pub fn poll_once(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let mut next = self.next_response(self.poll_interval);
        // Bounded so the timeout scan runs at a steady rate under load.
        for _ in 0..self.responses.capacity() {
            match next {
                Ok(response) => match self.handle_response(response) {
                    Disposition::Deferred | Disposition::Signaled => report.resolved += 1,
                    Disposition::Orphaned => report.orphaned += 1,
                    Disposition::Dropped => report.dropped += 1,
                    Disposition::Requeued => {
                        report.requeued += 1;
                        break;
                    }
                },
                Err(ChannelError::Closed) => {
                    report.closed = true;
                    break;
                }
                Err(_) => break,
            }
            next = self.next_response(Duration::ZERO);
        }

        report.expired = self.correlation.expire(self.clock.now_us());

        if report.requeued > 0 {
            thread::sleep(self.requeue_backoff);
        }
        report
    }

    /// Oldest response that does not belong to a blocking caller.
    fn next_response(&self, timeout: Duration) -> Result<Response, ChannelError> {
        self.responses.receive_matching(
            |response| !self.correlation.is_blocking(response.sequence),
            timeout,
        )
    }

    pub fn handle_response(&self, response: Response) -> Disposition {
        match self.correlation.claim(response.sequence) {
            Claim::Orphan => {
                warn!(sequence = response.sequence, "Discarding orphaned response");
                self.correlation.metrics().record_orphan();
                Disposition::Orphaned
            }
            Claim::Blocking => match self.responses.restore_front(response) {
                Ok(()) => {
                    self.correlation.metrics().record_requeued();
                    Disposition::Requeued
                }
                Err(err) => {
                    error!(
                        sequence = response.sequence,
                        error = %err.kind,
                        "Failed to hand response back to blocking caller"
                    );
                    self.correlation.metrics().record_response_lost();
                    Disposition::Dropped
                }
            },
            Claim::Resolvable(entry) => {
                debug!(
                    sequence = entry.sequence,
                    mode = %entry.mode,
                    status = %response.status,
                    "Resolving response"
                );
                self.correlation
                    .deliver(&entry, Resolution::Completed(response))
            }
        }
    }
}
