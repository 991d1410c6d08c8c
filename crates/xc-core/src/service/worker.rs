//! # Worker Loop
//!
//! Runs on the compute core. Knows only the two channels, the dispatch
//! table and the shared counters; correlation modes are invisible here.
//!
//! ```text
//! loop:
//!   stop requested? ──yes──▶ exit
//!   receive(command, poll interval)
//!     ├─ command ──▶ dispatch ──▶ send(response, send timeout)
//!     ├─ empty   ──▶ next cycle
//!     └─ closed  ──▶ exit
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use shared_channel::{BoundedChannel, ChannelError};
use shared_types::{Command, Response};
use tracing::{debug, error, info};

use crate::config::CoreConfig;
use crate::metrics::Metrics;
use crate::service::channels::Channels;
use crate::service::dispatch::{self, OpContext};
use crate::service::task::{ExitGuard, TaskControl};

/// Outcome of one worker cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStep {
    Processed,
    Idle,
    Closed,
}

pub struct Worker {
    commands: Arc<BoundedChannel<Command>>,
    responses: Arc<BoundedChannel<Response>>,
    metrics: Arc<Metrics>,
    control: Arc<TaskControl>,
    poll_interval: Duration,
    send_timeout: Duration,
    started_at: Instant,
}

impl Worker {
    pub fn new(
        channels: &Channels,
        metrics: Arc<Metrics>,
        control: Arc<TaskControl>,
        config: &CoreConfig,
    ) -> Self {
        Self {
            commands: Arc::clone(&channels.commands),
            responses: Arc::clone(&channels.responses),
            metrics,
            control,
            poll_interval: config.worker_poll_interval(),
            send_timeout: config.send_timeout(),
            started_at: Instant::now(),
        }
    }

    /// Run until a stop is requested or the command channel closes.
    pub fn run(self) {
        let _exit = ExitGuard::new(&self.control);
        info!("Worker loop started");
        while !self.control.stop_requested() {
            if self.poll_once() == WorkerStep::Closed {
                debug!("Command channel closed");
                break;
            }
        }
        info!("Worker loop exiting");
    }

    pub fn poll_once(&self) -> WorkerStep {
        match self.commands.receive(self.poll_interval) {
            Ok(command) => {
                let response = self.process(&command);
                self.publish(response);
                WorkerStep::Processed
            }
            Err(ChannelError::Closed) => WorkerStep::Closed,
            Err(_) => WorkerStep::Idle,
        }
    }

    pub fn process(&self, command: &Command) -> Response {
        debug!(
            sequence = command.sequence,
            opcode = command.opcode,
            timeout_ms = command.timeout_ms,
            "Processing command"
        );
        let ctx = OpContext {
            control: &self.control,
            metrics: &self.metrics,
            started_at: self.started_at,
            sleep_slice: self.poll_interval,
        };
        let response = dispatch::dispatch(&ctx, command);
        self.metrics.record_processed(response.is_ok());
        response
    }

    fn publish(&self, response: Response) {
        if let Err(err) = self.responses.send(response, self.send_timeout) {
            error!(
                sequence = response.sequence,
                error = %err.kind,
                "Failed to enqueue response"
            );
            self.metrics.record_response_lost();
        }
    }
}
