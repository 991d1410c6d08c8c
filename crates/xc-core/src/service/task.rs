//! Cooperative stop signalling for the worker and monitor tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::warn;

/// How often a stopping task is checked for exit.
pub const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Flags shared between a task and its owner.
#[derive(Debug, Default)]
pub struct TaskControl {
    stop: AtomicBool,
    exited: AtomicBool,
}

impl TaskControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    fn mark_exited(&self) {
        self.exited.store(true, Ordering::Release);
    }
}

/// Sets the exited flag when the task body returns or unwinds.
pub struct ExitGuard<'a>(&'a TaskControl);

impl<'a> ExitGuard<'a> {
    pub fn new(control: &'a TaskControl) -> Self {
        Self(control)
    }
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_exited();
    }
}

/// How a task ended when its owner stopped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// Observed the stop flag and returned in time.
    Graceful,
    /// Detached without waiting, or did not exit within the budget.
    Abandoned,
}

/// Owner's handle to a running task.
pub struct TaskHandle {
    name: &'static str,
    control: Arc<TaskControl>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn new(name: &'static str, control: Arc<TaskControl>, join: JoinHandle<()>) -> Self {
        Self {
            name,
            control,
            join: Some(join),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn has_exited(&self) -> bool {
        self.control.has_exited()
    }

    /// Signal the task and wait up to `timeout` for it to exit.
    ///
    /// A task still running after `timeout` is abandoned.
    pub fn stop(mut self, timeout: Duration) -> TaskExit {
        self.control.request_stop();
        if !self.wait_for_exit(timeout) {
            warn!(
                task = self.name,
                timeout_ms = timeout.as_millis() as u64,
                "Task did not exit in time, abandoning"
            );
            return self.abandon();
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!(task = self.name, "Task panicked");
            }
        }
        TaskExit::Graceful
    }

    /// Signal the task and detach it without waiting.
    pub fn abandon(mut self) -> TaskExit {
        self.control.request_stop();
        // Dropping the JoinHandle detaches the thread.
        self.join.take();
        TaskExit::Abandoned
    }

    fn wait_for_exit(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.control.has_exited() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(EXIT_POLL_INTERVAL.min(deadline - now));
        }
    }
}
