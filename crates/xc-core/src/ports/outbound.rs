//! Outbound Ports (Driven Ports / SPI)
//!
//! Platform services the runtime depends on: a monotonic clock, a way to
//! start pinned tasks, and the caller runtime's interpreter lock.

use std::thread::JoinHandle;

use shared_types::CoreError;

/// Monotonic time source in microseconds.
pub trait Clock: Send + Sync {
    fn now_us(&self) -> u64;
}

/// Parameters for a long-running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: &'static str,
    /// Core to pin the task to. Advisory on hosts without affinity control.
    pub core: u8,
    pub stack_size: usize,
}

/// Body of a spawned task.
pub type TaskBody = Box<dyn FnOnce() + Send + 'static>;

/// Starts the worker and monitor tasks.
pub trait TaskSpawner: Send + Sync {
    /// Start `body` as a named task.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TaskSpawn`] when the platform refuses the task.
    fn spawn(&self, spec: TaskSpec, body: TaskBody) -> Result<JoinHandle<()>, CoreError>;
}

/// Global lock held by an embedding interpreter while it calls into the runtime.
///
/// Blocking submissions release it for the duration of their wait so other
/// interpreter threads keep running.
pub trait InterpreterLock: Send + Sync {
    fn release(&self);
    fn reacquire(&self);
}
