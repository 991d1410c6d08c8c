use std::thread::{self, JoinHandle};

use shared_types::CoreError;
use tracing::{debug, warn};

use crate::adapters::affinity;
use crate::ports::{TaskBody, TaskSpawner, TaskSpec};

/// Runs each task on a dedicated, named OS thread pinned to `spec.core`.
///
/// Thread names carry the core (`xc-worker@core1`). When the host refuses
/// the pin the task still runs, unpinned, with a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, spec: TaskSpec, body: TaskBody) -> Result<JoinHandle<()>, CoreError> {
        let thread_name = format!("{}@core{}", spec.name, spec.core);
        let task = spec.name;
        let core = usize::from(spec.core);
        let pinned = move || {
            match affinity::pin_current_thread(core) {
                Ok(()) => debug!(task, core, "Pinned to core"),
                Err(err) => {
                    warn!(task, core, error = %err, "Core pinning unavailable, running unpinned");
                }
            }
            body();
        };
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .stack_size(spec.stack_size)
            .spawn(pinned)
            .map_err(|e| CoreError::TaskSpawn {
                name: spec.name.to_string(),
                reason: e.to_string(),
            })?;
        debug!(thread = %thread_name, stack_size = spec.stack_size, "Task spawned");
        Ok(handle)
    }
}
