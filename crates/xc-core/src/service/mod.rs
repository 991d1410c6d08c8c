//! Runtime services: the worker and monitor loops, correlation state and
//! the lifecycle manager that ties them together.

pub mod channels;
pub mod client;
pub mod correlation;
pub mod deferred;
pub mod dispatch;
pub mod events;
pub mod monitor;
pub mod runtime;
pub mod task;
pub mod worker;

pub use client::{CoreClient, WorkerStatus, DEFAULT_TIMEOUT_MS};
pub use deferred::{CallbackRegistry, DeferredCallbacks};
pub use events::{EventRegistry, ResponseEvent};
pub use runtime::{CrossCore, ShutdownOutcome, ShutdownReport, DEFAULT_SHUTDOWN_TIMEOUT};
pub use task::TaskExit;
