//! # Crosscore Runtime
//!
//! A miniature in-process RPC runtime for a two-core system. A caller
//! context dispatches fixed-size commands to a worker pinned on the compute
//! core and receives results through one of three correlation strategies.
//!
//! ## Architecture
//!
//! - **Domain**: pending-request table, sequence counter, resolutions, lifecycle states
//! - **Ports**: Inbound (`CrossCoreApi`) and Outbound (`Clock`, `TaskSpawner`, `InterpreterLock`)
//! - **Adapters**: monotonic clock, OS-thread spawner
//! - **Service**: worker and monitor loops, deferred callbacks, events, lifecycle
//!
//! ## Data Flow
//!
//! ```text
//!  caller                       compute core                 controller core
//!  ──────                       ────────────                 ───────────────
//!  register(seq) ─┐
//!  send(Command) ─┴──▶ [commands] ──▶ Worker ──▶ [responses] ──▶ Monitor
//!                                      │                          │
//!                                  dispatch table          ┌──────┴───────┐
//!                                                       Callback  Event  Blocking
//!                                                          │        │       │
//!  drain_deferred_callbacks() ◀── ring ◀───────────────────┘        │   skipped in place
//!  event.get_result()         ◀── signal ◀──────────────────────────┘       │
//!  submit_blocking()          ◀── receive_matching(seq) ◀───────────────────┘
//! ```
//!
//! ## Correlation Modes
//!
//! | Mode | Returns | Resolved by | Timeout enforced by |
//! |------|---------|-------------|---------------------|
//! | Blocking | payload | the caller itself | the caller |
//! | Callback | sequence | monitor → deferred ring | monitor scan |
//! | Event | `ResponseEvent` | monitor → event signal | monitor scan |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xc_core::{CoreClient, CoreConfig, CrossCore};
//!
//! let core = CrossCore::new(CoreConfig::default());
//! core.init()?;
//! core.start_monitoring()?;
//!
//! let sum = CoreClient::new(&core).add(40, 2)?;
//! core.shutdown(Duration::from_secs(1), false);
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{MonotonicClock, NoInterpreterLock, ThreadSpawner};
pub use config::CoreConfig;
pub use domain::{PendingEntry, PendingError, PendingTable, Resolution, SystemState};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ports::{Clock, CrossCoreApi, InterpreterLock, TaskSpawner, TaskSpec};
pub use service::{
    CallbackRegistry, CoreClient, CrossCore, ResponseEvent, ShutdownOutcome, ShutdownReport,
    TaskExit, WorkerStatus, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TIMEOUT_MS,
};
pub use shared_types::{
    CallbackHandle, Command, CoreError, CorrelationMode, EventHandle, Opcode, Payload, Response,
    Sequence, Status, MAX_PAYLOAD_SIZE,
};
