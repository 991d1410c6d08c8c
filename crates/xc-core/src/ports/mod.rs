//! Ports (Hexagonal Architecture)

pub mod inbound;
pub mod outbound;

pub use inbound::CrossCoreApi;
pub use outbound::{Clock, InterpreterLock, TaskBody, TaskSpawner, TaskSpec};
