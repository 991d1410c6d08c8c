//! # Adapters Layer (Hexagonal Architecture)
//!
//! Host implementations of the outbound ports.

pub mod affinity;
mod clock;
mod interpreter_lock;
mod thread_spawner;

pub use clock::MonotonicClock;
pub use interpreter_lock::NoInterpreterLock;
pub use thread_spawner::ThreadSpawner;
