//! # Shared Types Crate
//!
//! Wire records and error types shared by every Crosscore crate.
//!
//! ## Design Principles
//!
//! - **Fixed-size records**: `Command` and `Response` carry a 128-byte
//!   [`Payload`] by value, so a record can be copied onto a bounded channel
//!   without allocation.
//! - **Opaque handles**: [`CallbackHandle`] and [`EventHandle`] are carried
//!   through the runtime unexamined; only the caller's context interprets them.
//! - **Stable codes**: [`Status`] values are the integer codes the worker
//!   writes into every response, and never change between releases.
//!
//! ## Record Flow
//!
//! ```text
//! caller ──Command──▶ [command channel] ──▶ worker
//! caller ◀─Response── [response channel] ◀── worker
//! ```

pub mod errors;
pub mod handles;
pub mod messages;
pub mod payload;

pub use errors::*;
pub use handles::*;
pub use messages::*;
pub use payload::*;
