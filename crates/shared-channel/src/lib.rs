//! # Shared Channel - Bounded Cross-Core Queues
//!
//! The only synchronized resource shared by the caller context and the
//! worker core. Two instances exist per runtime: the command channel and the
//! response channel.
//!
//! ```text
//!  submitters ──send()──▶ ┌──────────────────┐ ──receive()──▶ worker
//!                         │ command channel  │
//!                         └──────────────────┘
//!  worker ──────send()──▶ ┌──────────────────┐ ──receive_matching(!blocking)──▶ monitor
//!  monitor ───restore()──▶│ response channel │ ──receive_matching()──▶ blocking caller
//!                         └──────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Bounded:** a full channel rejects the send after the timeout and hands
//!   the item back. Nothing is ever dropped silently.
//! - **Closable:** `close()` wakes every waiter and returns whatever was still
//!   queued, so shutdown can account for it.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod errors;

pub use channel::BoundedChannel;
pub use errors::{ChannelError, SendError};

/// Default capacity of the command and response channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;
