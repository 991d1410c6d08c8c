//! Domain module for the Crosscore runtime
//!
//! Contains the pending-request table, the sequence counter, resolutions,
//! lifecycle states and the table invariants.

pub mod invariants;
pub mod pending_table;
pub mod resolution;
pub mod sequence;
pub mod state;

pub use pending_table::{PendingEntry, PendingError, PendingTable, NEVER_EXPIRES};
pub use resolution::Resolution;
pub use sequence::{SequenceCounter, FIRST_SEQUENCE};
pub use state::SystemState;
