//! Integration scenarios against a live runtime.

pub mod backpressure;
pub mod concurrency;
pub mod round_trip;
pub mod timeouts;
