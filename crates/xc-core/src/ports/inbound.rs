//! Inbound Ports (Driving Ports / API)
//!
//! The surface a caller context uses to submit work to the worker core.

use shared_types::{CallbackHandle, CoreError, Payload, Sequence};

use crate::domain::Resolution;
use crate::service::events::ResponseEvent;

/// Primary Crosscore API
pub trait CrossCoreApi: Send + Sync {
    /// Submit a command and wait for its response.
    ///
    /// `timeout_ms == 0` waits until a response arrives or the runtime shuts down.
    fn submit_blocking(
        &self,
        opcode: u16,
        payload: Payload,
        timeout_ms: u32,
    ) -> Result<Payload, CoreError>;

    /// Submit a command whose result is queued for `callback`.
    ///
    /// The result is handed out by [`CrossCoreApi::drain_deferred_callbacks`].
    fn submit_async(
        &self,
        opcode: u16,
        payload: Payload,
        timeout_ms: u32,
        callback: CallbackHandle,
    ) -> Result<Sequence, CoreError>;

    /// Submit a command and return an event that becomes ready with the result.
    fn submit_event(
        &self,
        opcode: u16,
        payload: Payload,
        timeout_ms: u32,
    ) -> Result<ResponseEvent, CoreError>;

    /// Hand every queued callback resolution to `sink`, in the caller's context.
    ///
    /// Returns the number of resolutions delivered.
    fn drain_deferred_callbacks(&self, sink: &mut dyn FnMut(CallbackHandle, Resolution)) -> usize;
}
