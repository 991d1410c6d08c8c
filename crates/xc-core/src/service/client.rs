//! Typed helpers over [`CrossCoreApi`] for the built-in operations.

use std::time::Duration;

use serde::Serialize;
use shared_types::{CallbackHandle, CoreError, Opcode, Payload, Sequence};

use crate::ports::CrossCoreApi;
use crate::service::events::ResponseEvent;

/// Timeout applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT_MS: u32 = 5_000;

/// Decoded `Status` operation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub commands_processed: u32,
    pub commands_failed: u32,
    pub uptime: Duration,
}

impl WorkerStatus {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            commands_processed: payload.read_u32(0),
            commands_failed: payload.read_u32(4),
            uptime: Duration::from_millis(payload.read_u64(8)),
        }
    }
}

/// Convenience wrapper encoding and decoding the built-in operations.
pub struct CoreClient<'a, A: CrossCoreApi + ?Sized> {
    api: &'a A,
    timeout_ms: u32,
}

impl<'a, A: CrossCoreApi + ?Sized> CoreClient<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn echo(&self, data: &[u8]) -> Result<Payload, CoreError> {
        let payload = Payload::from_slice(data)?;
        self.api
            .submit_blocking(Opcode::Echo.code(), payload, self.timeout_ms)
    }

    pub fn add(&self, a: i32, b: i32) -> Result<i32, CoreError> {
        let result = self.api.submit_blocking(
            Opcode::Add.code(),
            Payload::from_i32_pair(a, b),
            self.timeout_ms,
        )?;
        Ok(result.read_i32(0))
    }

    pub fn status(&self) -> Result<WorkerStatus, CoreError> {
        let result =
            self.api
                .submit_blocking(Opcode::Status.code(), Payload::zeroed(), self.timeout_ms)?;
        Ok(WorkerStatus::from_payload(&result))
    }

    /// Ask the worker to sleep for `delay_ms`.
    ///
    /// A delay longer than the client timeout fails with a timeout error,
    /// either the caller's own or the worker's clamped `Status::Timeout`.
    pub fn delay(&self, delay_ms: u32) -> Result<(), CoreError> {
        self.api
            .submit_blocking(
                Opcode::Delay.code(),
                Payload::from_u32(delay_ms),
                self.timeout_ms,
            )
            .map(|_| ())
    }

    pub fn echo_async(&self, data: &[u8], callback: CallbackHandle) -> Result<Sequence, CoreError> {
        let payload = Payload::from_slice(data)?;
        self.api
            .submit_async(Opcode::Echo.code(), payload, self.timeout_ms, callback)
    }

    pub fn add_async(
        &self,
        a: i32,
        b: i32,
        callback: CallbackHandle,
    ) -> Result<Sequence, CoreError> {
        self.api.submit_async(
            Opcode::Add.code(),
            Payload::from_i32_pair(a, b),
            self.timeout_ms,
            callback,
        )
    }

    pub fn add_event(&self, a: i32, b: i32) -> Result<ResponseEvent, CoreError> {
        self.api.submit_event(
            Opcode::Add.code(),
            Payload::from_i32_pair(a, b),
            self.timeout_ms,
        )
    }

    pub fn delay_event(&self, delay_ms: u32) -> Result<ResponseEvent, CoreError> {
        self.api.submit_event(
            Opcode::Delay.code(),
            Payload::from_u32(delay_ms),
            self.timeout_ms,
        )
    }
}
