//! # Command and Response Records
//!
//! Records moved by value across the command and response channels.
//!
//! | Field | Command | Response |
//! |-------|---------|----------|
//! | `sequence` | assigned by the submitter | echoed by the worker |
//! | `opcode` | selects the operation | - |
//! | `mode` / handles | correlation metadata, never read by the worker | - |
//! | `status` | - | written by the worker |
//! | `payload` | operation input | operation output |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handles::{CallbackHandle, EventHandle, Sequence};
use crate::payload::Payload;

/// Built-in worker operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Opcode {
    /// Return the request payload unchanged.
    Echo = 0x0001,
    /// Sum two `i32` operands.
    Add = 0x0002,
    /// Sleep for the requested milliseconds, clamped to the caller's timeout.
    Delay = 0x0020,
    /// Report worker counters.
    Status = 0x00FF,
}

impl Opcode {
    pub const ALL: [Opcode; 4] = [Opcode::Echo, Opcode::Add, Opcode::Delay, Opcode::Status];

    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Echo => "echo",
            Opcode::Add => "add",
            Opcode::Delay => "delay",
            Opcode::Status => "status",
        }
    }
}

impl TryFrom<u16> for Opcode {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.code() == code)
            .ok_or(code)
    }
}

impl From<Opcode> for u16 {
    fn from(op: Opcode) -> Self {
        op.code()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:04X})", self.name(), self.code())
    }
}

/// Completion status written by the worker into every response.
///
/// The integer codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Timeout = -1,
    QueueFull = -2,
    InvalidCommand = -3,
    /// Reserved.
    InvalidParam = -4,
    /// Reserved for backpressure signaling.
    WorkerBusy = -5,
    /// Reserved.
    NoResponse = -6,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            -1 => Some(Status::Timeout),
            -2 => Some(Status::QueueFull),
            -3 => Some(Status::InvalidCommand),
            -4 => Some(Status::InvalidParam),
            -5 => Some(Status::WorkerBusy),
            -6 => Some(Status::NoResponse),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }

    const fn label(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Timeout => "timeout",
            Status::QueueFull => "queue full",
            Status::InvalidCommand => "invalid command",
            Status::InvalidParam => "invalid parameter",
            Status::WorkerBusy => "worker busy",
            Status::NoResponse => "no response",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

/// How the submitter is told about the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationMode {
    /// The submitter waits on the response channel itself.
    Blocking,
    /// The monitor queues the result for `drain_deferred_callbacks`.
    Callback,
    /// The monitor signals an event object.
    Event,
}

impl fmt::Display for CorrelationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorrelationMode::Blocking => "blocking",
            CorrelationMode::Callback => "callback",
            CorrelationMode::Event => "event",
        };
        f.write_str(name)
    }
}

/// A unit of work for the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Raw opcode; unknown values are answered with `InvalidCommand`.
    pub opcode: u16,
    pub sequence: Sequence,
    pub mode: CorrelationMode,
    /// Caller's deadline in milliseconds. `0` means no timeout.
    pub timeout_ms: u32,
    pub callback: Option<CallbackHandle>,
    pub event: Option<EventHandle>,
    pub payload: Payload,
}

impl Command {
    #[must_use]
    pub fn new(
        opcode: u16,
        sequence: Sequence,
        mode: CorrelationMode,
        timeout_ms: u32,
        payload: Payload,
    ) -> Self {
        Self {
            opcode,
            sequence,
            mode,
            timeout_ms,
            callback: None,
            event: None,
            payload,
        }
    }

    #[must_use]
    pub fn with_callback(mut self, handle: CallbackHandle) -> Self {
        self.callback = Some(handle);
        self
    }

    #[must_use]
    pub fn with_event(mut self, handle: EventHandle) -> Self {
        self.event = Some(handle);
        self
    }

    /// The decoded opcode, if it is one of the built-in operations.
    pub fn known_opcode(&self) -> Option<Opcode> {
        Opcode::try_from(self.opcode).ok()
    }
}

/// Worker output for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub sequence: Sequence,
    pub status: Status,
    pub payload: Payload,
}

impl Response {
    /// A successful, zero-payload response for `command`.
    #[must_use]
    pub fn for_command(command: &Command) -> Self {
        Self {
            sequence: command.sequence,
            status: Status::Ok,
            payload: Payload::zeroed(),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}
