//! # Worker Dispatch Table
//!
//! Fixed table of operations the worker can execute. Each handler reads the
//! command payload and writes the response payload and status.
//!
//! | Opcode | Request | Response |
//! |--------|---------|----------|
//! | `Echo` (0x0001) | any bytes | same bytes |
//! | `Add` (0x0002) | `a: i32 @0`, `b: i32 @4` | `a + b: i32 @0` (wrapping) |
//! | `Delay` (0x0020) | `delay_ms: u32 @0` | empty, `Timeout` when clamped |
//! | `Status` (0x00FF) | - | `processed: u32 @0`, `failed: u32 @4`, `uptime_ms: u64 @8` |
//!
//! New operations are added by extending [`OPERATIONS`].

use std::thread;
use std::time::{Duration, Instant};

use shared_types::{Command, Opcode, Response, Status};
use tracing::{debug, warn};

use crate::metrics::Metrics;
use crate::service::task::TaskControl;

/// What a handler may observe about the worker.
pub struct OpContext<'a> {
    pub control: &'a TaskControl,
    pub metrics: &'a Metrics,
    pub started_at: Instant,
    /// Longest uninterrupted sleep inside a handler.
    pub sleep_slice: Duration,
}

pub type OpHandler = fn(&OpContext<'_>, &Command, &mut Response);

/// One entry of the dispatch table.
pub struct Operation {
    pub opcode: Opcode,
    pub handler: OpHandler,
}

pub static OPERATIONS: &[Operation] = &[
    Operation {
        opcode: Opcode::Echo,
        handler: op_echo,
    },
    Operation {
        opcode: Opcode::Add,
        handler: op_add,
    },
    Operation {
        opcode: Opcode::Delay,
        handler: op_delay,
    },
    Operation {
        opcode: Opcode::Status,
        handler: op_status,
    },
];

pub fn lookup(code: u16) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.opcode.code() == code)
}

/// Execute `command` and build its response.
pub fn dispatch(ctx: &OpContext<'_>, command: &Command) -> Response {
    let mut response = Response::for_command(command);
    match lookup(command.opcode) {
        Some(op) => (op.handler)(ctx, command, &mut response),
        None => {
            warn!(sequence = command.sequence, opcode = command.opcode, "Unknown opcode");
            response.status = Status::InvalidCommand;
        }
    }
    response
}

/// Effective delay for a request, and whether it was shortened.
pub fn clamp_delay(requested_ms: u32, timeout_ms: u32) -> (u32, bool) {
    if timeout_ms > 0 && timeout_ms < requested_ms {
        (timeout_ms, true)
    } else {
        (requested_ms, false)
    }
}

fn op_echo(_ctx: &OpContext<'_>, command: &Command, response: &mut Response) {
    response.payload = command.payload;
}

fn op_add(_ctx: &OpContext<'_>, command: &Command, response: &mut Response) {
    let a = command.payload.read_i32(0);
    let b = command.payload.read_i32(4);
    let sum = a.wrapping_add(b);
    debug!(sequence = command.sequence, a, b, sum, "Add");
    response.payload.write_i32(0, sum);
}

fn op_delay(ctx: &OpContext<'_>, command: &Command, response: &mut Response) {
    let requested = command.payload.read_u32(0);
    let (effective, clamped) = clamp_delay(requested, command.timeout_ms);
    if clamped {
        warn!(
            sequence = command.sequence,
            requested_ms = requested,
            timeout_ms = command.timeout_ms,
            "Delay clamped to caller timeout"
        );
    }

    let completed = sleep_unless_stopped(ctx, Duration::from_millis(u64::from(effective)));
    if !completed {
        debug!(sequence = command.sequence, "Delay interrupted by stop request");
    }
    if clamped || !completed {
        response.status = Status::Timeout;
    }
}

fn op_status(ctx: &OpContext<'_>, _command: &Command, response: &mut Response) {
    let snapshot = ctx.metrics.snapshot();
    let uptime_ms = u64::try_from(ctx.started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    response
        .payload
        .write_u32(0, u32::try_from(snapshot.commands_processed).unwrap_or(u32::MAX));
    response
        .payload
        .write_u32(4, u32::try_from(snapshot.commands_failed).unwrap_or(u32::MAX));
    response.payload.write_u64(8, uptime_ms);
}

/// Sleep in slices, returning false if a stop was requested first.
fn sleep_unless_stopped(ctx: &OpContext<'_>, total: Duration) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if ctx.control.stop_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(ctx.sleep_slice.min(deadline - now));
    }
}
