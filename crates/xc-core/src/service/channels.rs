//! The command/response channel pair owned by an initialized runtime.

use std::sync::Arc;

use shared_channel::{BoundedChannel, ChannelError};
use shared_types::{Command, CoreError, Response};

use crate::config::CoreConfig;

/// Command and response channels for one init/shutdown cycle.
#[derive(Clone)]
pub struct Channels {
    pub commands: Arc<BoundedChannel<Command>>,
    pub responses: Arc<BoundedChannel<Response>>,
}

impl Channels {
    pub fn open(config: &CoreConfig) -> Result<Self, CoreError> {
        let commands = BoundedChannel::new("commands", config.command_queue_capacity)
            .map_err(channel_error)?;
        let responses = BoundedChannel::new("responses", config.response_queue_capacity)
            .map_err(channel_error)?;
        Ok(Self {
            commands: Arc::new(commands),
            responses: Arc::new(responses),
        })
    }

    /// Close both channels, returning what was still queued.
    pub fn close(&self) -> (Vec<Command>, Vec<Response>) {
        (self.commands.close(), self.responses.close())
    }
}

/// Caller-facing error for a failed channel operation.
pub fn channel_error(err: ChannelError) -> CoreError {
    match err {
        ChannelError::Full => CoreError::QueueFull,
        ChannelError::Empty => CoreError::Timeout,
        ChannelError::Closed => CoreError::ShuttingDown,
        ChannelError::ZeroCapacity => {
            CoreError::InvalidConfig("channel capacity must be non-zero".to_string())
        }
    }
}
