//! How a pending request ended.

use shared_types::{CoreError, Payload, Response, Sequence};

/// Final outcome delivered to a callback or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The worker answered. The status may still be an error.
    Completed(Response),
    /// The deadline passed before a response arrived.
    TimedOut { sequence: Sequence },
}

impl Resolution {
    pub fn sequence(&self) -> Sequence {
        match self {
            Resolution::Completed(response) => response.sequence,
            Resolution::TimedOut { sequence } => *sequence,
        }
    }

    /// Raw response, if one arrived.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Resolution::Completed(response) => Some(response),
            Resolution::TimedOut { .. } => None,
        }
    }

    /// The payload on success, otherwise the matching error.
    pub fn into_result(self) -> Result<Payload, CoreError> {
        match self {
            Resolution::Completed(response) => match CoreError::from_status(response.status) {
                None => Ok(response.payload),
                Some(err) => Err(err),
            },
            Resolution::TimedOut { .. } => Err(CoreError::Timeout),
        }
    }
}
