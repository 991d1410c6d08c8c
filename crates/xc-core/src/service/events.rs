//! # Response Events
//!
//! Event-mode submissions return a [`ResponseEvent`]. The monitor resolves it
//! through the [`EventRegistry`]; the caller polls it or waits on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use shared_types::{CoreError, EventHandle, Payload, Sequence};

use crate::domain::Resolution;

#[derive(Default)]
struct EventState {
    slot: Mutex<Option<Resolution>>,
    ready: Condvar,
}

impl EventState {
    fn set(&self, resolution: Resolution) {
        *self.slot.lock() = Some(resolution);
        self.ready.notify_all();
    }
}

/// Caller's view of one event-mode request.
#[derive(Clone)]
pub struct ResponseEvent {
    handle: EventHandle,
    sequence: Sequence,
    state: Arc<EventState>,
}

impl ResponseEvent {
    pub fn handle(&self) -> EventHandle {
        self.handle
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn is_ready(&self) -> bool {
        self.state.slot.lock().is_some()
    }

    /// The resolution, if it has arrived.
    pub fn resolution(&self) -> Option<Resolution> {
        *self.state.slot.lock()
    }

    /// The result, if it has arrived.
    pub fn try_result(&self) -> Option<Result<Payload, CoreError>> {
        self.resolution().map(Resolution::into_result)
    }

    /// Wait up to `timeout` for the result.
    ///
    /// A zero timeout does not wait: an unresolved event yields
    /// [`CoreError::NotReady`]. Otherwise an unresolved event yields
    /// [`CoreError::Timeout`] once the wait expires.
    pub fn get_result(&self, timeout: Duration) -> Result<Payload, CoreError> {
        let mut slot = self.state.slot.lock();
        if timeout.is_zero() {
            return match *slot {
                Some(resolution) => resolution.into_result(),
                None => Err(CoreError::NotReady),
            };
        }

        let deadline = Instant::now().checked_add(timeout);
        while slot.is_none() {
            match deadline {
                Some(deadline) => {
                    if self.state.ready.wait_until(&mut slot, deadline).timed_out() {
                        break;
                    }
                }
                None => self.state.ready.wait(&mut slot),
            }
        }
        match *slot {
            Some(resolution) => resolution.into_result(),
            None => Err(CoreError::Timeout),
        }
    }
}

/// Events awaiting resolution, keyed by handle.
#[derive(Default)]
pub struct EventRegistry {
    next_id: AtomicU32,
    events: Mutex<HashMap<EventHandle, Arc<EventState>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register an event for `sequence`.
    pub fn create(&self, sequence: Sequence) -> ResponseEvent {
        let handle = EventHandle(self.next_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1));
        let state = Arc::new(EventState::default());
        self.events.lock().insert(handle, Arc::clone(&state));
        ResponseEvent {
            handle,
            sequence,
            state,
        }
    }

    /// Resolve and unregister `handle`. Returns false if it was not registered.
    pub fn signal(&self, handle: EventHandle, resolution: Resolution) -> bool {
        let state = self.events.lock().remove(&handle);
        match state {
            Some(state) => {
                state.set(resolution);
                true
            }
            None => false,
        }
    }

    /// Unregister without resolving.
    pub fn discard(&self, handle: EventHandle) -> bool {
        self.events.lock().remove(&handle).is_some()
    }

    /// Unregister everything, returning how many events were outstanding.
    pub fn clear(&self) -> usize {
        let mut events = self.events.lock();
        let outstanding = events.len();
        events.clear();
        outstanding
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
