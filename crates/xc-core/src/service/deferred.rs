//! # Deferred Callbacks
//!
//! The monitor never invokes caller code. Callback-mode resolutions are
//! queued in a bounded ring and handed out when the caller drains it from
//! its own context.
//!
//! ```text
//! monitor ──schedule()──▶ [ring, 16 deep] ──drain()──▶ caller's sink
//! ```

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use shared_types::{CallbackHandle, CoreError, Payload};
use tracing::warn;

use crate::domain::Resolution;

/// Bounded queue of `(callback, resolution)` pairs awaiting the caller.
pub struct DeferredCallbacks {
    ring: Mutex<VecDeque<(CallbackHandle, Resolution)>>,
    capacity: usize,
}

impl DeferredCallbacks {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Queue a resolution. Returns false, dropping it, when the ring is full.
    pub fn schedule(&self, handle: CallbackHandle, resolution: Resolution) -> bool {
        let mut ring = self.ring.lock();
        if ring.len() >= self.capacity {
            warn!(
                callback = %handle,
                sequence = resolution.sequence(),
                capacity = self.capacity,
                "Deferred callback ring full, dropping resolution"
            );
            return false;
        }
        ring.push_back((handle, resolution));
        true
    }

    /// Pop queued resolutions one at a time and hand each to `sink`.
    ///
    /// The lock is not held while `sink` runs, so a sink may submit more work.
    pub fn drain(&self, sink: &mut dyn FnMut(CallbackHandle, Resolution)) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.ring.lock().pop_front();
            let Some((handle, resolution)) = next else {
                break;
            };
            sink(handle, resolution);
            delivered += 1;
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

type BoxedCallback = Box<dyn FnOnce(Result<Payload, CoreError>) + Send>;

/// Caller-side map from [`CallbackHandle`] to a one-shot closure.
///
/// Lives in the caller's context; pass [`CallbackRegistry::invoke`] as the
/// sink when draining deferred callbacks.
#[derive(Default)]
pub struct CallbackRegistry {
    next_id: u32,
    callbacks: HashMap<CallbackHandle, BoxedCallback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, callback: F) -> CallbackHandle
    where
        F: FnOnce(Result<Payload, CoreError>) + Send + 'static,
    {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = CallbackHandle(self.next_id);
        self.callbacks.insert(handle, Box::new(callback));
        handle
    }

    /// Run and forget the callback for `handle`. Returns false if unknown.
    pub fn invoke(&mut self, handle: CallbackHandle, resolution: Resolution) -> bool {
        match self.callbacks.remove(&handle) {
            Some(callback) => {
                callback(resolution.into_result());
                true
            }
            None => {
                warn!(callback = %handle, "No callback registered for handle");
                false
            }
        }
    }

    /// Forget a callback whose submission failed.
    pub fn remove(&mut self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
