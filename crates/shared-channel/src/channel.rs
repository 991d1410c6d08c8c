//! # Bounded Channel
//!
//! A fixed-capacity FIFO guarded by a `parking_lot` mutex with two condition
//! variables. Every blocking operation takes a timeout; `Duration::ZERO`
//! makes it a non-blocking attempt.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

use crate::errors::{ChannelError, SendError};

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
}

#[derive(Clone, Copy)]
enum End {
    Front,
    Back,
}

/// Bounded multi-producer, multi-consumer FIFO.
pub struct BoundedChannel<T> {
    name: &'static str,
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedChannel<T> {
    /// Create a channel that holds at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(name: &'static str, capacity: usize) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }
        Ok(Self {
            name,
            capacity,
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }

    /// Append `item`, waiting up to `timeout` for space.
    pub fn send(&self, item: T, timeout: Duration) -> Result<(), SendError<T>> {
        self.push(item, timeout, End::Back)
    }

    /// Prepend `item` so it is the next one received, waiting up to `timeout` for space.
    pub fn send_front(&self, item: T, timeout: Duration) -> Result<(), SendError<T>> {
        self.push(item, timeout, End::Front)
    }

    /// Put back an item this caller just received, ahead of everything else.
    ///
    /// The slot it occupied may already have been taken by a producer, so
    /// the capacity check is skipped and the queue can briefly hold one item
    /// more than `capacity`. Fails only when the channel is closed.
    pub fn restore_front(&self, item: T) -> Result<(), SendError<T>> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SendError {
                    kind: ChannelError::Closed,
                    item,
                });
            }
            state.queue.push_front(item);
        }
        self.not_empty.notify_all();
        Ok(())
    }

    pub fn try_send(&self, item: T) -> Result<(), SendError<T>> {
        self.send(item, Duration::ZERO)
    }

    /// Take the oldest item, waiting up to `timeout` for one to arrive.
    pub fn receive(&self, timeout: Duration) -> Result<T, ChannelError> {
        self.receive_matching(|_| true, timeout)
    }

    pub fn try_receive(&self) -> Result<T, ChannelError> {
        self.receive(Duration::ZERO)
    }

    /// Take the oldest item satisfying `predicate`, waiting up to `timeout`.
    ///
    /// Items that do not match stay queued in their original order.
    pub fn receive_matching<F>(
        &self,
        mut predicate: F,
        timeout: Duration,
    ) -> Result<T, ChannelError>
    where
        F: FnMut(&T) -> bool,
    {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();
        let mut timed_out = false;
        loop {
            let position = state.queue.iter().position(&mut predicate);
            if let Some(item) = position.and_then(|pos| state.queue.remove(pos)) {
                drop(state);
                self.not_full.notify_one();
                return Ok(item);
            }
            if state.closed {
                return Err(ChannelError::Closed);
            }
            if timed_out {
                return Err(ChannelError::Empty);
            }
            timed_out = wait(&self.not_empty, &mut state, deadline);
        }
    }

    /// Close the channel and return everything still queued.
    ///
    /// Wakes all waiters; later sends and receives fail with `Closed`.
    pub fn close(&self) -> Vec<T> {
        let drained: Vec<T> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.queue.drain(..).collect()
        };
        self.not_empty.notify_all();
        self.not_full.notify_all();
        debug!(channel = self.name, drained = drained.len(), "Channel closed");
        drained
    }

    /// Remove and return everything queued without closing.
    pub fn drain(&self) -> Vec<T> {
        let drained: Vec<T> = self.state.lock().queue.drain(..).collect();
        self.not_full.notify_all();
        drained
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn push(&self, item: T, timeout: Duration, end: End) -> Result<(), SendError<T>> {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();
        let mut timed_out = false;
        loop {
            if state.closed {
                return Err(SendError {
                    kind: ChannelError::Closed,
                    item,
                });
            }
            if state.queue.len() < self.capacity {
                match end {
                    End::Back => state.queue.push_back(item),
                    End::Front => state.queue.push_front(item),
                }
                drop(state);
                // Blocking callers filter by predicate, so every receiver must re-check.
                self.not_empty.notify_all();
                return Ok(());
            }
            if timed_out {
                return Err(SendError {
                    kind: ChannelError::Full,
                    item,
                });
            }
            timed_out = wait(&self.not_full, &mut state, deadline);
        }
    }
}

/// `None` means wait without a deadline.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Wait on `condvar`; returns true once the deadline has passed.
fn wait<T>(
    condvar: &Condvar,
    guard: &mut MutexGuard<'_, State<T>>,
    deadline: Option<Instant>,
) -> bool {
    match deadline {
        Some(deadline) => condvar.wait_until(guard, deadline).timed_out(),
        None => {
            condvar.wait(guard);
            false
        }
    }
}
