//! # Pending-Request Table
//!
//! Fixed-capacity, open-addressed map from sequence number to in-flight
//! request metadata. All slots are allocated once at construction.
//!
//! ## Probing
//!
//! ```text
//! home = sequence mod N
//!
//!  slot:   0     1     2     3
//!        [   ] [ 1 ] [ 5 ] [ 9 ]     1, 5 and 9 all hash to slot 1 (N = 4)
//!                 └─────┴─────┘      one collision chain, walked left to right
//! ```
//!
//! Lookups stop at the first empty slot. Removal uses backward-shift
//! deletion: entries after the hole are moved back whenever their home slot
//! allows it, so a chain never contains a gap.

use shared_types::{CallbackHandle, CoreError, CorrelationMode, EventHandle, Sequence};
use thiserror::Error;

/// Deadline value for entries registered without a timeout.
pub const NEVER_EXPIRES: u64 = u64::MAX;

/// Registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PendingError {
    #[error("pending table full ({capacity} slots)")]
    Full { capacity: usize },

    #[error("sequence {sequence} already pending")]
    Duplicate { sequence: Sequence },
}

impl From<PendingError> for CoreError {
    fn from(err: PendingError) -> Self {
        match err {
            PendingError::Full { capacity } => CoreError::TableFull { capacity },
            PendingError::Duplicate { sequence } => CoreError::DuplicateSequence { sequence },
        }
    }
}

/// Metadata for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEntry {
    pub sequence: Sequence,
    pub mode: CorrelationMode,
    pub callback: Option<CallbackHandle>,
    pub event: Option<EventHandle>,
    /// Absolute deadline in microseconds, or [`NEVER_EXPIRES`].
    pub deadline_us: u64,
}

impl PendingEntry {
    /// Entry whose deadline is `timeout_ms` after `now_us`. `0` never expires.
    #[must_use]
    pub fn new(sequence: Sequence, mode: CorrelationMode, timeout_ms: u32, now_us: u64) -> Self {
        Self {
            sequence,
            mode,
            callback: None,
            event: None,
            deadline_us: Self::deadline_from(now_us, timeout_ms),
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

    #[must_use]
    pub fn deadline_from(now_us: u64, timeout_ms: u32) -> u64 {
        if timeout_ms == 0 {
            NEVER_EXPIRES
        } else {
            now_us
                .saturating_add(u64::from(timeout_ms) * 1_000)
                .min(NEVER_EXPIRES - 1)
        }
    }

    #[must_use]
    pub fn expires(&self) -> bool {
        self.deadline_us != NEVER_EXPIRES
    }

    #[must_use]
    pub fn is_expired(&self, now_us: u64) -> bool {
        self.expires() && now_us >= self.deadline_us
    }
}

/// Open-addressed table of pending requests.
pub struct PendingTable {
    slots: Box<[Option<PendingEntry>]>,
    active: usize,
}

impl PendingTable {
    /// Create a table with `capacity` slots (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)].into_boxed_slice(),
            active: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active entries.
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    pub fn is_full(&self) -> bool {
        self.active == self.slots.len()
    }

    /// Raw slot view, in index order.
    pub fn slots(&self) -> &[Option<PendingEntry>] {
        &self.slots
    }

    pub fn home_slot(&self, sequence: Sequence) -> usize {
        sequence as usize % self.slots.len()
    }

    /// Insert `entry`, returning the slot it landed in.
    ///
    /// # Errors
    ///
    /// `Full` when no slot is free (the table is left unchanged), `Duplicate`
    /// when the sequence is already active.
    pub fn register(&mut self, entry: PendingEntry) -> Result<usize, PendingError> {
        let capacity = self.slots.len();
        let home = self.home_slot(entry.sequence);
        for step in 0..capacity {
            let idx = (home + step) % capacity;
            match &self.slots[idx] {
                None => {
                    self.slots[idx] = Some(entry);
                    self.active += 1;
                    return Ok(idx);
                }
                Some(existing) if existing.sequence == entry.sequence => {
                    return Err(PendingError::Duplicate {
                        sequence: entry.sequence,
                    });
                }
                Some(_) => {}
            }
        }
        Err(PendingError::Full { capacity })
    }

    pub fn find(&self, sequence: Sequence) -> Option<&PendingEntry> {
        self.slot_of(sequence).and_then(|idx| self.slots[idx].as_ref())
    }

    /// Slot index currently holding `sequence`.
    pub fn slot_of(&self, sequence: Sequence) -> Option<usize> {
        let capacity = self.slots.len();
        let home = self.home_slot(sequence);
        for step in 0..capacity {
            let idx = (home + step) % capacity;
            match &self.slots[idx] {
                None => return None,
                Some(entry) if entry.sequence == sequence => return Some(idx),
                Some(_) => {}
            }
        }
        None
    }

    /// Remove `sequence` and return its entry. Clearing an absent sequence is a no-op.
    pub fn clear(&mut self, sequence: Sequence) -> Option<PendingEntry> {
        let idx = self.slot_of(sequence)?;
        self.remove_at(idx)
    }

    /// Visit every expired entry; those for which `resolve` returns true are removed.
    ///
    /// Returns the number of removed entries.
    pub fn remove_expired<F>(&mut self, now_us: u64, mut resolve: F) -> usize
    where
        F: FnMut(&PendingEntry) -> bool,
    {
        let mut removed = 0;
        for idx in 0..self.slots.len() {
            // A removal may shift a later entry into `idx`, so look again.
            while let Some(entry) = self.slots[idx] {
                if !entry.is_expired(now_us) || !resolve(&entry) {
                    break;
                }
                if self.remove_at(idx).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Remove every entry, returning how many were active.
    pub fn clear_all(&mut self) -> usize {
        let cleared = self.active;
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.active = 0;
        cleared
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEntry> {
        self.slots.iter().flatten()
    }

    fn remove_at(&mut self, idx: usize) -> Option<PendingEntry> {
        let removed = self.slots[idx].take()?;
        self.active -= 1;

        let capacity = self.slots.len();
        let mut hole = idx;
        let mut next = idx;
        loop {
            next = (next + 1) % capacity;
            let Some(candidate) = self.slots[next] else {
                break;
            };
            let home = self.home_slot(candidate.sequence);
            // Stays put only if its home lies cyclically in (hole, next].
            if !cyclically_within(hole, home, next) {
                self.slots[hole] = self.slots[next].take();
                hole = next;
            }
        }
        Some(removed)
    }
}

/// True if `x` lies in the cyclic half-open interval `(start, end]`.
fn cyclically_within(start: usize, x: usize, end: usize) -> bool {
    if start <= end {
        start < x && x <= end
    } else {
        start < x || x <= end
    }
}
