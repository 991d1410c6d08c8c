//! Structural invariants of the pending-request table.
//!
//! Checked by the table's unit and property tests after every mutation.

use std::collections::HashSet;

use super::pending_table::PendingTable;

/// No sequence occupies more than one slot.
pub fn invariant_unique_sequences(table: &PendingTable) -> bool {
    let mut seen = HashSet::new();
    table.iter().all(|entry| seen.insert(entry.sequence))
}

/// Every entry is reachable from its home slot without crossing an empty slot.
pub fn invariant_chains_unbroken(table: &PendingTable) -> bool {
    let slots = table.slots();
    let capacity = slots.len();
    slots.iter().enumerate().all(|(idx, slot)| {
        let Some(entry) = slot else {
            return true;
        };
        let mut cursor = table.home_slot(entry.sequence);
        while cursor != idx {
            if slots[cursor].is_none() {
                return false;
            }
            cursor = (cursor + 1) % capacity;
        }
        true
    })
}

/// The cached active count matches the occupied slots.
pub fn invariant_active_count(table: &PendingTable) -> bool {
    table.iter().count() == table.len()
}
