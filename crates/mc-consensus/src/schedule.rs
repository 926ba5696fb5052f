//! Witness rotation schedule.
//!
//! Answers three questions the engine keeps asking: which witness owns a
//! given slot, what watermark a witness's next block must clear, and
//! whether a (slot, witness, serial) position has already been filled.
//! All state sits behind one internal lock so verification and
//! production tasks share a single view.

use std::collections::{BTreeMap, HashMap, HashSet};

use mc_chain_types::WitnessId;
use parking_lot::Mutex;
use tracing::info;

struct ScheduleState {
    /// Active rotation, in slot order.
    active: Vec<WitnessId>,
    /// Per-witness height the next block must reach. Missing entry means 0.
    watermarks: HashMap<WitnessId, u64>,
    /// Filled batch positions, keyed by slot. Pruned as slots finalize.
    occupied: BTreeMap<u64, HashMap<WitnessId, HashSet<u32>>>,
}

/// Shared schedule handle. Cheap to clone behind an `Arc`.
pub struct WitnessSchedule {
    slot_duration_ms: u64,
    state: Mutex<ScheduleState>,
}

impl WitnessSchedule {
    /// Creates a schedule over `active`, with empty watermarks and no
    /// occupied positions.
    pub fn new(slot_duration_ms: u64, active: Vec<WitnessId>) -> Self {
        Self {
            slot_duration_ms,
            state: Mutex::new(ScheduleState {
                active,
                watermarks: HashMap::new(),
                occupied: BTreeMap::new(),
            }),
        }
    }

    /// Slot index for a wall-clock time in ms.
    pub fn slot_of(&self, time_ms: u64) -> u64 {
        time_ms / self.slot_duration_ms
    }

    /// Wall-clock start of a slot, in ms.
    pub fn slot_start_ms(&self, slot: u64) -> u64 {
        slot * self.slot_duration_ms
    }

    /// The witness the rotation assigns to `slot`, or `None` while the
    /// active list is empty.
    pub fn witness_of_slot(&self, slot: u64) -> Option<WitnessId> {
        let state = self.state.lock();
        if state.active.is_empty() {
            return None;
        }
        let idx = (slot % state.active.len() as u64) as usize;
        Some(state.active[idx])
    }

    /// The witness expected to sign a block carrying `time_ms`.
    pub fn witness_of_time(&self, time_ms: u64) -> Option<WitnessId> {
        self.witness_of_slot(self.slot_of(time_ms))
    }

    /// Snapshot of the active rotation.
    pub fn active(&self) -> Vec<WitnessId> {
        self.state.lock().active.clone()
    }

    /// True when `witness` is in the active rotation.
    pub fn contains(&self, witness: &WitnessId) -> bool {
        self.state.lock().active.contains(witness)
    }

    /// Replaces the active rotation once a later list finalizes. A no-op
    /// when the list is unchanged.
    pub fn update_witness_list(&self, list: Vec<WitnessId>) {
        let mut state = self.state.lock();
        if state.active == list {
            return;
        }
        info!(
            "[consensus] witness rotation updated: {} -> {} members",
            state.active.len(),
            list.len()
        );
        state.active = list;
    }

    /// Returns the watermark a block by `witness` at `number` must honor,
    /// then raises the stored watermark to `number + 1` when the block
    /// clears it. Blocks below the watermark keep it unchanged so their
    /// votes stay expired.
    pub fn advance_watermark(&self, witness: &WitnessId, number: u64) -> u64 {
        let mut state = self.state.lock();
        let current = state.watermarks.get(witness).copied().unwrap_or(0);
        if number >= current {
            state.watermarks.insert(*witness, number + 1);
        }
        current
    }

    /// Current watermark for `witness`, defaulting to 0.
    pub fn watermark(&self, witness: &WitnessId) -> u64 {
        self.state.lock().watermarks.get(witness).copied().unwrap_or(0)
    }

    /// True when a block already fills `serial` of `witness`'s batch in
    /// `slot`.
    pub fn has_slot(&self, slot: u64, witness: &WitnessId, serial: u32) -> bool {
        let state = self.state.lock();
        state
            .occupied
            .get(&slot)
            .and_then(|by_witness| by_witness.get(witness))
            .is_some_and(|serials| serials.contains(&serial))
    }

    /// Marks a batch position filled. Returns false when it already was,
    /// leaving the existing claim in place.
    pub fn occupy_slot(&self, slot: u64, witness: &WitnessId, serial: u32) -> bool {
        let mut state = self.state.lock();
        state
            .occupied
            .entry(slot)
            .or_default()
            .entry(*witness)
            .or_default()
            .insert(serial)
    }

    /// Drops occupancy records for every slot up to and including `slot`.
    /// Called as finalized ranges make those positions unrepeatable.
    pub fn release_through(&self, slot: u64) {
        let mut state = self.state.lock();
        state.occupied = state.occupied.split_off(&(slot + 1));
    }

    /// Number of slots still carrying occupancy records.
    pub fn occupied_slots(&self) -> usize {
        self.state.lock().occupied.len()
    }

    /// Milliseconds until the start of `witness`'s next slot, or 0 when
    /// the current slot is already theirs. A witness outside the rotation
    /// waits one slot and asks again.
    pub fn time_until_next_slot(&self, now_ms: u64, witness: &WitnessId) -> u64 {
        let state = self.state.lock();
        let Some(index) = state.active.iter().position(|w| w == witness) else {
            return self.slot_duration_ms;
        };
        let rotation = state.active.len() as u64;
        let current_slot = now_ms / self.slot_duration_ms;
        let round_base = (current_slot / rotation) * rotation;
        let mine_this_round = round_base + index as u64;
        let next = if mine_this_round >= current_slot {
            mine_this_round
        } else {
            mine_this_round + rotation
        };
        if next == current_slot {
            0
        } else {
            self.slot_start_ms(next) - now_ms
        }
    }
}
