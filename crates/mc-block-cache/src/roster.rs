//! Witness roster snapshots.
//!
//! Every linked node carries the roster view its block was produced under:
//! the active rotation plus the pending list read from state at the last
//! vote boundary. The pending list becomes active only once the node that
//! recorded it is confirmed.

use mc_chain_types::WitnessId;

/// Active and pending witness lists as seen by one branch of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessRoster {
    active: Vec<WitnessId>,
    pending: Vec<WitnessId>,
    /// Height of the block whose state the pending list was read from.
    pending_number: u64,
}

impl WitnessRoster {
    /// Roster at genesis: the pending list doubles as the active one.
    pub fn genesis(witnesses: Vec<WitnessId>) -> Self {
        Self {
            active: witnesses.clone(),
            pending: witnesses,
            pending_number: 0,
        }
    }

    /// The active rotation.
    pub fn active(&self) -> &[WitnessId] {
        &self.active
    }

    /// The pending list awaiting promotion.
    pub fn pending(&self) -> &[WitnessId] {
        &self.pending
    }

    /// Height the pending list was read at.
    pub fn pending_number(&self) -> u64 {
        self.pending_number
    }

    /// Record a fresh pending list read from state at `number`.
    pub fn set_pending(&mut self, pending: Vec<WitnessId>, number: u64) {
        self.pending = pending;
        self.pending_number = number;
    }

    /// Swap in a promoted active rotation.
    pub fn set_active(&mut self, active: Vec<WitnessId>) {
        self.active = active;
    }

    /// Child snapshot: identical to the parent's until a vote boundary
    /// rewrites the pending side.
    pub fn inherit(&self) -> Self {
        self.clone()
    }
}
