//! Configuration for the consensus engine.

use serde::Deserialize;

use crate::error::{ConsensusError, ConsensusResult};

/// Default slot length in milliseconds.
pub const DEFAULT_SLOT_DURATION_MS: u64 = 3_000;

/// Default number of consecutive blocks a witness packs into one slot.
pub const DEFAULT_BLOCKS_PER_SLOT: u32 = 6;

/// Default height interval at which the pending witness list is re-read
/// from state.
pub const DEFAULT_VOTE_INTERVAL: u64 = 1_200;

/// Default whole-block re-execution budget in milliseconds.
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 250;

/// Default per-transaction execution limit in milliseconds.
pub const DEFAULT_TX_TIME_LIMIT_MS: u64 = 100;

/// Default ceiling on how far past the head an inbound block may claim
/// to be before it is discarded unseen.
pub const DEFAULT_MAX_AHEAD_BLOCKS: u64 = 1_000;

/// Default cap on transactions pulled into one produced block.
pub const DEFAULT_MAX_TXS_PER_BLOCK: usize = 2_000;

/// Default count of trailing batch positions produced with a shortened
/// execution window, leaving headroom to broadcast before the slot ends.
pub const DEFAULT_TRAILING_LIGHT_BLOCKS: u32 = 2;

/// Default upper bound on the active witness list size.
pub const DEFAULT_MAX_WITNESSES: usize = 17;

/// Runtime configuration for block production, verification, and
/// finality bookkeeping.
#[derive(Clone, Debug, Deserialize)]
pub struct ConsensusConfig {
    /// Slot length in milliseconds. Exactly one witness owns each slot.
    pub slot_duration_ms: u64,
    /// Consecutive blocks each witness produces within its slot.
    pub blocks_per_slot: u32,
    /// Heights between pending witness list reads from state.
    pub vote_interval: u64,
    /// Whole-block re-execution budget during verification, in ms.
    pub verify_timeout_ms: u64,
    /// Per-transaction execution limit, in ms.
    pub tx_time_limit_ms: u64,
    /// Inbound blocks claiming a number further than this past the head
    /// are dropped before signature checks.
    pub max_ahead_blocks: u64,
    /// Cap on transactions pulled from the pool into one produced block.
    pub max_txs_per_block: usize,
    /// How many trailing blocks of a batch get a halved execution window.
    pub trailing_light_blocks: u32,
    /// Upper bound on the active witness list size.
    pub max_witnesses: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            slot_duration_ms: DEFAULT_SLOT_DURATION_MS,
            blocks_per_slot: DEFAULT_BLOCKS_PER_SLOT,
            vote_interval: DEFAULT_VOTE_INTERVAL,
            verify_timeout_ms: DEFAULT_VERIFY_TIMEOUT_MS,
            tx_time_limit_ms: DEFAULT_TX_TIME_LIMIT_MS,
            max_ahead_blocks: DEFAULT_MAX_AHEAD_BLOCKS,
            max_txs_per_block: DEFAULT_MAX_TXS_PER_BLOCK,
            trailing_light_blocks: DEFAULT_TRAILING_LIGHT_BLOCKS,
            max_witnesses: DEFAULT_MAX_WITNESSES,
        }
    }
}

impl ConsensusConfig {
    /// Checks internal consistency. Called once at engine startup.
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.slot_duration_ms == 0 {
            return Err(ConsensusError::InvalidConfig(
                "slot_duration_ms must be positive".into(),
            ));
        }
        if self.blocks_per_slot == 0 {
            return Err(ConsensusError::InvalidConfig(
                "blocks_per_slot must be positive".into(),
            ));
        }
        if u64::from(self.blocks_per_slot) > self.slot_duration_ms {
            return Err(ConsensusError::InvalidConfig(
                "blocks_per_slot must leave each block at least 1 ms".into(),
            ));
        }
        if self.verify_timeout_ms < self.tx_time_limit_ms {
            return Err(ConsensusError::InvalidConfig(
                "verify_timeout_ms must cover at least one tx_time_limit_ms".into(),
            ));
        }
        if self.trailing_light_blocks >= self.blocks_per_slot {
            return Err(ConsensusError::InvalidConfig(
                "trailing_light_blocks must be smaller than blocks_per_slot".into(),
            ));
        }
        if self.max_witnesses == 0 {
            return Err(ConsensusError::InvalidConfig(
                "max_witnesses must be positive".into(),
            ));
        }
        // A pending list read at height H must be able to finalize before
        // the next read at H + vote_interval, so the interval has to span
        // at least one full rotation of batches.
        let rotation = u64::from(self.blocks_per_slot) * self.max_witnesses as u64;
        if self.vote_interval < rotation {
            return Err(ConsensusError::InvalidConfig(format!(
                "vote_interval {} shorter than one rotation of {} blocks",
                self.vote_interval, rotation
            )));
        }
        Ok(())
    }

    /// Length of one batch position within a slot, in ms.
    pub fn sub_slot_ms(&self) -> u64 {
        self.slot_duration_ms / u64::from(self.blocks_per_slot)
    }

    /// Execution window for the block at `serial` within a batch, in ms.
    ///
    /// Trailing positions get half the window so the slot's final blocks
    /// still reach the wire before the next witness takes over.
    pub fn production_window_ms(&self, serial: u32) -> u64 {
        let base = self.sub_slot_ms() * 2 / 3;
        if serial + self.trailing_light_blocks >= self.blocks_per_slot {
            base / 2
        } else {
            base
        }
    }
}
