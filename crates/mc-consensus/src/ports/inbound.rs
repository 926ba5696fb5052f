//! Inbound ports: the read surface other components query.

use mc_chain_types::{BlockHash, WitnessId};

/// Point-in-time chain position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    /// Preferred tip of the speculative tree.
    pub head_hash: BlockHash,
    pub head_number: u64,
    /// Latest irreversible block.
    pub confirmed_hash: BlockHash,
    pub confirmed_number: u64,
}

/// Read-only consensus status, served to RPC and sync components.
pub trait ChainStatus: Send + Sync {
    /// Current head and confirmed positions.
    fn chain_info(&self) -> ChainInfo;

    /// Active witness rotation, in slot order.
    fn active_witnesses(&self) -> Vec<WitnessId>;

    /// True when `id` is part of the active rotation.
    fn is_witness(&self, id: &WitnessId) -> bool {
        self.active_witnesses().contains(id)
    }
}
