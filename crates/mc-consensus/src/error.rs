//! Error types for the consensus engine.

use mc_block_cache::CacheError;
use mc_chain_types::{BlockHash, TxHash, WitnessId};
use thiserror::Error;

/// Convenient result alias used throughout the crate.
pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;

/// Everything that can go wrong while verifying, producing, or
/// finalizing blocks.
///
/// Structural variants describe a block that can never become valid and
/// lead to eviction of the block and its descendants. Resource variants
/// describe collaborator failures that say nothing about the block
/// itself.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The witness signature over the head hash does not verify.
    #[error("invalid block signature")]
    InvalidSignature,

    /// The block carries a different number of receipts than transactions.
    #[error("receipt count {receipts} does not match tx count {txs}")]
    ReceiptCountMismatch {
        /// Transactions in the body.
        txs: usize,
        /// Receipts in the body.
        receipts: usize,
    },

    /// The head's parent hash does not match the parent it was linked under.
    #[error("parent hash mismatch: expected {expected:?}, got {actual:?}")]
    WrongParent {
        /// Hash of the parent node in the cache.
        expected: BlockHash,
        /// Parent hash claimed by the block head.
        actual: BlockHash,
    },

    /// The head's number is not parent number plus one.
    #[error("invalid block number: expected {expected}, got {actual}")]
    InvalidNumber {
        /// Parent number plus one.
        expected: u64,
        /// Number claimed by the block head.
        actual: u64,
    },

    /// The block's timestamp does not advance past its parent.
    #[error("block time {block} not after parent time {parent}")]
    StaleBlockTime {
        /// Timestamp claimed by the block head, in ms.
        block: u64,
        /// Timestamp of the parent head, in ms.
        parent: u64,
    },

    /// The block's timestamp is more than one slot ahead of local time.
    #[error("block time {block} too far ahead of local time {now}")]
    FutureBlockTime {
        /// Timestamp claimed by the block head, in ms.
        block: u64,
        /// Local clock reading, in ms.
        now: u64,
    },

    /// The transaction merkle root in the head does not cover the body.
    #[error("tx merkle root mismatch")]
    TxMerkleMismatch,

    /// The receipt merkle root in the head does not cover the receipts.
    #[error("receipt merkle root mismatch")]
    ReceiptMerkleMismatch,

    /// The same transaction appears twice in one block.
    #[error("duplicate tx {0:?} in block")]
    DuplicateTxInBlock(TxHash),

    /// A transaction in the block is already part of the parent branch.
    #[error("tx {0:?} already on chain")]
    TxOnChain(TxHash),

    /// A transaction's own signature does not verify.
    #[error("invalid signature on tx {0:?}")]
    InvalidTxSignature(TxHash),

    /// A transaction in the block expired before the block's timestamp.
    #[error("tx {0:?} expired before block time")]
    ExpiredTx(TxHash),

    /// The claimed witness is not the one the rotation assigns to the slot.
    #[error("wrong witness for slot: expected {expected:?}, got {actual:?}")]
    WrongWitness {
        /// Witness the rotation assigns to the block's slot.
        expected: WitnessId,
        /// Witness claimed by the block head.
        actual: WitnessId,
    },

    /// A block for this (slot, witness, serial) position was already seen.
    #[error("witness {witness:?} already filled serial {serial} of slot {slot}")]
    SlotOccupied {
        /// Slot index derived from the block time.
        slot: u64,
        /// Witness claimed by the block head.
        witness: WitnessId,
        /// Position within the witness's batch.
        serial: u32,
    },

    /// The block extends a same-slot run past the per-slot batch limit.
    #[error("serial {serial} exceeds the per-slot batch limit {limit}")]
    SerialOutOfRange {
        /// Position within the witness's batch.
        serial: u32,
        /// Configured blocks per slot.
        limit: u32,
    },

    /// Re-execution of the block body ran past its time budget.
    #[error("verification ran past its {limit_ms} ms budget")]
    VerifyTimeout {
        /// Whole-block execution budget, in ms.
        limit_ms: u64,
    },

    /// No state snapshot exists for the requested version.
    #[error("no state snapshot for {0:?}")]
    StateCheckout(BlockHash),

    /// The state database reported a backend failure.
    #[error("state error: {0}")]
    State(String),

    /// The chain store reported a backend failure.
    #[error("chain store error: {0}")]
    ChainStore(String),

    /// A payload could not be encoded for broadcast.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The block is already present in the cache.
    #[error("duplicate block {0:?}")]
    DuplicateBlock(BlockHash),

    /// The block claims a number too far beyond the current head.
    #[error("block number {number} too far beyond head {head}")]
    TooFarAhead {
        /// Number claimed by the block head.
        number: u64,
        /// Current head number.
        head: u64,
    },

    /// The configuration failed validation at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A block cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ConsensusError {
    /// True when the error condemns the block itself, so the block and
    /// everything built on it must be evicted from the cache.
    pub fn condemns_block(&self) -> bool {
        !matches!(
            self,
            Self::StateCheckout(_)
                | Self::State(_)
                | Self::ChainStore(_)
                | Self::Encoding(_)
                | Self::DuplicateBlock(_)
                | Self::TooFarAhead { .. }
                | Self::InvalidConfig(_)
        )
    }

    /// Short stable label for rejection metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::ReceiptCountMismatch { .. } => "receipt_count",
            Self::WrongParent { .. } => "wrong_parent",
            Self::InvalidNumber { .. } => "invalid_number",
            Self::StaleBlockTime { .. } => "stale_time",
            Self::FutureBlockTime { .. } => "future_time",
            Self::TxMerkleMismatch => "tx_merkle",
            Self::ReceiptMerkleMismatch => "receipt_merkle",
            Self::DuplicateTxInBlock(_) => "duplicate_tx",
            Self::TxOnChain(_) => "tx_on_chain",
            Self::InvalidTxSignature(_) => "invalid_tx_signature",
            Self::ExpiredTx(_) => "expired_tx",
            Self::WrongWitness { .. } => "wrong_witness",
            Self::SlotOccupied { .. } => "slot_occupied",
            Self::SerialOutOfRange { .. } => "serial_out_of_range",
            Self::VerifyTimeout { .. } => "verify_timeout",
            Self::StateCheckout(_) => "state_checkout",
            Self::State(_) => "state",
            Self::ChainStore(_) => "chain_store",
            Self::Encoding(_) => "encoding",
            Self::DuplicateBlock(_) => "duplicate_block",
            Self::TooFarAhead { .. } => "too_far_ahead",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Cache(_) => "cache",
        }
    }
}
