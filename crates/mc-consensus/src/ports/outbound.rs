//! Outbound ports: collaborators the engine depends on.
//!
//! All ports are synchronous. The engine serializes chain mutation under
//! one lock, so async adapters bridge with their own runtimes rather
//! than forcing the hot path to await.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mc_chain_types::{Block, BlockHash, BlockHead, Tx, TxHash, TxReceipt, WitnessId};

/// Where a transaction already lives, relative to a candidate branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxExistence {
    /// Already included in a block on the branch. A second inclusion is
    /// a double spend.
    OnChain,
    /// Sitting in the pending pool, signature already checked there.
    Pending,
    /// Unknown to the pool. The block verifier checks it from scratch.
    NotFound,
}

/// Pending-transaction pool.
pub trait TxPool: Send + Sync {
    /// Fee-ordered snapshot of pending transactions, at most `max` of
    /// them, together with the head hash the snapshot was taken against.
    fn pending(&self, max: usize) -> (Vec<Tx>, BlockHash);

    /// Classifies `tx_hash` against the branch ending at `parent_block`.
    fn exist_txs(&self, tx_hash: &TxHash, parent_block: &BlockHash) -> TxExistence;

    /// Tells the pool a block joined the linked tree, so it can retire
    /// the block's transactions from its pending view.
    fn add_linked_node(&self, block: &Block);

    /// Discards transactions that can never be included, such as expired
    /// ones found during production.
    fn drop_txs(&self, tx_hashes: &[TxHash]);

    /// Freezes the pending view for a snapshot-plus-execution sequence.
    fn lock(&self);

    /// Releases the freeze taken by [`TxPool::lock`].
    fn release(&self);
}

/// Versioned state database. Versions are block hashes; `fork` hands out
/// an isolated working view over the same underlying store, so commits
/// made through a fork are visible to every handle.
pub trait StateDb: Send + Sync {
    /// Moves the working view to `version`. False when no snapshot with
    /// that version exists.
    fn checkout(&self, version: &BlockHash) -> bool;

    /// Tags the working view as `version`.
    fn commit(&self, version: &BlockHash);

    /// Persists everything up to `version` durably.
    fn flush(&self, version: &BlockHash) -> Result<(), String>;

    /// A private working view over the shared store.
    fn fork(&self) -> Arc<dyn StateDb>;

    /// Executes one transaction against the working view, bounded by
    /// `limit`. The receipt records success, failure, or timeout; `Err`
    /// means the backend itself failed.
    fn execute_tx(&self, head: &BlockHead, tx: &Tx, limit: Duration) -> Result<TxReceipt, String>;

    /// Witness list most recently voted in, as of the working view.
    fn pending_witnesses(&self) -> Result<Vec<WitnessId>, String>;
}

/// Finalized-block store.
pub trait ChainStore: Send + Sync {
    /// Appends a finalized block.
    fn push(&self, block: &Block) -> Result<(), String>;

    /// Finalized block by hash.
    fn block_by_hash(&self, hash: &BlockHash) -> Option<Block>;

    /// Finalized block by height.
    fn block_by_number(&self, number: u64) -> Option<Block>;

    /// Highest finalized block, `None` on an empty store.
    fn top(&self) -> Option<Block>;

    /// Count of finalized blocks.
    fn length(&self) -> u64;
}

/// Payload classes carried over the gossip network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A full freshly produced block.
    NewBlock,
    /// A head-only digest advertising a block others may fetch.
    NewBlockDigest,
}

/// Send priority on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    /// Jumps send queues; used for blocks racing a slot boundary.
    Urgent,
}

/// Gossip network handle.
pub trait NetService: Send + Sync {
    /// True while initial sync is still replaying history. Gossip is
    /// suppressed until the node has caught up.
    fn is_catching_up(&self) -> bool;

    /// Broadcasts an encoded payload to all peers.
    fn broadcast(&self, payload: Vec<u8>, kind: MessageKind, priority: Priority);

    /// Announces a verified block to peers as a head digest.
    fn broadcast_block_info(&self, block: &Block);

    /// Keeps direct connections open to the given producers.
    fn connect_block_producers(&self, witnesses: &[WitnessId]);
}

/// Wall-clock abstraction so tests can drive slot timing.
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Production time source backed by the system clock.
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// How a block reached this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSource {
    /// Live gossip from a peer.
    Broadcast,
    /// Historical replay during initial sync. Slot-witness checks are
    /// skipped because the rotation that signed it is long gone.
    Sync,
}

/// A block handed to the engine's verification queue.
#[derive(Debug, Clone)]
pub struct IncomingBlock {
    pub block: Block,
    pub source: BlockSource,
}
