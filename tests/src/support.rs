//! In-memory port adapters and chain fixtures shared by the integration
//! tests and benchmarks.
//!
//! The adapters model the collaborator contracts faithfully enough for
//! end-to-end flows: the state database is a shared version set, the
//! pool retires transactions as blocks link, and the network records
//! what would have gone on the wire.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mc_chain_types::{
    Block, BlockHash, BlockHead, Ed25519KeyPair, StatusCode, Tx, TxHash, TxReceipt, WitnessId,
    BLOCK_VERSION,
};
use mc_consensus::{
    BlockOutcome, BlockSource, ChainStore, ConsensusConfig, ConsensusEngine, ConsensusResult,
    EngineDependencies, IncomingBlock, MessageKind, NetService, Priority, StateDb, TimeSource,
    TxExistence, TxPool,
};
use parking_lot::Mutex;

/// Engine type all integration tests run against.
pub type Node = ConsensusEngine<MemoryTxPool, MemoryStateDb, MemoryChainStore, RecordingNet>;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Settable wall clock.
#[derive(Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(ms)))
    }
    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::Relaxed);
    }
    pub fn now(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl TimeSource for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now()
    }
}

// ---------------------------------------------------------------------------
// Transaction pool
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PoolState {
    pending: Vec<Tx>,
    in_pool: HashSet<TxHash>,
    on_chain: HashSet<TxHash>,
    linked: Vec<BlockHash>,
    dropped: Vec<TxHash>,
    lock_depth: i64,
    locks_taken: u64,
}

/// Pool that retires transactions as their blocks link.
#[derive(Clone, Default)]
pub struct MemoryTxPool(Arc<Mutex<PoolState>>);

impl MemoryTxPool {
    pub fn submit(&self, tx: Tx) {
        let mut state = self.0.lock();
        state.in_pool.insert(tx.hash());
        state.pending.push(tx);
    }
    pub fn linked(&self) -> Vec<BlockHash> {
        self.0.lock().linked.clone()
    }
    pub fn dropped(&self) -> Vec<TxHash> {
        self.0.lock().dropped.clone()
    }
    pub fn is_on_chain(&self, tx_hash: &TxHash) -> bool {
        self.0.lock().on_chain.contains(tx_hash)
    }
    pub fn lock_depth(&self) -> i64 {
        self.0.lock().lock_depth
    }
    pub fn locks_taken(&self) -> u64 {
        self.0.lock().locks_taken
    }
}

impl TxPool for MemoryTxPool {
    fn pending(&self, max: usize) -> (Vec<Tx>, BlockHash) {
        let state = self.0.lock();
        let mut txs = state.pending.clone();
        txs.truncate(max);
        (txs, [0u8; 32])
    }
    fn exist_txs(&self, tx_hash: &TxHash, _parent_block: &BlockHash) -> TxExistence {
        let state = self.0.lock();
        if state.on_chain.contains(tx_hash) {
            TxExistence::OnChain
        } else if state.in_pool.contains(tx_hash) {
            TxExistence::Pending
        } else {
            TxExistence::NotFound
        }
    }
    fn add_linked_node(&self, block: &Block) {
        let mut state = self.0.lock();
        state.linked.push(block.hash());
        for tx in &block.txs {
            let hash = tx.hash();
            state.in_pool.remove(&hash);
            state.on_chain.insert(hash);
        }
        let on_chain = state.on_chain.clone();
        state.pending.retain(|tx| !on_chain.contains(&tx.hash()));
    }
    fn drop_txs(&self, tx_hashes: &[TxHash]) {
        let mut state = self.0.lock();
        state.dropped.extend_from_slice(tx_hashes);
        let doomed: HashSet<TxHash> = tx_hashes.iter().copied().collect();
        state.pending.retain(|tx| !doomed.contains(&tx.hash()));
        for hash in &doomed {
            state.in_pool.remove(hash);
        }
    }
    fn lock(&self) {
        let mut state = self.0.lock();
        state.lock_depth += 1;
        state.locks_taken += 1;
    }
    fn release(&self) {
        self.0.lock().lock_depth -= 1;
    }
}

// ---------------------------------------------------------------------------
// State database
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StateVersions {
    versions: HashSet<BlockHash>,
    flushed: Vec<BlockHash>,
    pending_witnesses: Vec<WitnessId>,
    failing: HashSet<TxHash>,
}

/// Versioned state over a shared version set; every fork sees the same
/// store, as the port contract promises.
#[derive(Clone, Default)]
pub struct MemoryStateDb(Arc<Mutex<StateVersions>>);

impl MemoryStateDb {
    pub fn seeded(genesis: BlockHash, witnesses: Vec<WitnessId>) -> Self {
        let state = Self::default();
        {
            let mut inner = state.0.lock();
            inner.versions.insert(genesis);
            inner.pending_witnesses = witnesses;
        }
        state
    }
    pub fn has_version(&self, hash: &BlockHash) -> bool {
        self.0.lock().versions.contains(hash)
    }
    pub fn flushed(&self) -> Vec<BlockHash> {
        self.0.lock().flushed.clone()
    }
    pub fn set_pending_witnesses(&self, witnesses: Vec<WitnessId>) {
        self.0.lock().pending_witnesses = witnesses;
    }
    /// Marks a transaction as reverting when executed.
    pub fn fail_tx(&self, tx_hash: TxHash) {
        self.0.lock().failing.insert(tx_hash);
    }
}

impl StateDb for MemoryStateDb {
    fn checkout(&self, version: &BlockHash) -> bool {
        self.0.lock().versions.contains(version)
    }
    fn commit(&self, version: &BlockHash) {
        self.0.lock().versions.insert(*version);
    }
    fn flush(&self, version: &BlockHash) -> Result<(), String> {
        self.0.lock().flushed.push(*version);
        Ok(())
    }
    fn fork(&self) -> Arc<dyn StateDb> {
        Arc::new(self.clone())
    }
    fn execute_tx(&self, _head: &BlockHead, tx: &Tx, _limit: Duration) -> Result<TxReceipt, String> {
        let hash = tx.hash();
        if self.0.lock().failing.contains(&hash) {
            return Ok(TxReceipt {
                tx_hash: hash,
                status: StatusCode::Failed,
                gas_usage: 0,
                message: "reverted".into(),
            });
        }
        Ok(success_receipt(tx))
    }
    fn pending_witnesses(&self) -> Result<Vec<WitnessId>, String> {
        Ok(self.0.lock().pending_witnesses.clone())
    }
}

// ---------------------------------------------------------------------------
// Chain store
// ---------------------------------------------------------------------------

/// Append-only finalized chain.
#[derive(Clone, Default)]
pub struct MemoryChainStore(Arc<Mutex<Vec<Block>>>);

impl MemoryChainStore {
    pub fn seeded(genesis: Block) -> Self {
        let store = Self::default();
        store.0.lock().push(genesis);
        store
    }
    pub fn numbers(&self) -> Vec<u64> {
        self.0.lock().iter().map(|b| b.head.number).collect()
    }
}

impl ChainStore for MemoryChainStore {
    fn push(&self, block: &Block) -> Result<(), String> {
        self.0.lock().push(block.clone());
        Ok(())
    }
    fn block_by_hash(&self, hash: &BlockHash) -> Option<Block> {
        self.0.lock().iter().find(|b| b.hash() == *hash).cloned()
    }
    fn block_by_number(&self, number: u64) -> Option<Block> {
        self.0
            .lock()
            .iter()
            .find(|b| b.head.number == number)
            .cloned()
    }
    fn top(&self) -> Option<Block> {
        self.0.lock().last().cloned()
    }
    fn length(&self) -> u64 {
        self.0.lock().len() as u64
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Default)]
struct NetLog {
    catching_up: bool,
    broadcasts: Vec<(Vec<u8>, MessageKind, Priority)>,
    infos: Vec<BlockHash>,
    producer_calls: usize,
}

/// Records everything that would have gone on the wire.
#[derive(Clone, Default)]
pub struct RecordingNet(Arc<Mutex<NetLog>>);

impl RecordingNet {
    pub fn set_catching_up(&self, value: bool) {
        self.0.lock().catching_up = value;
    }
    /// Drains recorded full-block payloads in send order.
    pub fn take_broadcast_payloads(&self) -> Vec<Vec<u8>> {
        let mut log = self.0.lock();
        log.broadcasts.drain(..).map(|(payload, _, _)| payload).collect()
    }
    pub fn broadcast_kinds(&self) -> Vec<(MessageKind, Priority)> {
        self.0
            .lock()
            .broadcasts
            .iter()
            .map(|(_, kind, priority)| (*kind, *priority))
            .collect()
    }
    pub fn infos(&self) -> Vec<BlockHash> {
        self.0.lock().infos.clone()
    }
    pub fn producer_calls(&self) -> usize {
        self.0.lock().producer_calls
    }
}

impl NetService for RecordingNet {
    fn is_catching_up(&self) -> bool {
        self.0.lock().catching_up
    }
    fn broadcast(&self, payload: Vec<u8>, kind: MessageKind, priority: Priority) {
        self.0.lock().broadcasts.push((payload, kind, priority));
    }
    fn broadcast_block_info(&self, block: &Block) {
        self.0.lock().infos.push(block.hash());
    }
    fn connect_block_producers(&self, _witnesses: &[WitnessId]) {
        self.0.lock().producer_calls += 1;
    }
}

// ---------------------------------------------------------------------------
// Chain fixtures
// ---------------------------------------------------------------------------

/// Deterministic witness keypairs, seeds 1..=n.
pub fn witness_keys(n: u8) -> Vec<Ed25519KeyPair> {
    (1..=n).map(|i| Ed25519KeyPair::from_seed([i; 32])).collect()
}

pub fn witness_set(keys: &[Ed25519KeyPair]) -> Vec<WitnessId> {
    keys.iter().map(|k| *k.public_key().as_bytes()).collect()
}

pub fn success_receipt(tx: &Tx) -> TxReceipt {
    TxReceipt {
        tx_hash: tx.hash(),
        status: StatusCode::Success,
        gas_usage: 21,
        message: String::new(),
    }
}

/// Transaction signed by a publisher outside the witness set.
pub fn signed_tx(seed: u8, expiration: u64) -> Tx {
    let key = Ed25519KeyPair::from_seed([seed.wrapping_add(100); 32]);
    let mut tx = Tx {
        time: 1,
        expiration,
        gas_price: 1,
        gas_limit: 10_000,
        publisher: [0u8; 32],
        payload: vec![seed],
        signature: [0u8; 64],
    };
    tx.sign(&key);
    tx
}

pub fn genesis_block(keys: &[Ed25519KeyPair]) -> Block {
    let mut block = Block {
        head: BlockHead {
            version: BLOCK_VERSION,
            parent_hash: [0u8; 32],
            tx_merkle_root: [0u8; 32],
            receipt_merkle_root: [0u8; 32],
            number: 0,
            witness: *keys[0].public_key().as_bytes(),
            time: 0,
            signature: [0u8; 64],
        },
        txs: Vec::new(),
        receipts: Vec::new(),
    };
    block.seal(&keys[0]);
    block
}

/// Child block with receipts matching what [`MemoryStateDb`] executes.
pub fn block_on(parent: &BlockHead, key: &Ed25519KeyPair, time: u64, txs: Vec<Tx>) -> Block {
    let receipts = txs.iter().map(success_receipt).collect();
    let mut block = Block {
        head: BlockHead {
            version: BLOCK_VERSION,
            parent_hash: parent.hash(),
            tx_merkle_root: [0u8; 32],
            receipt_merkle_root: [0u8; 32],
            number: parent.number + 1,
            witness: *key.public_key().as_bytes(),
            time,
            signature: [0u8; 64],
        },
        txs,
        receipts,
    };
    block.seal(key);
    block
}

pub fn default_config(witnesses: usize) -> ConsensusConfig {
    ConsensusConfig {
        slot_duration_ms: 3_000,
        blocks_per_slot: 2,
        vote_interval: 20,
        max_ahead_blocks: 100,
        max_txs_per_block: 100,
        trailing_light_blocks: 1,
        max_witnesses: witnesses,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// One engine with handles to all of its collaborators.
pub struct TestNode {
    pub engine: Arc<Node>,
    pub clock: ManualClock,
    pub pool: MemoryTxPool,
    pub state: MemoryStateDb,
    pub store: MemoryChainStore,
    pub net: RecordingNet,
}

/// Builds an engine over the given collaborators, signing with the key
/// derived from `signer_seed`. Witness `i` of [`witness_keys`] signs
/// with seed `i + 1`; any other seed yields an outsider identity.
pub fn node_over(
    signer_seed: u8,
    config: ConsensusConfig,
    pool: MemoryTxPool,
    state: MemoryStateDb,
    store: MemoryChainStore,
) -> TestNode {
    let net = RecordingNet::default();
    let clock = ManualClock::at(100);
    let deps = EngineDependencies {
        tx_pool: Arc::new(pool.clone()),
        state_db: Arc::new(state.clone()),
        chain_store: Arc::new(store.clone()),
        net: Arc::new(net.clone()),
        keypair: Ed25519KeyPair::from_seed([signer_seed; 32]),
        config,
    };
    let engine = ConsensusEngine::new(deps)
        .expect("engine construction")
        .with_time_source(Box::new(clock.clone()));
    TestNode {
        engine: Arc::new(engine),
        clock,
        pool,
        state,
        store,
        net,
    }
}

/// Fresh node over its own genesis-seeded universe.
pub fn fresh_node(keys: &[Ed25519KeyPair], signer_seed: u8, config: ConsensusConfig) -> TestNode {
    let genesis = genesis_block(keys);
    let store = MemoryChainStore::seeded(genesis.clone());
    let state = MemoryStateDb::seeded(genesis.hash(), witness_set(keys));
    node_over(signer_seed, config, MemoryTxPool::default(), state, store)
}

/// Feeds a block as live gossip, advancing the clock past its time.
/// The clock only moves forward; parked descendants are verified at
/// link time and must not see an earlier clock than their arrival did.
pub fn feed(node: &TestNode, block: Block) -> ConsensusResult<BlockOutcome> {
    let target = block.head.time + 100;
    if node.clock.now() < target {
        node.clock.set(target);
    }
    node.engine.receive_block(IncomingBlock {
        block,
        source: BlockSource::Broadcast,
    })
}
