//! The consensus engine.
//!
//! Owns the speculative block tree and drives three loops: a verify loop
//! draining the inbound block queue, a production loop that wakes for
//! this node's slots, and a cleanup loop pruning slot occupancy records
//! as heights finalize. All chain mutation funnels through one lock on
//! the cache; produced blocks re-enter through the same path received
//! blocks take, so there is a single place where the tree changes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mc_block_cache::{AddOutcome, BlockCache, CacheError, NodeKind, WitnessRoster};
use mc_chain_types::{
    Block, BlockHash, BlockHead, Ed25519KeyPair, StatusCode, TxHash, WitnessId, BLOCK_VERSION,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ConsensusConfig;
use crate::error::{ConsensusError, ConsensusResult};
use crate::metrics;
use crate::ports::inbound::{ChainInfo, ChainStatus};
use crate::ports::outbound::{
    BlockSource, ChainStore, IncomingBlock, MessageKind, NetService, Priority, StateDb,
    SystemTimeSource, TimeSource, TxPool,
};
use crate::schedule::WitnessSchedule;
use crate::verify::{verify_basics, verify_block, VerifyContext};


/// Depth of the queue carrying finalized slot ranges to the cleanup loop.
const CLEANUP_QUEUE_DEPTH: usize = 64;

/// How a block entered the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provenance {
    /// Produced locally. Its state version is already committed and its
    /// slot position was claimed at production time.
    Produced,
    /// Received from the network.
    Received {
        /// Historical replay during initial sync.
        replay: bool,
    },
}

/// What became of a block handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Verified and linked. Parked descendants may have linked behind it.
    Linked,
    /// Waiting in the cache until its parent arrives.
    Parked,
}

/// Finalized slot range handed to the cleanup loop.
#[derive(Debug, Clone, Copy)]
struct CleanupTask {
    through_slot: u64,
}

/// Collaborators and configuration handed to [`ConsensusEngine::new`].
pub struct EngineDependencies<T, S, C, N>
where
    T: TxPool,
    S: StateDb,
    C: ChainStore,
    N: NetService,
{
    pub tx_pool: Arc<T>,
    pub state_db: Arc<S>,
    pub chain_store: Arc<C>,
    pub net: Arc<N>,
    /// Witness identity this node signs with.
    pub keypair: Ed25519KeyPair,
    pub config: ConsensusConfig,
}

/// Fork-aware consensus engine over pluggable collaborators.
pub struct ConsensusEngine<T, S, C, N>
where
    T: TxPool,
    S: StateDb,
    C: ChainStore,
    N: NetService,
{
    tx_pool: Arc<T>,
    state_db: Arc<S>,
    chain_store: Arc<C>,
    net: Arc<N>,
    keypair: Ed25519KeyPair,
    witness_id: WitnessId,
    config: ConsensusConfig,
    cache: Mutex<BlockCache>,
    schedule: WitnessSchedule,
    time_source: Box<dyn TimeSource>,
    cleanup_tx: mpsc::Sender<CleanupTask>,
    /// Taken by the cleanup loop on start.
    cleanup_rx: Mutex<Option<mpsc::Receiver<CleanupTask>>>,
}

impl<T, S, C, N> ConsensusEngine<T, S, C, N>
where
    T: TxPool + 'static,
    S: StateDb + 'static,
    C: ChainStore + 'static,
    N: NetService + 'static,
{
    /// Builds the engine from the durable tail: the cache is rooted at
    /// the chain store's top block and the rotation starts from the
    /// witness list the state holds at that block.
    pub fn new(deps: EngineDependencies<T, S, C, N>) -> ConsensusResult<Self> {
        deps.config.validate()?;

        let root = deps.chain_store.top().ok_or_else(|| {
            ConsensusError::ChainStore("empty chain store; seed a genesis block first".into())
        })?;
        let root_hash = root.hash();
        if !deps.state_db.checkout(&root_hash) {
            return Err(ConsensusError::StateCheckout(root_hash));
        }
        let witnesses = deps
            .state_db
            .pending_witnesses()
            .map_err(ConsensusError::State)?;
        if witnesses.is_empty() {
            return Err(ConsensusError::State(
                "state holds no witness list at the root block".into(),
            ));
        }
        if witnesses.len() > deps.config.max_witnesses {
            warn!(
                "[consensus] state returned {} witnesses, above the configured cap of {}",
                witnesses.len(),
                deps.config.max_witnesses
            );
        }

        let witness_id = *deps.keypair.public_key().as_bytes();
        let schedule = WitnessSchedule::new(deps.config.slot_duration_ms, witnesses.clone());
        let cache = BlockCache::new(root.clone(), WitnessRoster::genesis(witnesses));
        let (cleanup_tx, cleanup_rx) = mpsc::channel(CLEANUP_QUEUE_DEPTH);

        info!(
            "[consensus] engine rooted at block {} with {} active witnesses",
            root.head.number,
            schedule.active().len()
        );

        Ok(Self {
            tx_pool: deps.tx_pool,
            state_db: deps.state_db,
            chain_store: deps.chain_store,
            net: deps.net,
            keypair: deps.keypair,
            witness_id,
            config: deps.config,
            cache: Mutex::new(cache),
            schedule,
            time_source: Box::new(SystemTimeSource),
            cleanup_tx,
            cleanup_rx: Mutex::new(Some(cleanup_rx)),
        })
    }

    /// Replaces the wall clock, for tests that drive slot timing.
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// This node's witness identity.
    pub fn witness_id(&self) -> &WitnessId {
        &self.witness_id
    }

    /// Spawns the verify, production, and cleanup loops. All three stop
    /// when `shutdown` flips to true.
    pub fn start(
        self: &Arc<Self>,
        mut blocks_rx: mpsc::Receiver<IncomingBlock>,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(3);

        let engine = Arc::clone(self);
        let mut verify_shutdown = shutdown.clone();
        handles.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = verify_shutdown.changed() => break,
                    incoming = blocks_rx.recv() => match incoming {
                        Some(incoming) => engine.handle_incoming(incoming),
                        None => break,
                    },
                }
            }
            debug!("[consensus] verify loop stopped");
        }));

        handles.push(tokio::spawn(
            Arc::clone(self).production_loop(shutdown.clone()),
        ));

        let engine = Arc::clone(self);
        let mut cleanup_shutdown = shutdown;
        let taken = engine.cleanup_rx.lock().take();
        handles.push(tokio::spawn(async move {
            let Some(mut rx) = taken else {
                warn!("[consensus] cleanup loop already running");
                return;
            };
            loop {
                tokio::select! {
                    _ = cleanup_shutdown.changed() => break,
                    task = rx.recv() => match task {
                        Some(task) => {
                            engine.schedule.release_through(task.through_slot);
                            debug!(
                                "[consensus] released slot occupancy through slot {}",
                                task.through_slot
                            );
                        }
                        None => break,
                    },
                }
            }
            debug!("[consensus] cleanup loop stopped");
        }));

        info!("[consensus] engine started");
        handles
    }

    /// Verify-loop body: classify, verify, and absorb one inbound block,
    /// logging instead of propagating so one bad block never stops the
    /// loop.
    pub fn handle_incoming(&self, incoming: IncomingBlock) {
        let number = incoming.block.head.number;
        match self.receive_block(incoming) {
            Ok(BlockOutcome::Linked) => {}
            Ok(BlockOutcome::Parked) => {
                debug!("[consensus] parked block {number} until its parent arrives");
            }
            Err(ConsensusError::DuplicateBlock(_)) => {
                debug!("[consensus] ignored duplicate block {number}");
            }
            Err(e) => {
                warn!("[consensus] rejected block {number}: {e}");
            }
        }
    }

    /// Absorbs one block from the network: cheap structural checks, then
    /// the shared admission path.
    pub fn receive_block(&self, incoming: IncomingBlock) -> ConsensusResult<BlockOutcome> {
        let IncomingBlock { block, source } = incoming;
        let head_number = self.cache.lock().head().number();
        if block.head.number > head_number + self.config.max_ahead_blocks {
            let e = ConsensusError::TooFarAhead {
                number: block.head.number,
                head: head_number,
            };
            metrics::record_block_rejected(e.reason());
            return Err(e);
        }
        if let Err(e) = verify_basics(&block) {
            metrics::record_block_rejected(e.reason());
            return Err(e);
        }
        let replay = source == BlockSource::Sync;
        self.accept_block(block, Provenance::Received { replay })
    }

    /// The single admission path for produced and received blocks alike.
    fn accept_block(&self, block: Block, provenance: Provenance) -> ConsensusResult<BlockOutcome> {
        let hash = block.hash();
        let mut gossip = Vec::new();

        let outcome = {
            let mut cache = self.cache.lock();
            match cache.add(block) {
                AddOutcome::Duplicate(h) => return Err(ConsensusError::DuplicateBlock(h)),
                AddOutcome::Parked(_) => BlockOutcome::Parked,
                AddOutcome::Attached(_) => {
                    self.link_descendants(&mut cache, hash, provenance, &mut gossip)?;
                    BlockOutcome::Linked
                }
            }
        };

        // Network duties run outside the cache lock.
        if outcome == BlockOutcome::Linked {
            if !gossip.is_empty() && !self.net.is_catching_up() {
                for linked in &gossip {
                    self.net.broadcast_block_info(linked);
                }
            }
            if self.schedule.contains(&self.witness_id) {
                self.net.connect_block_producers(&self.schedule.active());
            }
        }
        Ok(outcome)
    }

    /// Links `first` and then every parked descendant that becomes
    /// linkable behind it, evicting any subtree whose head fails
    /// verification. The caller's error is the first block's alone;
    /// descendant failures are logged and absorbed.
    fn link_descendants(
        &self,
        cache: &mut BlockCache,
        first: BlockHash,
        provenance: Provenance,
        gossip: &mut Vec<Block>,
    ) -> ConsensusResult<()> {
        let mut queue = vec![first];
        let mut first_result = Ok(());
        let mut is_first = true;
        while let Some(hash) = queue.pop() {
            match self.link_one(cache, &hash, provenance) {
                Ok(block) => {
                    if matches!(provenance, Provenance::Received { replay: false }) {
                        gossip.push(block);
                    }
                    let children: Vec<BlockHash> = cache
                        .find(&hash)
                        .map(|node| node.children().iter().copied().collect())
                        .unwrap_or_default();
                    for child in children {
                        let parked = cache
                            .find(&child)
                            .is_some_and(|node| node.kind() == NodeKind::Single);
                        if parked {
                            queue.push(child);
                        }
                    }
                }
                Err(e) => {
                    // Structural failures count as rejections; collaborator
                    // failures drop the block without blaming it.
                    if e.condemns_block() {
                        metrics::record_block_rejected(e.reason());
                        warn!("[consensus] evicting block {hash:?}: {e}");
                    } else {
                        warn!("[consensus] dropping block {hash:?}: {e}");
                    }
                    let _ = cache.del(&hash);
                    if is_first {
                        first_result = Err(e);
                    }
                }
            }
            is_first = false;
        }
        first_result
    }

    /// Verifies one attachable block and performs the linked-path
    /// bookkeeping in order: link, watermark, pending-witness refresh,
    /// slot occupancy, finality, and only then the pool notification.
    fn link_one(
        &self,
        cache: &mut BlockCache,
        hash: &BlockHash,
        provenance: Provenance,
    ) -> ConsensusResult<Block> {
        let node = cache
            .find(hash)
            .ok_or(CacheError::BlockNotFound(*hash))?;
        let block = node
            .block()
            .cloned()
            .ok_or(CacheError::BlockNotFound(*hash))?;
        let parent_hash = block.head.parent_hash;
        let parent = cache
            .find(&parent_hash)
            .ok_or(CacheError::ParentNotLinked(*hash))?;
        let parent_head = parent
            .block()
            .map(|b| b.head.clone())
            .ok_or(CacheError::ParentNotLinked(*hash))?;
        let parent_serial = parent.serial_num;
        let parent_active = parent.roster.active().to_vec();

        // Position within the witness's batch: consecutive same-witness
        // blocks in one slot count up from zero.
        let slot = self.schedule.slot_of(block.head.time);
        let serial = if parent_head.witness == block.head.witness
            && self.schedule.slot_of(parent_head.time) == slot
        {
            parent_serial + 1
        } else {
            0
        };
        if serial >= self.config.blocks_per_slot {
            return Err(ConsensusError::SerialOutOfRange {
                serial,
                limit: self.config.blocks_per_slot,
            });
        }
        let received = matches!(provenance, Provenance::Received { .. });
        if received && self.schedule.has_slot(slot, &block.head.witness, serial) {
            return Err(ConsensusError::SlotOccupied {
                slot,
                witness: block.head.witness,
                serial,
            });
        }

        // Reuse the committed state version when one exists; the producer
        // tags its own blocks at production time, so the self-feed skips
        // re-execution here.
        if !self.state_db.checkout(hash) {
            if !self.state_db.checkout(&parent_hash) {
                return Err(ConsensusError::StateCheckout(parent_hash));
            }
            let ctx = VerifyContext {
                parent: &parent_head,
                active: &parent_active,
                replay: matches!(provenance, Provenance::Received { replay: true }),
                now_ms: self.time_source.now_millis(),
            };
            self.tx_pool.lock();
            let verdict = verify_block(
                &block,
                &ctx,
                self.tx_pool.as_ref(),
                self.state_db.as_ref(),
                &self.config,
            );
            self.tx_pool.release();
            verdict?;
            self.state_db.commit(hash);
        }

        cache.link(hash)?;
        let confirm_until = self
            .schedule
            .advance_watermark(&block.head.witness, block.head.number);

        // Vote boundaries re-read the pending witness list from the state
        // this block just committed.
        let pending_refresh = if block.head.number % self.config.vote_interval == 0 {
            if self.state_db.checkout(hash) {
                match self.state_db.pending_witnesses() {
                    Ok(pending) => Some(pending),
                    Err(e) => {
                        warn!("[consensus] pending witness read failed at block {}: {e}", block.head.number);
                        None
                    }
                }
            } else {
                warn!(
                    "[consensus] no state version for block {} at a vote boundary",
                    block.head.number
                );
                None
            }
        } else {
            None
        };

        {
            let node = cache
                .node_mut(hash)
                .ok_or(CacheError::BlockNotFound(*hash))?;
            node.serial_num = serial;
            node.confirm_until = confirm_until;
            if let Some(pending) = pending_refresh {
                node.roster.set_pending(pending, block.head.number);
            }
        }
        self.schedule.occupy_slot(slot, &block.head.witness, serial);

        self.update_finality(cache, hash);

        // The pool learns about the block only after finality bookkeeping,
        // so its branch view never runs ahead of the tree.
        self.tx_pool.add_linked_node(&block);
        metrics::record_block_linked();
        metrics::set_head_height(cache.head().number());
        debug!(
            "[consensus] linked block {} (slot {slot}, serial {serial})",
            block.head.number
        );
        Ok(block)
    }

    /// Runs the finality scan from the freshly linked tip and, when a new
    /// block reaches quorum, flushes through it: persists the finalized
    /// blocks, promotes any witness list the confirmed height vouches
    /// for, and queues slot-occupancy cleanup. Persistence failures are
    /// logged rather than propagated; a restart re-syncs the gap.
    fn update_finality(&self, cache: &mut BlockCache, tip: &BlockHash) {
        let Some(tip_node) = cache.find(tip) else {
            return;
        };
        let members = tip_node.roster.active().len();
        let quorum = members * 2 / 3 + 1;
        let Some(confirmed) = cache.confirmed_ancestor(tip, quorum) else {
            return;
        };
        if confirmed == *cache.linked_root().hash() {
            return;
        }
        let confirmed_number = match cache.find(&confirmed) {
            Some(node) => node.number(),
            None => return,
        };

        let flushed = match cache.flush(&confirmed) {
            Ok(blocks) => blocks,
            Err(e) => {
                error!("[consensus] flush to confirmed block {confirmed:?} failed: {e}");
                return;
            }
        };
        for block in &flushed {
            if let Err(e) = self.chain_store.push(block) {
                error!("[consensus] chain store rejected block {}: {e}", block.head.number);
                return;
            }
            if let Err(e) = self.state_db.flush(&block.hash()) {
                error!("[consensus] state flush failed at block {}: {e}", block.head.number);
                return;
            }
        }

        self.promote_witnesses(cache, tip, confirmed_number);

        // Slots strictly below the new root's can never host a valid
        // block again, so their occupancy records can go.
        if let Some(root_time) = cache.linked_root().block().map(|b| b.head.time) {
            let task = CleanupTask {
                through_slot: self.schedule.slot_of(root_time).saturating_sub(1),
            };
            if self.cleanup_tx.try_send(task).is_err() {
                debug!("[consensus] cleanup queue full; slot pruning deferred");
            }
        }

        metrics::set_confirmed_height(confirmed_number);
        info!(
            "[consensus] finalized through block {confirmed_number} ({} blocks flushed)",
            flushed.len()
        );
    }

    /// Adopts the newest pending witness list whose vote height the
    /// confirmed block now covers: walk down from the tip past rosters
    /// still waiting on a later height. The adopted list also becomes
    /// the active snapshot along the walked branch, so blocks building
    /// on it are checked against the new rotation.
    fn promote_witnesses(&self, cache: &mut BlockCache, tip: &BlockHash, confirmed_number: u64) {
        let mut walked = Vec::new();
        let mut cursor = *tip;
        let adopted = loop {
            let Some(node) = cache.find(&cursor) else {
                return;
            };
            walked.push(cursor);
            if node.roster.pending_number() <= confirmed_number {
                break node.roster.pending().to_vec();
            }
            match node.parent_hash() {
                Some(parent) => cursor = *parent,
                None => return,
            }
        };
        if adopted.is_empty() {
            return;
        }
        self.schedule.update_witness_list(adopted.clone());
        for hash in walked {
            if let Some(node) = cache.node_mut(&hash) {
                node.roster.set_active(adopted.clone());
            }
        }
    }

    /// Production loop: sleep until this node's next slot, then fill the
    /// slot's batch positions at sub-slot cadence.
    async fn production_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("[consensus] production loop started");
        loop {
            let wait = self
                .schedule
                .time_until_next_slot(self.time_source.now_millis(), &self.witness_id);
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(Duration::from_millis(wait)) => {}
            }
            let now = self.time_source.now_millis();
            let slot = self.schedule.slot_of(now);
            if self.schedule.witness_of_slot(slot) != Some(self.witness_id) {
                continue;
            }
            if self.net.is_catching_up() {
                debug!("[consensus] skipping own slot {slot} while catching up");
            } else {
                self.produce_batch(slot, &mut shutdown).await;
            }
            // Sleep out the remainder of the slot so the wait computation
            // does not see our own slot again.
            let now = self.time_source.now_millis();
            let remain = self.schedule.slot_start_ms(slot + 1).saturating_sub(now);
            if remain > 0 {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(Duration::from_millis(remain)) => {}
                }
            }
        }
        debug!("[consensus] production loop stopped");
    }

    /// Produces the slot's blocks one batch position at a time, stopping
    /// early when the slot ends. A failed position is logged and skipped;
    /// the next position still runs.
    async fn produce_batch(&self, slot: u64, shutdown: &mut watch::Receiver<bool>) {
        let slot_start = self.schedule.slot_start_ms(slot);
        let cadence = self.config.sub_slot_ms();
        for serial in 0..self.config.blocks_per_slot {
            let target = slot_start + u64::from(serial) * cadence;
            let now = self.time_source.now_millis();
            if now < target {
                tokio::select! {
                    _ = shutdown.changed() => return,
                    _ = tokio::time::sleep(Duration::from_millis(target - now)) => {}
                }
            }
            if self.schedule.slot_of(self.time_source.now_millis()) != slot {
                debug!("[consensus] slot {slot} ended before serial {serial}");
                return;
            }
            match self.produce_block(slot, serial) {
                Ok(_) => {}
                Err(ConsensusError::SlotOccupied { .. }) => {
                    debug!("[consensus] serial {serial} of slot {slot} already produced");
                }
                Err(e) => warn!("[consensus] production failed at serial {serial}: {e}"),
            }
        }
    }

    /// Produces one block at the given batch position, feeds it back
    /// through the shared admission path, and broadcasts it.
    pub fn produce_block(&self, slot: u64, serial: u32) -> ConsensusResult<BlockHash> {
        if !self.schedule.occupy_slot(slot, &self.witness_id, serial) {
            return Err(ConsensusError::SlotOccupied {
                slot,
                witness: self.witness_id,
                serial,
            });
        }

        let (parent_head, parent_hash) = {
            let cache = self.cache.lock();
            let head = cache.head();
            let head_block = head
                .block()
                .ok_or(CacheError::BlockNotFound(*head.hash()))?;
            (head_block.head.clone(), *head.hash())
        };
        // Head time must strictly advance even if the clock stalls.
        let time = self
            .time_source
            .now_millis()
            .max(parent_head.time + 1);
        let window = Duration::from_millis(self.config.production_window_ms(serial));

        self.tx_pool.lock();
        let built = self.build_block(&parent_head, parent_hash, time, window);
        self.tx_pool.release();
        let block = built?;
        let hash = block.hash();
        let tx_count = block.txs.len();

        self.accept_block(block.clone(), Provenance::Produced)?;
        metrics::record_block_generated();

        let payload =
            bincode::serialize(&block).map_err(|e| ConsensusError::Encoding(e.to_string()))?;
        // Trailing positions race the slot boundary.
        let priority = if serial + self.config.trailing_light_blocks >= self.config.blocks_per_slot
        {
            Priority::Urgent
        } else {
            Priority::Normal
        };
        self.net.broadcast(payload, MessageKind::NewBlock, priority);
        info!(
            "[consensus] produced block {} (slot {slot}, serial {serial}, {tx_count} txs)",
            parent_head.number + 1
        );
        Ok(hash)
    }

    /// Assembles and seals a block on top of `parent`: pulls pending
    /// transactions, executes them against a forked state view within the
    /// window, keeps the successes, and commits the resulting state under
    /// the new block's hash.
    fn build_block(
        &self,
        parent_head: &BlockHead,
        parent_hash: BlockHash,
        time: u64,
        window: Duration,
    ) -> ConsensusResult<Block> {
        let state = self.state_db.fork();
        if !state.checkout(&parent_hash) {
            return Err(ConsensusError::StateCheckout(parent_hash));
        }
        let (candidates, _) = self.tx_pool.pending(self.config.max_txs_per_block);

        let head = BlockHead {
            version: BLOCK_VERSION,
            parent_hash,
            tx_merkle_root: [0u8; 32],
            receipt_merkle_root: [0u8; 32],
            number: parent_head.number + 1,
            witness: self.witness_id,
            time,
            signature: [0u8; 64],
        };
        let deadline = Instant::now() + window;
        let tx_limit = Duration::from_millis(self.config.tx_time_limit_ms);
        let mut txs = Vec::new();
        let mut receipts = Vec::new();
        let mut dropped: Vec<TxHash> = Vec::new();
        for tx in candidates {
            if Instant::now() >= deadline {
                break;
            }
            if tx.is_expired(time) {
                dropped.push(tx.hash());
                continue;
            }
            match state.execute_tx(&head, &tx, tx_limit) {
                Ok(receipt) if receipt.status == StatusCode::Success => {
                    txs.push(tx);
                    receipts.push(receipt);
                }
                Ok(receipt) => {
                    debug!(
                        "[consensus] tx {:?} excluded from block: {:?}",
                        receipt.tx_hash, receipt.status
                    );
                    dropped.push(receipt.tx_hash);
                }
                Err(e) => return Err(ConsensusError::State(e)),
            }
        }
        if !dropped.is_empty() {
            self.tx_pool.drop_txs(&dropped);
        }

        let mut block = Block {
            head,
            txs,
            receipts,
        };
        block.seal(&self.keypair);
        state.commit(&block.hash());
        Ok(block)
    }

    /// Block lookup across the speculative tree and the finalized store.
    pub fn block_by_hash(&self, hash: &BlockHash) -> Option<Block> {
        if let Some(block) = self.cache.lock().block_by_hash(hash).cloned() {
            return Some(block);
        }
        self.chain_store.block_by_hash(hash)
    }

    /// Block lookup by height along the preferred branch, falling back to
    /// the finalized store below the root.
    pub fn block_by_number(&self, number: u64) -> Option<Block> {
        if let Some(block) = self.cache.lock().block_by_number(number).cloned() {
            return Some(block);
        }
        self.chain_store.block_by_number(number)
    }
}

impl<T, S, C, N> ChainStatus for ConsensusEngine<T, S, C, N>
where
    T: TxPool + 'static,
    S: StateDb + 'static,
    C: ChainStore + 'static,
    N: NetService + 'static,
{
    fn chain_info(&self) -> ChainInfo {
        let cache = self.cache.lock();
        let head = cache.head();
        let root = cache.linked_root();
        ChainInfo {
            head_hash: *head.hash(),
            head_number: head.number(),
            confirmed_hash: *root.hash(),
            confirmed_number: root.number(),
        }
    }

    fn active_witnesses(&self) -> Vec<WitnessId> {
        self.schedule.active()
    }
}
