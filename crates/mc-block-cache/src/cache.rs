//! The fork tree: add, link, prune, flush, lookups.
//!
//! Nodes live in an arena keyed by block hash; parent and child links are
//! hashes into the same arena. Every operation that removes nodes walks an
//! explicit worklist, so deep forks never recurse.
//!
//! Arena invariant: `root` and `head` always name present nodes; `head` is
//! the best linked leaf (or the root when no descendant is linked yet)
//! under the order "greater number wins, equal numbers go to the smaller
//! hash".

use std::collections::{HashMap, HashSet};

use mc_chain_types::{Block, BlockHash};
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::node::{CacheNode, NodeKind};
use crate::roster::WitnessRoster;

/// Root advancements between stale-orphan sweeps.
const ORPHAN_SWEEP_INTERVAL: u64 = 10;

/// Result of [`BlockCache::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Fresh node whose parent is already linked; verify and link now.
    Attached(BlockHash),
    /// Fresh node parked behind a missing or not-yet-linked parent.
    Parked(BlockHash),
    /// The hash is already present with a real block.
    Duplicate(BlockHash),
}

impl AddOutcome {
    /// The hash of the node the outcome refers to.
    pub fn hash(&self) -> &BlockHash {
        match self {
            AddOutcome::Attached(h) | AddOutcome::Parked(h) | AddOutcome::Duplicate(h) => h,
        }
    }
}

/// Fork-aware tree of not-yet-final blocks.
pub struct BlockCache {
    nodes: HashMap<BlockHash, CacheNode>,
    /// Linked nodes without linked children.
    leaves: HashSet<BlockHash>,
    root: BlockHash,
    head: BlockHash,
}

impl BlockCache {
    /// Cache rooted at the last finalized block. `roster` is the witness
    /// view at that block.
    pub fn new(root_block: Block, roster: WitnessRoster) -> Self {
        let hash = root_block.hash();
        let mut node = CacheNode::single(root_block);
        node.kind = NodeKind::Linked;
        node.roster = roster;

        let mut nodes = HashMap::new();
        nodes.insert(hash, node);
        let mut leaves = HashSet::new();
        leaves.insert(hash);

        Self {
            nodes,
            leaves,
            root: hash,
            head: hash,
        }
    }

    /// Insert a block. Idempotent: a hash already backed by a real block
    /// reports [`AddOutcome::Duplicate`]. A block whose hash matches a
    /// virtual placeholder fills that placeholder in place, keeping the
    /// children that were waiting for it.
    pub fn add(&mut self, block: Block) -> AddOutcome {
        let hash = block.hash();
        let parent_hash = block.head.parent_hash;

        match self.nodes.get(&hash).map(CacheNode::kind) {
            Some(NodeKind::Virtual) => {
                if let Some(node) = self.nodes.get_mut(&hash) {
                    node.fill(block);
                }
                self.attach_parent(hash, parent_hash);
            }
            Some(_) => return AddOutcome::Duplicate(hash),
            None => {
                self.nodes.insert(hash, CacheNode::single(block));
                self.attach_parent(hash, parent_hash);
            }
        }

        if self.nodes.get(&parent_hash).map(CacheNode::kind) == Some(NodeKind::Linked) {
            AddOutcome::Attached(hash)
        } else {
            AddOutcome::Parked(hash)
        }
    }

    fn attach_parent(&mut self, child: BlockHash, parent_hash: BlockHash) {
        self.nodes
            .entry(parent_hash)
            .or_insert_with(|| CacheNode::virtual_placeholder(parent_hash))
            .children
            .insert(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent_hash);
        }
    }

    /// Promote a verified node to Linked. The parent must already be
    /// Linked; re-parenting never happens here.
    pub fn link(&mut self, hash: &BlockHash) -> CacheResult<()> {
        let (parent_hash, number) = {
            let node = self
                .nodes
                .get(hash)
                .ok_or(CacheError::BlockNotFound(*hash))?;
            match node.kind() {
                NodeKind::Virtual => return Err(CacheError::VirtualNode(*hash)),
                NodeKind::Linked => return Err(CacheError::AlreadyLinked(*hash)),
                NodeKind::Single => {}
            }
            let parent_hash = node.parent.ok_or(CacheError::ParentNotLinked(*hash))?;
            (parent_hash, node.number)
        };

        let roster = {
            let parent = self
                .nodes
                .get(&parent_hash)
                .ok_or(CacheError::ParentNotLinked(*hash))?;
            if parent.kind() != NodeKind::Linked {
                return Err(CacheError::ParentNotLinked(*hash));
            }
            parent.roster.inherit()
        };

        let head_number = self.nodes[&self.head].number;
        if let Some(node) = self.nodes.get_mut(hash) {
            node.kind = NodeKind::Linked;
            node.roster = roster;
        }
        self.leaves.remove(&parent_hash);
        self.leaves.insert(*hash);

        if Self::preferred(number, hash, head_number, &self.head) {
            self.head = *hash;
        }
        Ok(())
    }

    /// Deterministic branch order: greater number wins; equal numbers go to
    /// the lexicographically smaller hash. Arrival order never matters.
    fn preferred(
        a_number: u64,
        a_hash: &BlockHash,
        b_number: u64,
        b_hash: &BlockHash,
    ) -> bool {
        a_number > b_number || (a_number == b_number && a_hash < b_hash)
    }

    /// Remove a node and its whole subtree: losing forks, blocks that
    /// failed verification, stale orphans.
    pub fn del(&mut self, hash: &BlockHash) -> CacheResult<()> {
        if !self.nodes.contains_key(hash) {
            return Err(CacheError::BlockNotFound(*hash));
        }
        if *hash == self.root {
            return Err(CacheError::RootUntouchable(*hash));
        }

        let mut doomed = HashSet::new();
        let mut stack = vec![*hash];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.get(&h) {
                stack.extend(node.children.iter().copied());
            }
            doomed.insert(h);
        }

        let parent_hash = self.nodes.get(hash).and_then(|n| n.parent);
        if let Some(p) = parent_hash {
            if let Some(parent) = self.nodes.get_mut(&p) {
                parent.children.remove(hash);
            }
        }

        for h in &doomed {
            self.nodes.remove(h);
            self.leaves.remove(h);
        }

        // The parent may have become a leaf again, or an empty placeholder.
        if let Some(p) = parent_hash {
            match self.nodes.get(&p) {
                Some(parent) if parent.children.is_empty() => match parent.kind() {
                    NodeKind::Linked => {
                        self.leaves.insert(p);
                    }
                    NodeKind::Virtual => {
                        self.nodes.remove(&p);
                    }
                    NodeKind::Single => {}
                },
                _ => {}
            }
        }

        if doomed.contains(&self.head) {
            self.recompute_head();
        }
        debug!(removed = doomed.len(), "[block-cache] pruned subtree");
        Ok(())
    }

    fn recompute_head(&mut self) {
        let mut best = self.root;
        let mut best_number = self.nodes[&self.root].number;
        for leaf in &self.leaves {
            if let Some(node) = self.nodes.get(leaf) {
                if Self::preferred(node.number, leaf, best_number, &best) {
                    best = *leaf;
                    best_number = node.number;
                }
            }
        }
        self.head = best;
    }

    /// Make `target` the new root. Every block between the old root
    /// (exclusive) and `target` (inclusive) becomes final: competing
    /// subtrees are pruned and the now-final blocks are returned oldest
    /// first for persistence. Irreversible.
    pub fn flush(&mut self, target: &BlockHash) -> CacheResult<Vec<Block>> {
        {
            let node = self
                .nodes
                .get(target)
                .ok_or(CacheError::BlockNotFound(*target))?;
            if node.kind() != NodeKind::Linked {
                return Err(CacheError::NotDescendant(*target));
            }
        }

        let mut path = Vec::new();
        let mut cursor = *target;
        while cursor != self.root {
            path.push(cursor);
            cursor = match self.nodes.get(&cursor).and_then(|n| n.parent) {
                Some(p) => p,
                None => return Err(CacheError::NotDescendant(*target)),
            };
        }
        path.reverse();

        let mut flushed = Vec::with_capacity(path.len());
        for step in path {
            let others: Vec<BlockHash> = self.nodes[&self.root]
                .children
                .iter()
                .copied()
                .filter(|c| *c != step)
                .collect();
            for other in others {
                self.del(&other)?;
            }

            let old = self.root;
            self.leaves.remove(&old);
            self.nodes.remove(&old);
            if let Some(node) = self.nodes.get_mut(&step) {
                node.parent = None;
                if let Some(block) = node.block.clone() {
                    flushed.push(block);
                }
            }
            self.root = step;
        }

        let root_number = self.nodes[&self.root].number;
        if !flushed.is_empty() && root_number % ORPHAN_SWEEP_INTERVAL == 0 {
            self.prune_stale_orphans();
        }
        if !flushed.is_empty() {
            debug!(new_root = root_number, "[block-cache] advanced root");
        }
        Ok(flushed)
    }

    /// Drop parked subtrees that can never link anymore: children of
    /// virtual placeholders at or below the root height, and placeholders
    /// left childless.
    pub fn prune_stale_orphans(&mut self) {
        let root_number = self.nodes[&self.root].number;
        let virtuals: Vec<BlockHash> = self
            .nodes
            .values()
            .filter(|n| n.kind() == NodeKind::Virtual)
            .map(|n| n.hash)
            .collect();

        for v in virtuals {
            let children: Vec<BlockHash> = match self.nodes.get(&v) {
                Some(node) => node.children.iter().copied().collect(),
                None => continue,
            };
            for child in children {
                let stale = self
                    .nodes
                    .get(&child)
                    .is_some_and(|c| c.number <= root_number);
                if stale {
                    let _ = self.del(&child);
                }
            }
            if self.nodes.get(&v).is_some_and(|n| n.children.is_empty()) {
                self.nodes.remove(&v);
            }
        }
    }

    /// Look up a real (non-placeholder) node.
    pub fn find(&self, hash: &BlockHash) -> Option<&CacheNode> {
        self.nodes.get(hash).filter(|n| n.kind() != NodeKind::Virtual)
    }

    /// Mutable access to a real node's bookkeeping fields.
    pub fn node_mut(&mut self, hash: &BlockHash) -> Option<&mut CacheNode> {
        self.nodes
            .get_mut(hash)
            .filter(|n| n.kind() != NodeKind::Virtual)
    }

    /// Raw arena access, placeholders included.
    pub(crate) fn node(&self, hash: &BlockHash) -> Option<&CacheNode> {
        self.nodes.get(hash)
    }

    /// The best linked leaf.
    pub fn head(&self) -> &CacheNode {
        &self.nodes[&self.head]
    }

    /// The last finalized block's node.
    pub fn linked_root(&self) -> &CacheNode {
        &self.nodes[&self.root]
    }

    /// Block at `number` on the branch selected by the current head.
    pub fn block_by_number(&self, number: u64) -> Option<&Block> {
        let root_number = self.nodes[&self.root].number;
        if number < root_number || number > self.nodes[&self.head].number {
            return None;
        }
        let mut cursor = self.head;
        loop {
            let node = self.nodes.get(&cursor)?;
            if node.number == number {
                return node.block();
            }
            if cursor == self.root {
                return None;
            }
            cursor = node.parent?;
        }
    }

    /// Block by hash, any branch.
    pub fn block_by_hash(&self, hash: &BlockHash) -> Option<&Block> {
        self.find(hash).and_then(CacheNode::block)
    }

    /// Number of nodes held, placeholders included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Linked nodes without linked children.
    pub fn leaves(&self) -> &HashSet<BlockHash> {
        &self.leaves
    }
}
