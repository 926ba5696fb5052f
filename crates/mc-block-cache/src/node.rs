//! Cache node: one block (or a placeholder for a missing one) inside the
//! fork tree.

use std::collections::HashSet;

use mc_chain_types::{Block, BlockHash, WitnessId};

use crate::roster::WitnessRoster;

/// Lifecycle stage of a cache node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Verified against a linked parent; part of a live branch.
    Linked,
    /// Block is present but its branch is not verified up to the root yet.
    Single,
    /// Placeholder for a hash whose block has not arrived. Carries no
    /// block; exists so children can park under it.
    Virtual,
}

/// One node of the fork tree. Owned by the arena in
/// [`BlockCache`](crate::cache::BlockCache); linkage fields are hashes into
/// that arena, never references.
#[derive(Debug, Clone)]
pub struct CacheNode {
    pub(crate) hash: BlockHash,
    pub(crate) block: Option<Block>,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<BlockHash>,
    pub(crate) children: HashSet<BlockHash>,
    pub(crate) number: u64,
    pub(crate) witness: WitnessId,
    /// Position within the witness's consecutive batch for one slot.
    pub serial_num: u32,
    /// Watermark snapshot taken when the node linked. A vote is live while
    /// `confirm_until <= number`.
    pub confirm_until: u64,
    /// Roster view of this branch, copied from the parent at link time.
    pub roster: WitnessRoster,
}

impl CacheNode {
    pub(crate) fn virtual_placeholder(hash: BlockHash) -> Self {
        Self {
            hash,
            block: None,
            kind: NodeKind::Virtual,
            parent: None,
            children: HashSet::new(),
            number: 0,
            witness: [0u8; 32],
            serial_num: 0,
            confirm_until: 0,
            roster: WitnessRoster::default(),
        }
    }

    pub(crate) fn single(block: Block) -> Self {
        let hash = block.hash();
        let number = block.head.number;
        let witness = block.head.witness;
        Self {
            hash,
            block: Some(block),
            kind: NodeKind::Single,
            parent: None,
            children: HashSet::new(),
            number,
            witness,
            serial_num: 0,
            confirm_until: 0,
            roster: WitnessRoster::default(),
        }
    }

    /// Fill a virtual placeholder with its real block. Children are kept.
    pub(crate) fn fill(&mut self, block: Block) {
        debug_assert_eq!(self.kind, NodeKind::Virtual);
        self.number = block.head.number;
        self.witness = block.head.witness;
        self.block = Some(block);
        self.kind = NodeKind::Single;
    }

    /// The node's identity (equals its block hash once the block exists).
    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    /// The block, absent only for virtual placeholders.
    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent_hash(&self) -> Option<&BlockHash> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &HashSet<BlockHash> {
        &self.children
    }

    /// Block height; zero while virtual.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Producing witness; zeroed while virtual.
    pub fn witness(&self) -> &WitnessId {
        &self.witness
    }
}
