//! Structure-only finality: the watermark confirmation scan.
//!
//! Every block is a vote by its witness for all of its ancestors, but the
//! vote is live only where the witness did not fork against its own prior
//! work (`confirm_until <= number`). Walking from a tip toward the root,
//! the scan counts distinct witnesses with live votes and returns the first
//! node where the count reaches quorum. Votes decay on the way down: a
//! vote whose watermark is `cu` stops counting below height `cu`.

use std::collections::HashMap;

use mc_chain_types::{BlockHash, WitnessId};

use crate::cache::BlockCache;
use crate::node::NodeKind;

impl BlockCache {
    /// Deepest ancestor of `tip` confirmed by at least `quorum` distinct
    /// witnesses, or `None` when no ancestor above the root reaches it.
    ///
    /// The expiry buckets are keyed by walk depth relative to the root, so
    /// one pass over the branch suffices regardless of fork shape.
    pub fn confirmed_ancestor(&self, tip: &BlockHash, quorum: usize) -> Option<BlockHash> {
        let tip_node = self.node(tip)?;
        if tip_node.kind() != NodeKind::Linked {
            return None;
        }
        let root_number = self.linked_root().number();
        let root_hash = *self.linked_root().hash();
        let span = tip_node.number().saturating_sub(root_number) as usize;

        // expiry[d] holds witnesses whose vote dies below height root+d.
        let mut expiry: Vec<Vec<WitnessId>> = vec![Vec::new(); span + 1];
        let mut live: HashMap<WitnessId, usize> = HashMap::new();

        let mut cursor = *tip;
        while cursor != root_hash {
            let node = self.node(&cursor)?;

            if node.confirm_until <= node.number() {
                *live.entry(*node.witness()).or_insert(0) += 1;
                if let Some(idx) = node.confirm_until.checked_sub(root_number) {
                    if idx > 0 {
                        expiry[idx as usize].push(*node.witness());
                    }
                }
            }

            if live.len() >= quorum {
                return Some(cursor);
            }

            let depth = (node.number() - root_number) as usize;
            for witness in expiry[depth].drain(..) {
                if let Some(count) = live.get_mut(&witness) {
                    *count -= 1;
                    if *count == 0 {
                        live.remove(&witness);
                    }
                }
            }

            cursor = *node.parent_hash()?;
        }
        None
    }
}
