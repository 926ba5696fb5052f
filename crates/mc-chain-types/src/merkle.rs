//! # Merkle Roots
//!
//! Binary merkle tree over leaf digests. Levels with an odd node count
//! duplicate their last node. The head commits to its body through two of
//! these roots (transactions and receipts).

use crate::hashing::sha3_256_pair;

/// Root over the given leaves. An empty leaf set has the all-zero root; a
/// single leaf is its own root.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let right = pair.get(1).unwrap_or(&pair[0]);
            next.push(sha3_256_pair(&pair[0], right));
        }
        level = next;
    }
    level[0]
}
