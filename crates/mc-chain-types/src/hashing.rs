//! # SHA3-256 Hashing
//!
//! Every chain digest (block heads, transactions, receipts, merkle nodes)
//! is SHA3-256.

use sha3::{Digest, Sha3_256};

/// Hash data with SHA3-256 (one-shot).
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Sha3_256::digest(data));
    output
}

/// Hash the concatenation of two digests. Interior merkle node.
pub fn sha3_256_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(left);
    hasher.update(right);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}
