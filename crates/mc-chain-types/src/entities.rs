//! # Core Chain Entities
//!
//! Blocks, transactions, and receipts as they move through the consensus
//! core.
//!
//! The bytes covered by a hash or signature are produced by
//! `signing_payload` methods (fixed-width big-endian concatenation), so a
//! head hash never depends on serializer internals. The `signature` field is
//! excluded from its own payload by construction.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::crypto::{CryptoError, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::hashing::sha3_256;
use crate::merkle::merkle_root;

// =============================================================================
// ALIASES
// =============================================================================

/// A 32-byte SHA3-256 digest.
pub type Hash = [u8; 32];

/// Hash identifying a block (its head hash).
pub type BlockHash = Hash;

/// Hash identifying a transaction.
pub type TxHash = Hash;

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A witness (block producer) identity is its Ed25519 public key.
pub type WitnessId = PublicKey;

// =============================================================================
// BLOCKS
// =============================================================================

/// Protocol version stamped into newly produced block heads.
pub const BLOCK_VERSION: u16 = 1;

/// The head of a block: every field the witness signature covers, plus the
/// signature itself.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHead {
    /// Protocol version for this block.
    pub version: u16,
    /// Hash of the parent block (creates the chain linkage).
    pub parent_hash: BlockHash,
    /// Merkle root over the transaction hashes.
    pub tx_merkle_root: Hash,
    /// Merkle root over the receipt hashes.
    pub receipt_merkle_root: Hash,
    /// Block height.
    pub number: u64,
    /// The witness that produced this block.
    pub witness: WitnessId,
    /// Production timestamp in milliseconds.
    pub time: u64,
    /// Witness signature over [`BlockHead::hash`].
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl BlockHead {
    /// The bytes the head hash covers: every field except the signature,
    /// fixed-width big-endian.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + 32 * 4 + 8 * 2);
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&self.parent_hash);
        buf.extend_from_slice(&self.tx_merkle_root);
        buf.extend_from_slice(&self.receipt_merkle_root);
        buf.extend_from_slice(&self.number.to_be_bytes());
        buf.extend_from_slice(&self.witness);
        buf.extend_from_slice(&self.time.to_be_bytes());
        buf
    }

    /// The block hash: SHA3-256 over the signing payload.
    pub fn hash(&self) -> BlockHash {
        sha3_256(&self.signing_payload())
    }
}

/// A block: signed head plus the transaction and receipt lists the head's
/// merkle roots commit to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The signed head.
    pub head: BlockHead,
    /// Ordered transactions.
    pub txs: Vec<Tx>,
    /// Execution receipts, one per transaction, same order.
    pub receipts: Vec<TxReceipt>,
}

impl Block {
    /// The block's identity: its head hash.
    pub fn hash(&self) -> BlockHash {
        self.head.hash()
    }

    /// Merkle root over the current transaction list.
    pub fn compute_tx_merkle_root(&self) -> Hash {
        let leaves: Vec<Hash> = self.txs.iter().map(Tx::hash).collect();
        merkle_root(&leaves)
    }

    /// Merkle root over the current receipt list.
    pub fn compute_receipt_merkle_root(&self) -> Hash {
        let leaves: Vec<Hash> = self.receipts.iter().map(TxReceipt::hash).collect();
        merkle_root(&leaves)
    }

    /// Commit the body into the head (both merkle roots) and sign the head
    /// hash. Producer-side; the head must not change afterwards.
    pub fn seal(&mut self, keypair: &Ed25519KeyPair) {
        self.head.tx_merkle_root = self.compute_tx_merkle_root();
        self.head.receipt_merkle_root = self.compute_receipt_merkle_root();
        self.head.signature = *keypair.sign(&self.head.hash()).as_bytes();
    }

    /// Check the witness signature against the head hash.
    pub fn verify_signature(&self) -> Result<(), CryptoError> {
        let key = Ed25519PublicKey::from_bytes(self.head.witness)?;
        let sig = Ed25519Signature::from_bytes(self.head.signature);
        key.verify(&self.head.hash(), &sig)
    }
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// A transaction as the consensus core sees it. The call payload is opaque
/// here; the execution layer behind the state port interprets it.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    /// Creation timestamp in milliseconds.
    pub time: u64,
    /// Expiration timestamp in milliseconds; zero never expires.
    pub expiration: u64,
    /// Price per gas unit in base units.
    pub gas_price: u64,
    /// Gas ceiling for execution.
    pub gas_limit: u64,
    /// The account that published and signed the transaction.
    pub publisher: PublicKey,
    /// Opaque call payload.
    pub payload: Vec<u8>,
    /// Publisher signature over [`Tx::hash`].
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Tx {
    /// The bytes the transaction hash covers: every field except the
    /// signature, fixed-width big-endian with a length-prefixed payload.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 * 4 + 32 + 8 + self.payload.len());
        buf.extend_from_slice(&self.time.to_be_bytes());
        buf.extend_from_slice(&self.expiration.to_be_bytes());
        buf.extend_from_slice(&self.gas_price.to_be_bytes());
        buf.extend_from_slice(&self.gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.publisher);
        buf.extend_from_slice(&(self.payload.len() as u64).to_be_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// The transaction hash: SHA3-256 over the signing payload.
    pub fn hash(&self) -> TxHash {
        sha3_256(&self.signing_payload())
    }

    /// Sign as publisher.
    pub fn sign(&mut self, keypair: &Ed25519KeyPair) {
        self.publisher = *keypair.public_key().as_bytes();
        self.signature = *keypair.sign(&self.hash()).as_bytes();
    }

    /// Publisher signature check. Run once per transaction the node has
    /// never seen before.
    pub fn verify_self(&self) -> Result<(), CryptoError> {
        let key = Ed25519PublicKey::from_bytes(self.publisher)?;
        let sig = Ed25519Signature::from_bytes(self.signature);
        key.verify(&self.hash(), &sig)
    }

    /// Whether the transaction has expired at `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expiration != 0 && now_ms >= self.expiration
    }
}

/// Terminal status of an executed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// Executed and applied.
    Success,
    /// Exceeded its execution time limit; excluded from the block.
    Timeout,
    /// Execution fault; excluded from the block.
    Failed,
}

/// Receipt of one executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// The transaction this receipt belongs to.
    pub tx_hash: TxHash,
    /// Terminal status.
    pub status: StatusCode,
    /// Gas actually consumed.
    pub gas_usage: u64,
    /// Human-readable detail for failures, empty on success.
    pub message: String,
}

impl TxReceipt {
    /// Receipt digest used as the merkle leaf.
    pub fn hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(32 + 1 + 8 + self.message.len());
        buf.extend_from_slice(&self.tx_hash);
        buf.push(self.status as u8);
        buf.extend_from_slice(&self.gas_usage.to_be_bytes());
        buf.extend_from_slice(self.message.as_bytes());
        sha3_256(&buf)
    }
}
