//! Block verification pipeline.
//!
//! Checks run cheapest-first: structural head checks, then the
//! slot-witness claim, then per-transaction admission, and finally full
//! re-execution against the parent's state. The caller is responsible
//! for checking out the parent state version before calling
//! [`verify_block`] and for evicting the block when verification fails.

use std::time::{Duration, Instant};

use mc_chain_types::{merkle_root, Block, BlockHead, Hash, WitnessId};
use tracing::debug;

use crate::config::ConsensusConfig;
use crate::error::{ConsensusError, ConsensusResult};
use crate::ports::outbound::{StateDb, TxExistence, TxPool};

/// Everything verification needs besides the block itself.
pub struct VerifyContext<'a> {
    /// Head of the parent the block claims to extend.
    pub parent: &'a BlockHead,
    /// Witness rotation as of the parent, in slot order.
    pub active: &'a [WitnessId],
    /// Historical replay skips the slot-witness check; the rotation that
    /// signed old blocks is no longer known.
    pub replay: bool,
    /// Local clock reading in ms, for the future-time bound.
    pub now_ms: u64,
}

/// Checks that need nothing but the block: witness signature and the
/// receipt/transaction pairing. Run once on receipt, before the block is
/// admitted to the cache.
pub fn verify_basics(block: &Block) -> ConsensusResult<()> {
    block
        .verify_signature()
        .map_err(|_| ConsensusError::InvalidSignature)?;
    if block.txs.len() != block.receipts.len() {
        return Err(ConsensusError::ReceiptCountMismatch {
            txs: block.txs.len(),
            receipts: block.receipts.len(),
        });
    }
    Ok(())
}

/// Head checks against the parent: linkage, numbering, time bounds, and
/// the merkle commitments over the body the block itself carries.
pub fn verify_block_head(
    block: &Block,
    ctx: &VerifyContext<'_>,
    config: &ConsensusConfig,
) -> ConsensusResult<()> {
    let head = &block.head;
    let parent_hash = ctx.parent.hash();
    if head.parent_hash != parent_hash {
        return Err(ConsensusError::WrongParent {
            expected: parent_hash,
            actual: head.parent_hash,
        });
    }
    let expected = ctx.parent.number + 1;
    if head.number != expected {
        return Err(ConsensusError::InvalidNumber {
            expected,
            actual: head.number,
        });
    }
    if head.time <= ctx.parent.time {
        return Err(ConsensusError::StaleBlockTime {
            block: head.time,
            parent: ctx.parent.time,
        });
    }
    if head.time > ctx.now_ms + config.slot_duration_ms {
        return Err(ConsensusError::FutureBlockTime {
            block: head.time,
            now: ctx.now_ms,
        });
    }
    if head.tx_merkle_root != block.compute_tx_merkle_root() {
        return Err(ConsensusError::TxMerkleMismatch);
    }
    if head.receipt_merkle_root != block.compute_receipt_merkle_root() {
        return Err(ConsensusError::ReceiptMerkleMismatch);
    }
    Ok(())
}

/// Full verification: head checks, slot-witness claim, transaction
/// admission, and bounded re-execution whose receipts must reproduce the
/// head's receipt root.
///
/// `state` must already be checked out at the parent's version. The tx
/// pool must be locked across the call so `exist_txs` answers stay
/// coherent with execution.
pub fn verify_block<P, S>(
    block: &Block,
    ctx: &VerifyContext<'_>,
    pool: &P,
    state: &S,
    config: &ConsensusConfig,
) -> ConsensusResult<()>
where
    P: TxPool + ?Sized,
    S: StateDb + ?Sized,
{
    verify_block_head(block, ctx, config)?;

    if !ctx.replay {
        check_slot_witness(&block.head, ctx.active, config)?;
    }

    let parent_hash = ctx.parent.hash();
    let mut seen = std::collections::HashSet::with_capacity(block.txs.len());
    for tx in &block.txs {
        let tx_hash = tx.hash();
        if !seen.insert(tx_hash) {
            return Err(ConsensusError::DuplicateTxInBlock(tx_hash));
        }
        if tx.is_expired(block.head.time) {
            return Err(ConsensusError::ExpiredTx(tx_hash));
        }
        match pool.exist_txs(&tx_hash, &parent_hash) {
            TxExistence::OnChain => return Err(ConsensusError::TxOnChain(tx_hash)),
            TxExistence::Pending => {}
            TxExistence::NotFound => {
                tx.verify_self()
                    .map_err(|_| ConsensusError::InvalidTxSignature(tx_hash))?;
            }
        }
    }

    let executed = execute_body(block, state, config)?;
    if merkle_root(&executed) != block.head.receipt_merkle_root {
        return Err(ConsensusError::ReceiptMerkleMismatch);
    }
    Ok(())
}

/// The rotation as of the parent decides who owns the block's slot.
fn check_slot_witness(
    head: &BlockHead,
    active: &[WitnessId],
    config: &ConsensusConfig,
) -> ConsensusResult<()> {
    if active.is_empty() {
        return Ok(());
    }
    let slot = head.time / config.slot_duration_ms;
    let expected = active[(slot % active.len() as u64) as usize];
    if head.witness != expected {
        return Err(ConsensusError::WrongWitness {
            expected,
            actual: head.witness,
        });
    }
    Ok(())
}

/// Re-executes the body in order and returns the receipt leaf hashes.
/// The whole block shares one wall-clock budget on top of the per-tx
/// limit, so a block stuffed with slow transactions cannot stall the
/// verify loop.
fn execute_body<S>(block: &Block, state: &S, config: &ConsensusConfig) -> ConsensusResult<Vec<Hash>>
where
    S: StateDb + ?Sized,
{
    let deadline = Instant::now() + Duration::from_millis(config.verify_timeout_ms);
    let tx_limit = Duration::from_millis(config.tx_time_limit_ms);
    let mut leaves = Vec::with_capacity(block.txs.len());
    for tx in &block.txs {
        if Instant::now() >= deadline {
            debug!(
                "[consensus] verification of block {} ran out of budget after {} txs",
                block.head.number,
                leaves.len()
            );
            return Err(ConsensusError::VerifyTimeout {
                limit_ms: config.verify_timeout_ms,
            });
        }
        let receipt = state
            .execute_tx(&block.head, tx, tx_limit)
            .map_err(ConsensusError::State)?;
        leaves.push(receipt.hash());
    }
    Ok(leaves)
}
