//! Prometheus metrics for the consensus engine.
//!
//! Compiled in behind the `metrics` feature; without it every recorder
//! is a no-op so call sites stay unconditional.

#[cfg(feature = "metrics")]
mod enabled {
    use lazy_static::lazy_static;
    use prometheus::{
        register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
        IntCounterVec, IntGauge,
    };

    lazy_static! {
        pub static ref BLOCKS_GENERATED: IntCounter = register_int_counter!(
            "consensus_blocks_generated_total",
            "Blocks produced by this node"
        )
        .expect("Failed to create consensus_blocks_generated_total metric");
        pub static ref BLOCKS_LINKED: IntCounter = register_int_counter!(
            "consensus_blocks_linked_total",
            "Blocks verified and linked into the speculative tree"
        )
        .expect("Failed to create consensus_blocks_linked_total metric");
        pub static ref BLOCKS_REJECTED: IntCounterVec = register_int_counter_vec!(
            "consensus_blocks_rejected_total",
            "Blocks rejected during verification, by reason",
            &["reason"]
        )
        .expect("Failed to create consensus_blocks_rejected_total metric");
        pub static ref HEAD_HEIGHT: IntGauge = register_int_gauge!(
            "consensus_head_height",
            "Height of the preferred speculative head"
        )
        .expect("Failed to create consensus_head_height metric");
        pub static ref CONFIRMED_HEIGHT: IntGauge = register_int_gauge!(
            "consensus_confirmed_height",
            "Height of the latest irreversible block"
        )
        .expect("Failed to create consensus_confirmed_height metric");
    }
}

#[cfg(feature = "metrics")]
pub fn record_block_generated() {
    enabled::BLOCKS_GENERATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_linked() {
    enabled::BLOCKS_LINKED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    enabled::BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_head_height(height: u64) {
    enabled::HEAD_HEIGHT.set(height as i64);
}

#[cfg(feature = "metrics")]
pub fn set_confirmed_height(height: u64) {
    enabled::CONFIRMED_HEIGHT.set(height as i64);
}

#[cfg(not(feature = "metrics"))]
pub fn record_block_generated() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_linked() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_head_height(_height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_confirmed_height(_height: u64) {}
