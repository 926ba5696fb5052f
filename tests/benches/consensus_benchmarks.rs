//! # Consensus Benchmarks
//!
//! Hot paths on the block admission and production pipelines:
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | Sealing | merkle roots + Ed25519 sign | < 1ms per block |
//! | Fork cache | add + link a chain | < 1ms per block |
//! | Fork cache | confirmation scan, worst case | linear in depth |
//! | Admission | five-step verification, 64 txs | < 100ms |
//! | Engine | ingest an eight-block round | < 100ms |

use std::time::Duration;

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use mc_block_cache::{BlockCache, WitnessRoster};
use mc_chain_types::{merkle_root, Block, Ed25519KeyPair};
use mc_consensus::{verify_block, ChainStatus, ConsensusConfig, VerifyContext};
use mc_tests::support::{
    block_on, default_config, feed, fresh_node, genesis_block, signed_tx, witness_keys,
    witness_set, MemoryStateDb, MemoryTxPool,
};

/// Linear chain of empty blocks, one slot each, witness rotating over
/// the first `rotate` keys.
fn empty_chain(keys: &[Ed25519KeyPair], rotate: usize, count: usize) -> Vec<Block> {
    let mut parent = genesis_block(keys).head;
    let mut chain = Vec::with_capacity(count);
    for i in 0..count as u64 {
        let slot = i + 1;
        let key = &keys[(slot as usize) % rotate];
        let block = block_on(&parent, key, slot * 3_000 + 100, Vec::new());
        parent = block.head.clone();
        chain.push(block);
    }
    chain
}

// ============================================================================
// Sealing: merkle roots plus the witness signature
// ============================================================================

fn bench_block_sealing(c: &mut Criterion) {
    let mut group = c.benchmark_group("block-sealing");
    group.measurement_time(Duration::from_secs(5));

    let keys = witness_keys(5);
    let genesis = genesis_block(&keys);

    for tx_count in [0usize, 64, 256] {
        let txs: Vec<_> = (0..tx_count).map(|i| signed_tx(i as u8, 0)).collect();
        let template = block_on(&genesis.head, &keys[1], 3_100, txs);
        group.throughput(Throughput::Elements(tx_count.max(1) as u64));
        group.bench_with_input(
            BenchmarkId::new("seal", tx_count),
            &template,
            |b, template| {
                b.iter_batched(
                    || template.clone(),
                    |mut block| {
                        block.seal(&keys[1]);
                        black_box(block)
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    let sealed = block_on(&genesis.head, &keys[1], 3_100, Vec::new());
    group.bench_function("verify_signature", |b| {
        b.iter(|| black_box(sealed.verify_signature().is_ok()))
    });

    let leaves: Vec<[u8; 32]> = (0..1024u32).map(|i| [(i % 251) as u8; 32]).collect();
    group.throughput(Throughput::Elements(1024));
    group.bench_function("merkle_root_1024", |b| {
        b.iter(|| black_box(merkle_root(&leaves)))
    });

    group.finish();
}

// ============================================================================
// Fork cache: linking throughput and the confirmation scan
// ============================================================================

fn bench_fork_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("fork-cache");
    group.measurement_time(Duration::from_secs(5));

    let keys = witness_keys(5);
    let genesis = genesis_block(&keys);
    let roster = WitnessRoster::genesis(witness_set(&keys));

    let chain = empty_chain(&keys, 5, 100);
    group.throughput(Throughput::Elements(100));
    group.bench_function("add_and_link_100", |b| {
        b.iter_batched(
            || (BlockCache::new(genesis.clone(), roster.clone()), chain.clone()),
            |(mut cache, chain)| {
                for block in chain {
                    let hash = block.hash();
                    cache.add(block);
                    cache.link(&hash).unwrap();
                }
                black_box(cache.head().number())
            },
            BatchSize::SmallInput,
        )
    });

    // Three rotating witnesses can never meet a quorum of four, so the
    // scan walks the full depth before giving up.
    let deep = empty_chain(&keys, 3, 512);
    let mut scanned = BlockCache::new(genesis.clone(), roster.clone());
    for block in &deep {
        let hash = block.hash();
        scanned.add(block.clone());
        scanned.link(&hash).unwrap();
    }
    let tip = deep.last().map(|b| b.hash()).unwrap_or_default();
    group.bench_function("confirmation_scan_miss_512", |b| {
        b.iter(|| black_box(scanned.confirmed_ancestor(&tip, 4)))
    });

    group.finish();
}

// ============================================================================
// Admission: the five-step pipeline and a full engine round
// ============================================================================

fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission");
    group.measurement_time(Duration::from_secs(10));

    let keys = witness_keys(5);
    let genesis = genesis_block(&keys);
    let active = witness_set(&keys);
    let config = ConsensusConfig::default();

    // No pool entries, so every transaction takes the slow path through
    // publisher signature verification.
    let txs: Vec<_> = (0..64).map(|i| signed_tx(i as u8, 0)).collect();
    let block = block_on(&genesis.head, &keys[1], 3_100, txs);
    let pool = MemoryTxPool::default();
    let state = MemoryStateDb::default();
    let ctx = VerifyContext {
        parent: &genesis.head,
        active: &active,
        replay: false,
        now_ms: 3_200,
    };
    group.throughput(Throughput::Elements(64));
    group.bench_function("verify_block_64_txs", |b| {
        b.iter(|| black_box(verify_block(&block, &ctx, &pool, &state, &config)).unwrap())
    });

    let round = empty_chain(&keys, 5, 8);
    group.throughput(Throughput::Elements(8));
    group.bench_function("engine_ingest_8_block_round", |b| {
        b.iter_batched(
            || (fresh_node(&keys, 99, default_config(5)), round.clone()),
            |(node, chain)| {
                for block in chain {
                    feed(&node, block).unwrap();
                }
                black_box(node.engine.chain_info().confirmed_number)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_block_sealing,
    bench_fork_cache,
    bench_admission,
);

criterion_main!(benches);
