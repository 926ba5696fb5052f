//! # Block Cache
//!
//! Fork-aware tree of not-yet-final blocks.
//!
//! All competing branches grow from the last finalized block (the linked
//! root). Blocks may arrive in any order: a block whose parent is unknown
//! parks under a virtual placeholder until the parent shows up. Finality is
//! inferred from chain structure alone by the watermark scan in [`confirm`],
//! after which [`BlockCache::flush`] advances the root and hands the
//! newly-final blocks back for persistence.
//!
//! The cache is a pure data structure. It never touches storage, the
//! network, or a clock; the consensus engine owns those through its ports.

pub mod cache;
pub mod confirm;
pub mod error;
pub mod node;
pub mod roster;

pub use cache::{AddOutcome, BlockCache};
pub use error::{CacheError, CacheResult};
pub use node::{CacheNode, NodeKind};
pub use roster::WitnessRoster;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
